use axum::{Json, extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}};
use std::{collections::HashMap, sync::Arc};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use uuid::Uuid;
use chrono::Utc;

use crate::{
    chat::{self, Transcript},
    images,
    import::import_file,
    llm::TextGenerator,
    models::{ChatMessage, ChatReply, ChatRequest, Deck, GenerateDeckRequest, ImportRequest,
             ImportResponse, Layout},
    pdf::generate_pdf,
    prompt,
    render,
    validate::{generate_outcome, slides_or_error},
};

/// Admits at most one outstanding call per widget. `try_begin` hands out an
/// RAII permit; while one is alive, further submissions are refused.
#[derive(Clone, Default)]
pub struct InflightGuard {
    busy: Arc<Mutex<bool>>,
}

impl InflightGuard {
    pub fn try_begin(&self) -> Option<InflightPermit> {
        let mut busy = self.busy.lock();
        if *busy {
            None
        } else {
            *busy = true;
            Some(InflightPermit { guard: self.clone() })
        }
    }
}

pub struct InflightPermit {
    guard: InflightGuard,
}

impl Drop for InflightPermit {
    fn drop(&mut self) {
        *self.guard.busy.lock() = false;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<HashMap<Uuid, Deck>>>,
    /// Deck currently shown as "the" result, owned by the generation panel.
    pub current: Arc<RwLock<Option<Uuid>>>,
    /// Identity of the most recently dispatched generation request.
    pub latest_request: Arc<Mutex<Option<Uuid>>>,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub transcript: Arc<RwLock<Transcript>>,
    pub deck_guard: InflightGuard,
    pub chat_guard: InflightGuard,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            store: Arc::default(),
            current: Arc::default(),
            latest_request: Arc::default(),
            generator,
            transcript: Arc::new(RwLock::new(Transcript::default())),
            deck_guard: InflightGuard::default(),
            chat_guard: InflightGuard::default(),
            http: reqwest::Client::new(),
        }
    }
}

/// Commit a finished generation as the current deck only if its request is
/// still the latest one dispatched. A stale in-flight response therefore
/// can't overwrite a newer request's result.
fn commit_current(state: &AppState, request_id: Uuid, deck_id: Uuid) -> bool {
    let latest = state.latest_request.lock();
    if *latest == Some(request_id) {
        *state.current.write() = Some(deck_id);
        true
    } else {
        false
    }
}

pub async fn generate_deck(
    State(state): State<AppState>,
    Json(body): Json<GenerateDeckRequest>,
) -> Result<Json<Deck>, StatusCode> {
    if body.input_text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let _permit = state.deck_guard.try_begin().ok_or(StatusCode::CONFLICT)?;

    let request_id = Uuid::new_v4();
    *state.latest_request.lock() = Some(request_id);

    let theme = render::theme_named(body.theme.as_deref().unwrap_or_default()).name;
    let font = render::font_named(body.font.as_deref().unwrap_or_default()).name;

    tracing::info!(
        "🚀 Generating deck: {} slides, mode {:?}, {} input chars",
        body.slide_count,
        body.mode,
        body.input_text.len()
    );

    let (system, user) = prompt::build_prompts(&body.input_text, body.mode, body.slide_count);
    let outcome = generate_outcome(state.generator.as_deref(), &system, &user).await;
    let slides = slides_or_error(outcome);

    tracing::info!("✅ Deck ready with {} slides", slides.len());

    let deck = Deck {
        id: Uuid::new_v4(),
        slides,
        theme: theme.to_string(),
        font: font.to_string(),
        created_at: Utc::now(),
    };
    state.store.write().insert(deck.id, deck.clone());
    commit_current(&state, request_id, deck.id);
    Ok(Json(deck))
}

pub async fn get_deck(Path(id): Path<Uuid>, State(state): State<AppState>) -> Response {
    if let Some(deck) = state.store.read().get(&id).cloned() {
        Json(deck).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub async fn get_current_deck(State(state): State<AppState>) -> Response {
    let current = *state.current.read();
    match current.and_then(|id| state.store.read().get(&id).cloned()) {
        Some(deck) => Json(deck).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SvgQuery {
    #[serde(default)]
    pub inline: bool,
}

pub async fn deck_svg(
    Path(id): Path<Uuid>,
    Query(query): Query<SvgQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let deck = state.store.read().get(&id).cloned().ok_or(StatusCode::NOT_FOUND)?;

    let mut overrides = HashMap::new();
    if query.inline {
        for (i, slide) in deck.slides.iter().enumerate() {
            let wants_image = Layout::from_tag(&slide.layout) == Layout::ImageCenter
                && !slide.image_prompt.is_empty();
            if wants_image {
                if let Some(data_uri) = images::fetch_illustration(&state.http, &slide.image_prompt).await {
                    overrides.insert(i, data_uri);
                }
            }
        }
    }

    Ok(Json(render::render_deck_with_images(&deck, &overrides)))
}

pub async fn export_pdf(Path(id): Path<Uuid>, State(state): State<AppState>) -> Response {
    let store = state.store.read();
    if let Some(deck) = store.get(&id) {
        let pdf_bytes = generate_pdf(deck);
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(axum::http::header::CONTENT_TYPE, "application/pdf".parse().unwrap());
        headers.insert(
            axum::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"deck_{}.pdf\"", id).parse().unwrap(),
        );
        return (StatusCode::OK, headers, pdf_bytes).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

pub async fn send_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, StatusCode> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let _permit = state.chat_guard.try_begin().ok_or(StatusCode::CONFLICT)?;

    state.transcript.write().push_user(&message);
    let reply = chat::reply(state.generator.as_deref(), &message).await;
    let transcript_len = {
        let mut transcript = state.transcript.write();
        transcript.push_assistant(&reply);
        transcript.len()
    };
    Ok(Json(ChatReply { reply, transcript_len }))
}

pub async fn get_chat(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.transcript.read().messages().to_vec())
}

pub async fn import_upload(Json(body): Json<ImportRequest>) -> Json<ImportResponse> {
    Json(import_file(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;
    use pretty_assertions::assert_eq;

    fn request(text: &str) -> GenerateDeckRequest {
        GenerateDeckRequest {
            input_text: text.into(),
            mode: Mode::Strict,
            slide_count: 4,
            theme: None,
            font: None,
        }
    }

    #[test]
    fn guard_admits_one_call_at_a_time() {
        let guard = InflightGuard::default();
        let permit = guard.try_begin().unwrap();
        assert!(guard.try_begin().is_none());
        drop(permit);
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn stale_generation_cannot_overwrite_a_newer_one() {
        let state = AppState::new(None);
        let (older, newer) = (Uuid::new_v4(), Uuid::new_v4());
        let (deck_a, deck_b) = (Uuid::new_v4(), Uuid::new_v4());

        *state.latest_request.lock() = Some(older);
        *state.latest_request.lock() = Some(newer);

        assert!(!commit_current(&state, older, deck_a));
        assert_eq!(*state.current.read(), None);
        assert!(commit_current(&state, newer, deck_b));
        assert_eq!(*state.current.read(), Some(deck_b));
    }

    #[tokio::test]
    async fn generation_without_credential_yields_an_error_deck() {
        let state = AppState::new(None);
        let Json(deck) = generate_deck(State(state.clone()), Json(request("some text")))
            .await
            .unwrap();
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.slides[0].layout, "title");
        assert_eq!(deck.theme, "midnight");
        // The error deck is still stored and committed as current.
        assert_eq!(*state.current.read(), Some(deck.id));
        assert!(state.store.read().contains_key(&deck.id));
    }

    #[tokio::test]
    async fn concurrent_generation_is_refused() {
        let state = AppState::new(None);
        let _permit = state.deck_guard.try_begin().unwrap();
        let result = generate_deck(State(state.clone()), Json(request("some text"))).await;
        assert_eq!(result.err(), Some(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let state = AppState::new(None);
        let result = generate_deck(State(state), Json(request("   "))).await;
        assert_eq!(result.err(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn chat_turn_appends_to_the_transcript() {
        let state = AppState::new(None);
        let Json(reply) = send_chat(
            State(state.clone()),
            Json(ChatRequest { message: "which themes exist?".into() }),
        )
        .await
        .unwrap();
        assert_eq!(reply.reply, chat::OFFLINE_REPLY);
        assert_eq!(reply.transcript_len, 3);
        let messages = state.transcript.read().messages().to_vec();
        assert_eq!(messages[1].content, "which themes exist?");
        assert_eq!(messages[2].content, chat::OFFLINE_REPLY);
    }

    #[tokio::test]
    async fn concurrent_chat_is_refused_independently_of_generation() {
        let state = AppState::new(None);
        let _chat_permit = state.chat_guard.try_begin().unwrap();
        let result = send_chat(
            State(state.clone()),
            Json(ChatRequest { message: "hello".into() }),
        )
        .await;
        assert_eq!(result.err(), Some(StatusCode::CONFLICT));
        // The generation panel keeps its own guard.
        assert!(state.deck_guard.try_begin().is_some());
    }
}
