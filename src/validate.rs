use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{GenerateError, TextGenerator};
use crate::models::Slide;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("response is not valid JSON: {0}")]
    Json(String),
    #[error("response shape is not a slide deck")]
    Shape,
    #[error("no usable slide entries in response")]
    Empty,
}

/// Outcome of one generation call. Callers pattern-match on the variant
/// instead of inspecting ad hoc shapes; every error variant carries the
/// diagnostic that ends up on the synthetic error slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckOutcome {
    Deck(Vec<Slide>),
    ConfigError(String),
    TransportError(String),
    SchemaError(String),
}

/// Parse and shape-check raw model output as a slide list.
///
/// Accepted top-level shapes, in order: an object with a `slides` list, or a
/// bare list (legacy shape). Entries missing a required field are dropped and
/// the rest of the deck kept; relative order is preserved. Only a response
/// with no surviving entries at all is an error.
pub fn validate_deck(raw: &str) -> Result<Vec<Slide>, ValidateError> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| ValidateError::Json(e.to_string()))?;

    let entries = match &parsed {
        Value::Object(map) => match map.get("slides") {
            Some(Value::Array(list)) => list,
            _ => return Err(ValidateError::Shape),
        },
        Value::Array(list) => list,
        _ => return Err(ValidateError::Shape),
    };

    let total = entries.len();
    let slides: Vec<Slide> = entries.iter().filter_map(slide_from_entry).collect();
    if slides.len() < total {
        warn!("dropped {} malformed slide entries of {}", total - slides.len(), total);
    }
    if slides.is_empty() {
        return Err(ValidateError::Empty);
    }
    Ok(slides)
}

/// One candidate entry. `title`, `content`, `bulletPoints`, and `layout` are
/// required; `imagePrompt` defaults to empty. Both camelCase and snake_case
/// spellings are accepted for the two-word fields.
fn slide_from_entry(entry: &Value) -> Option<Slide> {
    let obj = entry.as_object()?;
    let title = obj.get("title")?.as_str()?;
    let content = obj.get("content")?.as_str()?;
    let bullets = obj
        .get("bulletPoints")
        .or_else(|| obj.get("bullet_points"))?
        .as_array()?;
    let layout = obj.get("layout")?.as_str()?;
    let image_prompt = obj
        .get("imagePrompt")
        .or_else(|| obj.get("image_prompt"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(Slide {
        title: title.to_string(),
        content: content.to_string(),
        bullet_points: bullets
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        layout: layout.to_string(),
        image_prompt: image_prompt.to_string(),
    })
}

/// Run one generation call end to end: client call, then validation.
pub async fn generate_outcome(
    generator: Option<&dyn TextGenerator>,
    system: &str,
    user: &str,
) -> DeckOutcome {
    let Some(generator) = generator else {
        return DeckOutcome::ConfigError(
            "no generation credential configured; set GROQ_API_KEY or GEMINI_API_KEY".into(),
        );
    };
    let raw = match generator.generate(system, user).await {
        Ok(raw) => raw,
        Err(GenerateError::Config) => return DeckOutcome::ConfigError(GenerateError::Config.to_string()),
        Err(GenerateError::Transport(msg)) => return DeckOutcome::TransportError(msg),
        Err(GenerateError::Schema(msg)) => return DeckOutcome::SchemaError(msg),
    };
    match validate_deck(&raw) {
        Ok(slides) => {
            info!("validated deck with {} slides", slides.len());
            DeckOutcome::Deck(slides)
        }
        Err(e) => DeckOutcome::SchemaError(e.to_string()),
    }
}

/// Collapse an outcome into something the renderer can always draw: the
/// validated slides, or a single error slide carrying the diagnostic.
pub fn slides_or_error(outcome: DeckOutcome) -> Vec<Slide> {
    match outcome {
        DeckOutcome::Deck(slides) => slides,
        DeckOutcome::ConfigError(msg) => vec![error_slide("Configuration error", &msg)],
        DeckOutcome::TransportError(msg) => vec![error_slide("Generation failed", &msg)],
        DeckOutcome::SchemaError(msg) => vec![error_slide("Unexpected response", &msg)],
    }
}

fn error_slide(title: &str, diagnostic: &str) -> Slide {
    Slide {
        title: title.to_string(),
        content: diagnostic.to_string(),
        bullet_points: Vec::new(),
        layout: "title".to_string(),
        image_prompt: String::new(),
    }
}
