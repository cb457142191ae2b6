use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One structured content unit of a generated deck.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Slide {
    pub title: String,
    pub content: String,
    #[serde(rename = "bulletPoints", alias = "bullet_points", default)]
    pub bullet_points: Vec<String>,
    pub layout: String,
    #[serde(rename = "imagePrompt", alias = "image_prompt", default)]
    pub image_prompt: String,
}

/// Ordered set of slides produced by one generation call. Never updated in
/// place; each generation replaces the previous deck wholesale.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Deck {
    pub id: Uuid,
    pub slides: Vec<Slide>,
    pub theme: String,
    pub font: String,
    pub created_at: DateTime<Utc>,
}

/// Generation strictness. `Strict` summarizes only what the source text
/// contains; `Creative` may expand with examples and inferred detail.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Strict,
    Creative,
}

/// Rendering template tag. Parsed leniently: anything outside the recognized
/// set degrades to `Bullet` instead of failing the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Title,
    Bullet,
    Split,
    Quote,
    Focus,
    ImageCenter,
}

impl Layout {
    pub const RECOGNIZED: [&'static str; 6] =
        ["title", "bullet", "split", "quote", "focus", "image-center"];

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "title" => Layout::Title,
            "bullet" => Layout::Bullet,
            "split" => Layout::Split,
            "quote" => Layout::Quote,
            "focus" => Layout::Focus,
            "image-center" => Layout::ImageCenter,
            _ => Layout::Bullet,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Layout::Title => "title",
            Layout::Bullet => "bullet",
            Layout::Split => "split",
            Layout::Quote => "quote",
            Layout::Focus => "focus",
            Layout::ImageCenter => "image-center",
        }
    }
}

fn default_slide_count() -> u8 { 6 }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateDeckRequest {
    pub input_text: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_slide_count")]
    pub slide_count: u8,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub transcript_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportRequest {
    pub filename: String,
    pub data_base64: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ImportResponse {
    pub text: String,
    pub extracted: bool,
}
