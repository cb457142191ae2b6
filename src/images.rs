use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use reqwest::{Client, Url};
use tracing::warn;

pub const ILLUSTRATION_WIDTH: u32 = 640;
pub const ILLUSTRATION_HEIGHT: u32 = 360;

const IMAGE_ENDPOINT: &str = "https://image.pollinations.ai";

/// Seed for the image endpoint, derived from the prompt text (FNV-1a) so
/// repeated renders of the same slide fetch the same illustration.
pub fn illustration_seed(prompt: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in prompt.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

/// Unauthenticated GET URL for a decorative illustration of `prompt`.
pub fn illustration_url(prompt: &str) -> String {
    let mut url = Url::parse(IMAGE_ENDPOINT).unwrap();
    url.path_segments_mut()
        .unwrap()
        .push("prompt")
        .push(prompt);
    url.query_pairs_mut()
        .append_pair("width", &ILLUSTRATION_WIDTH.to_string())
        .append_pair("height", &ILLUSTRATION_HEIGHT.to_string())
        .append_pair("seed", &illustration_seed(prompt).to_string())
        .append_pair("nologo", "true");
    url.to_string()
}

/// Fetch an illustration and inline it as a base64 data URI. Decorative only:
/// any failure (network, status, unrecognized bytes) returns `None` and the
/// slide renders without it.
pub async fn fetch_illustration(client: &Client, prompt: &str) -> Option<String> {
    let url = illustration_url(prompt);
    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("illustration fetch failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        warn!("illustration fetch returned status {}", response.status());
        return None;
    }
    let bytes: Bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!("illustration body read failed: {e}");
            return None;
        }
    };
    let mime = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => {
            warn!("illustration bytes are not a supported raster format");
            return None;
        }
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Some(format!("data:{mime};base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn seed_is_stable_across_calls() {
        let prompt = "a lighthouse at dawn";
        assert_eq!(illustration_seed(prompt), illustration_seed(prompt));
        assert_ne!(illustration_seed(prompt), illustration_seed("a different scene"));
    }

    #[test]
    fn url_is_deterministic_and_carries_seed() {
        let first = illustration_url("mountain lake, watercolor");
        let second = illustration_url("mountain lake, watercolor");
        assert_eq!(first, second);
        let seed = illustration_seed("mountain lake, watercolor");
        assert!(first.contains(&format!("seed={seed}")));
        assert!(first.contains("width=640"));
        assert!(first.contains("height=360"));
        assert!(first.contains("nologo=true"));
    }

    #[test]
    fn prompt_text_is_url_encoded() {
        let url = illustration_url("red / blue?");
        assert!(!url.contains("red / blue?"));
        assert!(url.starts_with("https://image.pollinations.ai/prompt/"));
    }
}
