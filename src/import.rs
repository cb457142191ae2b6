use base64::Engine;

use crate::models::{ImportRequest, ImportResponse};

/// Turn an uploaded file into input text. Only UTF-8 text is really read;
/// binary or undecodable content becomes a filename placeholder so the input
/// field still has something to show.
pub fn text_from_upload(filename: &str, bytes: &[u8]) -> ImportResponse {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.trim().is_empty() => ImportResponse {
            text: text.to_string(),
            extracted: true,
        },
        _ => ImportResponse {
            text: format!("[file: {filename}]"),
            extracted: false,
        },
    }
}

pub fn import_file(request: &ImportRequest) -> ImportResponse {
    match base64::engine::general_purpose::STANDARD.decode(&request.data_base64) {
        Ok(bytes) => text_from_upload(&request.filename, &bytes),
        Err(_) => ImportResponse {
            text: format!("[file: {}]", request.filename),
            extracted: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use pretty_assertions::assert_eq;

    #[test]
    fn utf8_text_is_read_verbatim() {
        let result = text_from_upload("notes.txt", "line one\nline two".as_bytes());
        assert!(result.extracted);
        assert_eq!(result.text, "line one\nline two");
    }

    #[test]
    fn binary_content_becomes_a_placeholder() {
        let result = text_from_upload("deck.pptx", &[0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe]);
        assert!(!result.extracted);
        assert_eq!(result.text, "[file: deck.pptx]");
    }

    #[test]
    fn blank_text_is_treated_as_unreadable() {
        let result = text_from_upload("empty.txt", b"   \n ");
        assert!(!result.extracted);
    }

    #[test]
    fn base64_request_round_trips() {
        let request = ImportRequest {
            filename: "notes.txt".into(),
            data_base64: base64::engine::general_purpose::STANDARD.encode("hello import"),
        };
        let result = import_file(&request);
        assert!(result.extracted);
        assert_eq!(result.text, "hello import");
    }

    #[test]
    fn invalid_base64_becomes_a_placeholder() {
        let request = ImportRequest {
            filename: "junk.bin".into(),
            data_base64: "!!not-base64!!".into(),
        };
        let result = import_file(&request);
        assert!(!result.extracted);
        assert_eq!(result.text, "[file: junk.bin]");
    }
}
