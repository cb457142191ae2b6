use crate::models::{Layout, Mode};

/// Dominant script of the source text, used to pin the output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Arabic,
}

/// Majority vote over script-bearing characters. Latin wins ties and empty
/// input so English prompts keep working unchanged.
pub fn dominant_script(text: &str) -> Script {
    let mut arabic = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        match c {
            '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{08A0}'..='\u{08FF}' => {
                arabic += 1
            }
            'a'..='z' | 'A'..='Z' => latin += 1,
            _ => {}
        }
    }
    if arabic > latin { Script::Arabic } else { Script::Latin }
}

/// System instruction: output schema, language rule, mode semantics, layout
/// variety. Pure function of mode and detected script.
pub fn system_instruction(mode: Mode, script: Script) -> String {
    let mode_rule = match mode {
        Mode::Strict => {
            "Summarize only information that is present in the source text. \
             Do not invent facts, statistics, or examples that the source does not contain."
        }
        Mode::Creative => {
            "You may expand on the source text: add illustrative examples, \
             analogies, and reasonable inferred detail that fits the topic."
        }
    };
    let language_rule = match script {
        Script::Arabic => {
            "The source text is written in Arabic script. Write every text field \
             (titles, content, bullet points) entirely in Arabic."
        }
        Script::Latin => {
            "Write every text field (titles, content, bullet points) in the same \
             language as the source text."
        }
    };
    format!(
        "You are a presentation author. Respond with a single JSON object with exactly one key \
         \"slides\", holding an array of slide objects. Each slide object has these fields: \
         \"title\" (short string), \"content\" (body text, at most about 30 words or two sentences), \
         \"bulletPoints\" (array of 2-5 short strings), \
         \"layout\" (one of {layouts}), and \
         \"imagePrompt\" (optional: a visual scene description for an illustration; describe a scene, \
         never ask for words or labels to be drawn inside the image). \
         Vary the layout field across slides instead of repeating one layout throughout. \
         {language_rule} {mode_rule} \
         Return only the JSON object, with no surrounding prose or code fences.",
        layouts = Layout::RECOGNIZED
            .iter()
            .map(|l| format!("\"{l}\""))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// User instruction embedding the source text and the requested slide count.
pub fn user_instruction(input_text: &str, slide_count: u8) -> String {
    format!(
        "Create a slide deck of exactly {slide_count} slides from the following source text:\n\n{input_text}"
    )
}

/// Convenience wrapper producing the (system, user) pair for one request.
pub fn build_prompts(input_text: &str, mode: Mode, slide_count: u8) -> (String, String) {
    let script = dominant_script(input_text);
    (
        system_instruction(mode, script),
        user_instruction(input_text, slide_count),
    )
}
