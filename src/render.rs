use std::collections::HashMap;

use crate::images;
use crate::models::{Deck, Layout, Slide};

pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

/// Presentational color tokens applied uniformly across a rendered deck.
#[derive(Debug, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme { name: "midnight", background: "#0f172a", surface: "#1e293b", text: "#f8fafc", muted: "#94a3b8", accent: "#38bdf8" },
    Theme { name: "daylight", background: "#ffffff", surface: "#f1f5f9", text: "#0f172a", muted: "#475569", accent: "#2563eb" },
    Theme { name: "sunset", background: "#1c1917", surface: "#292524", text: "#fafaf9", muted: "#a8a29e", accent: "#fb923c" },
    Theme { name: "forest", background: "#052e16", surface: "#14532d", text: "#f0fdf4", muted: "#86efac", accent: "#4ade80" },
    Theme { name: "orchid", background: "#2e1065", surface: "#4c1d95", text: "#faf5ff", muted: "#c4b5fd", accent: "#e879f9" },
];

#[derive(Debug, PartialEq, Eq)]
pub struct Font {
    pub name: &'static str,
    pub family: &'static str,
}

pub const FONTS: &[Font] = &[
    Font { name: "sans", family: "Inter, Segoe UI, Helvetica, sans-serif" },
    Font { name: "serif", family: "Georgia, Times New Roman, serif" },
    Font { name: "mono", family: "JetBrains Mono, Courier New, monospace" },
];

/// Lookup by name; unknown names fall back to the first entry so a deck
/// always renders under some theme.
pub fn theme_named(name: &str) -> &'static Theme {
    THEMES.iter().find(|t| t.name == name).unwrap_or(&THEMES[0])
}

pub fn font_named(name: &str) -> &'static Font {
    FONTS.iter().find(|f| f.name == name).unwrap_or(&FONTS[0])
}

/// Render every slide of a deck to a standalone SVG document on a 16:9
/// canvas, remote illustration references left as URLs.
pub fn render_deck(deck: &Deck) -> Vec<String> {
    render_deck_with_images(deck, &HashMap::new())
}

/// Same, with per-slide illustration overrides (index → data URI) so callers
/// can inline fetched image bytes. The deck itself is never mutated.
pub fn render_deck_with_images(deck: &Deck, overrides: &HashMap<usize, String>) -> Vec<String> {
    let theme = theme_named(&deck.theme);
    let font = font_named(&deck.font);
    deck.slides
        .iter()
        .enumerate()
        .map(|(i, slide)| render_slide(slide, theme, font, overrides.get(&i).map(String::as_str)))
        .collect()
}

/// One slide under one theme/font. Unknown layout tags degrade to the
/// bullet template.
pub fn render_slide(
    slide: &Slide,
    theme: &Theme,
    font: &Font,
    image_override: Option<&str>,
) -> String {
    let layout = Layout::from_tag(&slide.layout);
    let body = match layout {
        Layout::Title => title_body(slide, theme, font),
        Layout::Bullet => bullet_body(slide, theme, font),
        Layout::Split => split_body(slide, theme, font),
        Layout::Quote => quote_body(slide, theme, font),
        Layout::Focus => focus_body(slide, theme, font),
        Layout::ImageCenter => image_center_body(slide, theme, font, image_override),
    };
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\" data-layout=\"{tag}\">\
         <rect width=\"{w}\" height=\"{h}\" fill=\"{bg}\"/>{body}</svg>",
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT,
        tag = layout.as_tag(),
        bg = theme.background,
    )
}

fn title_body(slide: &Slide, theme: &Theme, font: &Font) -> String {
    let title_lines = wrap(&slide.title, 28, 2);
    let mut body = text_lines(&title_lines, 640, 300, 76, 60, "middle", theme.text, font, true);
    body.push_str(&format!(
        "<rect x=\"580\" y=\"{y}\" width=\"120\" height=\"6\" fill=\"{accent}\"/>",
        y = 290 + title_lines.len() as u32 * 76,
        accent = theme.accent,
    ));
    body.push_str(&text_lines(&wrap(&slide.content, 58, 3), 640, 470, 40, 28, "middle", theme.muted, font, false));
    body
}

fn bullet_body(slide: &Slide, theme: &Theme, font: &Font) -> String {
    let mut body = text_lines(&wrap(&slide.title, 42, 1), 80, 120, 54, 44, "start", theme.text, font, true);
    body.push_str(&format!(
        "<rect x=\"80\" y=\"145\" width=\"160\" height=\"5\" fill=\"{}\"/>",
        theme.accent
    ));
    body.push_str(&text_lines(&wrap(&slide.content, 88, 2), 80, 196, 34, 24, "start", theme.muted, font, false));
    body.push_str(&bullet_list(&slide.bullet_points, 92, 290, 64, 28, theme, font));
    body
}

fn split_body(slide: &Slide, theme: &Theme, font: &Font) -> String {
    let mut body = text_lines(&wrap(&slide.title, 22, 2), 80, 150, 56, 40, "start", theme.text, font, true);
    body.push_str(&text_lines(&wrap(&slide.content, 40, 6), 80, 290, 38, 26, "start", theme.muted, font, false));
    body.push_str(&format!(
        "<rect x=\"620\" y=\"110\" width=\"3\" height=\"500\" fill=\"{}\"/>",
        theme.surface
    ));
    body.push_str(&bullet_list(&slide.bullet_points, 680, 180, 72, 28, theme, font));
    body
}

fn quote_body(slide: &Slide, theme: &Theme, font: &Font) -> String {
    let quote_lines = wrap(&slide.content, 44, 4);
    let mut body = format!(
        "<text x=\"140\" y=\"230\" font-family=\"{family}\" font-size=\"160\" fill=\"{accent}\">\u{201c}</text>",
        family = font.family,
        accent = theme.accent,
    );
    body.push_str(&text_lines(&quote_lines, 640, 300, 54, 36, "middle", theme.text, font, false));
    body.push_str(&format!(
        "<text x=\"640\" y=\"{y}\" text-anchor=\"middle\" font-family=\"{family}\" \
         font-size=\"26\" fill=\"{muted}\">\u{2014} {attribution}</text>",
        y = 300 + quote_lines.len() as u32 * 54 + 50,
        family = font.family,
        muted = theme.muted,
        attribution = esc(&slide.title),
    ));
    body
}

fn focus_body(slide: &Slide, theme: &Theme, font: &Font) -> String {
    let mut body = text_lines(&wrap(&slide.title, 24, 2), 640, 210, 88, 72, "middle", theme.accent, font, true);
    body.push_str(&text_lines(&wrap(&slide.content, 62, 2), 640, 400, 38, 28, "middle", theme.muted, font, false));
    // Bullet chips, row-wrapped across the lower half.
    let mut x = 140u32;
    let mut y = 500u32;
    for chip in &slide.bullet_points {
        let label: String = chip.chars().take(32).collect();
        let width = 48 + 15 * label.chars().count() as u32;
        if x + width > 1140 && x > 140 {
            x = 140;
            y += 76;
        }
        body.push_str(&format!(
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"52\" rx=\"26\" fill=\"{accent}\"/>\
             <text x=\"{cx}\" y=\"{cy}\" text-anchor=\"middle\" font-family=\"{family}\" \
             font-size=\"24\" fill=\"{bg}\">{label}</text>",
            cx = x + width / 2,
            cy = y + 34,
            accent = theme.accent,
            bg = theme.background,
            family = font.family,
            label = esc(&label),
        ));
        x += width + 24;
    }
    body
}

fn image_center_body(
    slide: &Slide,
    theme: &Theme,
    font: &Font,
    image_override: Option<&str>,
) -> String {
    let mut body = text_lines(&wrap(&slide.title, 42, 1), 640, 110, 54, 44, "middle", theme.text, font, true);
    body.push_str(&format!(
        "<rect x=\"320\" y=\"170\" width=\"640\" height=\"360\" rx=\"12\" fill=\"{}\"/>",
        theme.surface
    ));
    let href = match image_override {
        Some(uri) => Some(uri.to_string()),
        None if !slide.image_prompt.is_empty() => Some(images::illustration_url(&slide.image_prompt)),
        None => None,
    };
    if let Some(href) = href {
        body.push_str(&format!(
            "<image x=\"320\" y=\"170\" width=\"640\" height=\"360\" href=\"{}\" \
             preserveAspectRatio=\"xMidYMid slice\"/>",
            esc(&href)
        ));
    }
    body.push_str(&text_lines(&wrap(&slide.content, 66, 2), 640, 590, 36, 26, "middle", theme.muted, font, false));
    body
}

fn bullet_list(
    bullets: &[String],
    x: u32,
    start_y: u32,
    line_height: u32,
    size: u32,
    theme: &Theme,
    font: &Font,
) -> String {
    let mut out = String::new();
    for (i, bullet) in bullets.iter().enumerate() {
        let y = start_y + i as u32 * line_height;
        let line: String = wrap(bullet, 42, 1).pop().unwrap_or_default();
        out.push_str(&format!(
            "<circle cx=\"{x}\" cy=\"{cy}\" r=\"7\" fill=\"{accent}\"/>\
             <text x=\"{tx}\" y=\"{ty}\" font-family=\"{family}\" font-size=\"{size}\" \
             fill=\"{fill}\">{line}</text>",
            cy = y - 8,
            tx = x + 28,
            ty = y,
            accent = theme.accent,
            family = font.family,
            fill = theme.text,
            line = esc(&line),
        ));
    }
    out
}

fn text_lines(
    lines: &[String],
    x: u32,
    start_y: u32,
    line_height: u32,
    size: u32,
    anchor: &str,
    fill: &str,
    font: &Font,
    bold: bool,
) -> String {
    let weight = if bold { " font-weight=\"bold\"" } else { "" };
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"{anchor}\" font-family=\"{family}\" \
             font-size=\"{size}\" fill=\"{fill}\"{weight}>{line}</text>",
            y = start_y + i as u32 * line_height,
            family = font.family,
            line = esc(line),
        ));
    }
    out
}

/// Greedy word wrap capped at `max_lines`; the last kept line gets an
/// ellipsis when text was cut.
fn wrap(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('\u{2026}');
        }
    }
    lines
}

fn esc(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn slide(layout: &str) -> Slide {
        Slide {
            title: "Ownership".into(),
            content: "Every value has a single owner.".into(),
            bullet_points: vec!["moves".into(), "borrows".into(), "lifetimes".into()],
            layout: layout.into(),
            image_prompt: String::new(),
        }
    }

    fn deck(slides: Vec<Slide>, theme: &str, font: &str) -> Deck {
        Deck {
            id: Uuid::new_v4(),
            slides,
            theme: theme.into(),
            font: font.into(),
            created_at: Utc::now(),
        }
    }

    fn layout_tag(svg: &str) -> &str {
        let start = svg.find("data-layout=\"").unwrap() + "data-layout=\"".len();
        &svg[start..start + svg[start..].find('"').unwrap()]
    }

    #[test]
    fn view_count_matches_deck_length_for_every_theme_and_font() {
        let slides: Vec<Slide> = Layout::RECOGNIZED.iter().map(|l| slide(l)).collect();
        for theme in THEMES {
            for font in FONTS {
                let d = deck(slides.clone(), theme.name, font.name);
                let views = render_deck(&d);
                assert_eq!(views.len(), d.slides.len());
                for (view, s) in views.iter().zip(&d.slides) {
                    assert_eq!(layout_tag(view), s.layout);
                }
            }
        }
    }

    #[test]
    fn unrecognized_layout_renders_with_bullet_template() {
        let d = deck(vec![slide("mystery-grid")], "midnight", "sans");
        let views = render_deck(&d);
        assert_eq!(layout_tag(&views[0]), "bullet");
    }

    #[test]
    fn rendering_is_idempotent() {
        let slides: Vec<Slide> = Layout::RECOGNIZED.iter().map(|l| slide(l)).collect();
        let d = deck(slides, "forest", "serif");
        assert_eq!(render_deck(&d), render_deck(&d));
    }

    #[test]
    fn themes_differ_only_in_style_tokens() {
        let d1 = deck(vec![slide("split")], "midnight", "sans");
        let mut d2 = d1.clone();
        d2.theme = "daylight".into();
        let (v1, v2) = (render_deck(&d1).remove(0), render_deck(&d2).remove(0));
        assert_ne!(v1, v2);
        let strip = |svg: &str, theme: &Theme| {
            [theme.background, theme.surface, theme.text, theme.muted, theme.accent]
                .iter()
                .fold(svg.to_string(), |acc, token| acc.replace(token, "%"))
        };
        assert_eq!(strip(&v1, theme_named("midnight")), strip(&v2, theme_named("daylight")));
    }

    #[test]
    fn text_is_xml_escaped() {
        let mut s = slide("title");
        s.title = "<script> & \"done\"".into();
        let d = deck(vec![s], "midnight", "sans");
        let view = render_deck(&d).remove(0);
        assert!(!view.contains("<script>"));
        assert!(view.contains("&lt;script&gt;"));
        assert!(view.contains("&amp;"));
    }

    #[test]
    fn image_center_references_the_illustration_endpoint() {
        let mut s = slide("image-center");
        s.image_prompt = "a harbor at dusk".into();
        let d = deck(vec![s], "midnight", "sans");
        let view = render_deck(&d).remove(0);
        assert!(view.contains("image.pollinations.ai"));
        assert!(view.contains("<image "));
    }

    #[test]
    fn image_override_is_inlined_instead_of_the_url() {
        let mut s = slide("image-center");
        s.image_prompt = "a harbor at dusk".into();
        let d = deck(vec![s], "midnight", "sans");
        let overrides = HashMap::from([(0usize, "data:image/png;base64,AAAA".to_string())]);
        let view = render_deck_with_images(&d, &overrides).remove(0);
        assert!(view.contains("data:image/png;base64,AAAA"));
        assert!(!view.contains("image.pollinations.ai"));
    }

    #[test]
    fn image_center_without_prompt_renders_text_only() {
        let d = deck(vec![slide("image-center")], "midnight", "sans");
        let view = render_deck(&d).remove(0);
        assert!(!view.contains("<image "));
        assert!(view.contains("Ownership"));
    }

    #[test]
    fn quote_template_carries_attribution() {
        let d = deck(vec![slide("quote")], "midnight", "sans");
        let view = render_deck(&d).remove(0);
        assert!(view.contains("\u{2014} Ownership"));
    }

    #[test]
    fn unknown_theme_and_font_fall_back_to_defaults() {
        assert_eq!(theme_named("neon-vapor").name, THEMES[0].name);
        assert_eq!(font_named("wingdings").name, FONTS[0].name);
    }

    #[test]
    fn wrap_caps_lines_and_marks_truncation() {
        let lines = wrap("one two three four five six seven eight", 9, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with('\u{2026}'));
        assert_eq!(wrap("", 10, 2), Vec::<String>::new());
    }
}
