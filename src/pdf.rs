use crate::models::Deck;
use printpdf::*;
use std::io::BufWriter;

/// Text-only PDF export: a summary page plus one page per slide.
/// Illustrations are not embedded.
pub fn generate_pdf(deck: &Deck) -> Vec<u8> {
    let (doc, _page, layer) = PdfDocument::new(
        format!("Deck {}", deck.id),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    let summary = doc.get_page(_page).get_layer(layer);
    summary.use_text("AI Deck Studio Export", 20.0, Mm(15.0), Mm(275.0), &font);
    summary.use_text(
        format!("{} slides, theme {}, font {}", deck.slides.len(), deck.theme, deck.font),
        11.0,
        Mm(15.0),
        Mm(260.0),
        &font,
    );
    summary.use_text(
        deck.created_at.format("Generated %Y-%m-%d %H:%M UTC").to_string(),
        10.0,
        Mm(15.0),
        Mm(248.0),
        &font,
    );
    summary.use_text("(Illustrations not embedded in PDF export)", 8.0, Mm(15.0), Mm(236.0), &font);

    for slide in &deck.slides {
        let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), truncate(&slide.title, 48));
        let layer_ref = doc.get_page(page).get_layer(layer);
        layer_ref.use_text(truncate(&slide.title, 64), 16.0, Mm(15.0), Mm(275.0), &font);
        layer_ref.use_text(truncate(&slide.content, 180), 10.0, Mm(15.0), Mm(262.0), &font);
        let mut y = 246.0;
        for bullet in &slide.bullet_points {
            layer_ref.use_text(format!("- {}", truncate(bullet, 90)), 10.0, Mm(20.0), Mm(y), &font);
            y -= 8.0;
        }
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer).ok();
    }
    buf
}

// Char-based so multibyte content (e.g. Arabic decks) can't split a code point.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max).collect::<String>())
    }
}
