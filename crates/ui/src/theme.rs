use folio_core::{Rgb, Theme};
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Palette {
    pub background: Rgb,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    pub(crate) fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Rgb(236, 232, 224),
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                error: Color::Red,
            },
            Theme::Dark => Self {
                background: Rgb(20, 20, 28),
                text: Color::White,
                muted: Color::Gray,
                accent: Color::Yellow,
                error: Color::LightRed,
            },
        }
    }
}

pub(crate) fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// Readable text colour on top of `background`.
pub(crate) fn contrast_text(background: Rgb) -> Color {
    if background.luminance() > 0.55 {
        Color::Black
    } else {
        Color::White
    }
}
