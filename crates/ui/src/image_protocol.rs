//! Terminal graphics detection and a cache of encoded cover images.

use std::collections::HashMap;
use std::time::Duration;

use ratatui::layout::Rect;
use ratatui_image::Resize;
use ratatui_image::picker::{Picker, ProtocolType, cap_parser::QueryStdioOptions};
use ratatui_image::protocol::Protocol;

fn env_set(key: &str) -> bool {
    std::env::var(key).ok().is_some_and(|v| !v.trim().is_empty())
}

fn env_contains(key: &str, needle: &str) -> bool {
    std::env::var(key).ok().is_some_and(|v| v.contains(needle))
}

fn graphics_terminal_hint() -> bool {
    env_set("KITTY_WINDOW_ID")
        || std::env::var("TERM")
            .ok()
            .is_some_and(|term| term.trim().starts_with("xterm-kitty"))
        || env_set("ITERM_SESSION_ID")
        || env_contains("TERM_PROGRAM", "iTerm")
        || env_contains("TERM_PROGRAM", "WezTerm")
}

/// Whether probing the terminal over stdio is worth the startup delay.
pub(crate) fn should_query_stdio() -> bool {
    graphics_terminal_hint() || std::env::var_os("TMUX").is_some()
}

pub(crate) fn stdio_query_timeout() -> Duration {
    if graphics_terminal_hint() {
        Duration::from_millis(1500)
    } else if std::env::var_os("TMUX").is_some() {
        Duration::from_millis(300)
    } else {
        Duration::from_millis(0)
    }
}

/// Detects the best protocol, falling back to half blocks.
pub(crate) fn detect_picker() -> Picker {
    if !should_query_stdio() {
        return Picker::halfblocks();
    }
    let mut options = QueryStdioOptions::default();
    options.timeout = stdio_query_timeout();
    options.text_sizing_protocol = false;
    match Picker::from_query_stdio_with_options(options) {
        Ok(picker) => picker,
        Err(err) => {
            log::debug!("terminal graphics query failed: {err}");
            Picker::halfblocks()
        }
    }
}

pub(crate) fn protocol_label(picker: &Picker) -> &'static str {
    match picker.protocol_type() {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}

/// Encoded covers keyed by reference and target cell size.
#[derive(Default)]
pub(crate) struct CoverProtocols {
    entries: HashMap<(String, u16, u16), Option<Protocol>>,
}

impl CoverProtocols {
    pub(crate) fn get_or_encode(
        &mut self,
        picker: &Picker,
        reference: &str,
        image: &image::RgbaImage,
        area: Rect,
    ) -> Option<&Protocol> {
        let key = (reference.to_string(), area.width, area.height);
        self.entries
            .entry(key)
            .or_insert_with(|| {
                let size = Rect::new(0, 0, area.width, area.height);
                let dynamic = image::DynamicImage::ImageRgba8(image.clone());
                match picker.new_protocol(dynamic, size, Resize::Fit(None)) {
                    Ok(protocol) => Some(protocol),
                    Err(err) => {
                        log::warn!("encoding cover {reference} failed: {err}");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
