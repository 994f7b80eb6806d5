//! Book detail modal: metadata sidebar (or collapsing header) and notes.

use std::sync::Arc;

use folio_application::{ModalLayout, ModalPhase, ModalSession, mobile_header};
use folio_core::{BookRecord, CategoryRecord, Language, TextKey};
use folio_engine::CoverImage;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui_image::Image as ImageWidget;
use ratatui_image::picker::Picker;

use crate::image_protocol::CoverProtocols;
use crate::markdown::{markdown_to_lines, wrapped_height};
use crate::theme::{Palette, contrast_text, rgb};

const SIDEBAR_WIDTH: u16 = 34;
const SIDEBAR_COVER_HEIGHT: u16 = 14;
const MOBILE_HEADER_HEIGHT: u16 = 9;

/// Scroll limits of the notes pane as last drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NotesMetrics {
    pub max_scroll: u16,
    pub page: u16,
}

/// Catalog tags followed by tags extracted from the notes, without repeats.
pub(crate) fn merged_tags(book: &BookRecord, extracted: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in book.tags.iter().chain(extracted) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.clone());
        }
    }
    tags
}

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FPS: f32 = 12.0;

pub(crate) fn spinner_frame(time: f32) -> &'static str {
    let index = (time.max(0.0) * SPINNER_FPS) as usize;
    SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
}

pub(crate) fn notes_lines(
    session: &ModalSession,
    palette: &Palette,
    language: Language,
    time: f32,
) -> Vec<Line<'static>> {
    match session.phase() {
        ModalPhase::Closed => Vec::new(),
        ModalPhase::Loading => vec![Line::from(vec![
            Span::styled(
                format!("{} ", spinner_frame(time)),
                Style::default().fg(palette.accent),
            ),
            Span::styled(
                language.text(TextKey::Loading),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            ),
        ])],
        ModalPhase::Failed => vec![Line::styled(
            session.content().display_text.clone(),
            Style::default().fg(palette.error),
        )],
        ModalPhase::Loaded => markdown_to_lines(&session.content().display_text, palette),
    }
}

pub(crate) struct ModalView<'a> {
    pub book: &'a BookRecord,
    pub category: Option<&'a CategoryRecord>,
    pub session: &'a ModalSession,
    pub cover: Option<Arc<CoverImage>>,
    pub picker: &'a Picker,
    pub palette: &'a Palette,
    pub language: Language,
    pub time: f32,
}

impl ModalView<'_> {
    pub(crate) fn draw(
        &self,
        area: Rect,
        frame: &mut ratatui::Frame,
        protocols: &mut CoverProtocols,
    ) -> NotesMetrics {
        let layout = ModalLayout::for_width(area.width);
        let popup = match layout {
            ModalLayout::Desktop => crate::centered_rect(90, 90, area),
            ModalLayout::Mobile => area,
        };
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(rgb(self.book.accent_color)))
            .title(Span::styled(
                format!(" {} ", self.book.title),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        frame.render_widget(
            Paragraph::new(Line::styled(
                self.language.text(TextKey::CloseHint),
                Style::default().fg(self.palette.muted),
            )),
            rows[1],
        );

        match layout {
            ModalLayout::Desktop => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
                    .split(rows[0]);
                self.draw_sidebar(cols[0], frame, protocols);
                self.draw_notes(cols[1], frame)
            }
            ModalLayout::Mobile => {
                let header = mobile_header(self.session.scroll(), MOBILE_HEADER_HEIGHT);
                let height = header.height.min(rows[0].height);
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(height), Constraint::Min(1)])
                    .split(rows[0]);
                self.draw_header(parts[0], frame, header.opacity);
                self.draw_notes(parts[1], frame)
            }
        }
    }

    fn meta_lines(&self) -> Vec<Line<'static>> {
        let label = Style::default().fg(self.palette.muted);
        let accent = self
            .category
            .map(|c| c.accent_color)
            .unwrap_or(self.book.accent_color);
        let mut lines = vec![
            Line::styled(
                self.book.title.clone(),
                Style::default().fg(self.palette.text).add_modifier(Modifier::BOLD),
            ),
            Line::from(vec![
                Span::styled(format!("{}: ", self.language.text(TextKey::Category)), label),
                Span::styled(self.book.category.clone(), Style::default().fg(rgb(accent))),
            ]),
        ];

        let tags = merged_tags(self.book, &self.session.content().extracted_tags);
        if !tags.is_empty() {
            let mut spans = vec![Span::styled(
                format!("{}: ", self.language.text(TextKey::Tags)),
                label,
            )];
            for tag in tags {
                spans.push(Span::styled(
                    format!(" {tag} "),
                    Style::default()
                        .bg(rgb(self.book.accent_color))
                        .fg(contrast_text(self.book.accent_color)),
                ));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
        let description = self
            .book
            .description
            .clone()
            .unwrap_or_else(|| self.language.text(TextKey::NoDescription).to_string());
        lines.push(Line::styled(description, Style::default().fg(self.palette.text)));
        lines
    }

    fn draw_sidebar(&self, area: Rect, frame: &mut ratatui::Frame, protocols: &mut CoverProtocols) {
        let cover_height = SIDEBAR_COVER_HEIGHT.min(area.height / 2);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(cover_height), Constraint::Min(1)])
            .split(area);
        self.draw_cover(parts[0], frame, protocols);
        frame.render_widget(
            Paragraph::new(self.meta_lines())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::RIGHT).border_style(
                    Style::default().fg(self.palette.muted),
                )),
            parts[1],
        );
    }

    fn draw_header(&self, area: Rect, frame: &mut ratatui::Frame, opacity: f32) {
        let mut lines = self.meta_lines();
        if opacity < 0.5 {
            lines.truncate(1);
            for line in &mut lines {
                line.style = Style::default().fg(self.palette.muted);
                for span in &mut line.spans {
                    span.style = span.style.fg(self.palette.muted);
                }
            }
        }
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::BOTTOM).border_style(
                    Style::default().fg(self.palette.muted),
                )),
            area,
        );
    }

    fn draw_cover(&self, area: Rect, frame: &mut ratatui::Frame, protocols: &mut CoverProtocols) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let protocol = self.cover.as_ref().and_then(|cover| {
            protocols.get_or_encode(self.picker, &self.book.cover_image_ref, &cover.image, area)
        });
        match protocol {
            Some(protocol) => {
                let size = protocol.area();
                let w = size.width.min(area.width);
                let h = size.height.min(area.height);
                let centred = Rect::new(area.x + area.width.saturating_sub(w) / 2, area.y, w, h);
                frame.render_widget(ImageWidget::new(protocol), centred);
            }
            None => {
                frame.render_widget(
                    Paragraph::new(self.book.title.clone())
                        .wrap(Wrap { trim: true })
                        .style(
                            Style::default()
                                .bg(rgb(self.book.accent_color))
                                .fg(contrast_text(self.book.accent_color)),
                        ),
                    area,
                );
            }
        }
    }

    fn draw_notes(&self, area: Rect, frame: &mut ratatui::Frame) -> NotesMetrics {
        let inner = Rect {
            x: area.x.saturating_add(1),
            width: area.width.saturating_sub(2),
            ..area
        };
        let lines = notes_lines(self.session, self.palette, self.language, self.time);
        let total = wrapped_height(&lines, inner.width);
        let metrics = NotesMetrics {
            max_scroll: total.saturating_sub(inner.height),
            page: inner.height.saturating_sub(1).max(1),
        };
        let scroll = self.session.scroll().min(metrics.max_scroll);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            inner,
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_application::SelectionStore;
    use folio_core::{BookId, Catalog, FetchError, Theme};

    fn open_session(book: &BookRecord) -> (ModalSession, folio_application::LoadTicket) {
        let store = SelectionStore::new();
        store.open_book_modal(book.clone());
        let mut session = ModalSession::new(Language::English);
        let ticket = session.sync(&store.snapshot()).unwrap();
        (session, ticket)
    }

    fn text(lines: &[Line<'_>]) -> String {
        lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn tags_merge_without_case_duplicates() {
        let catalog = Catalog::builtin().unwrap();
        let mut book = catalog.books()[0].clone();
        book.tags = vec!["Rust".into(), "async".into()];
        let merged = merged_tags(&book, &["rust".into(), "tokio".into()]);
        assert_eq!(merged, vec!["Rust", "async", "tokio"]);
    }

    #[test]
    fn notes_follow_the_session_phase() {
        let palette = Palette::for_theme(Theme::Dark);
        let catalog = Catalog::builtin().unwrap();
        let book = catalog.book(&BookId::new(catalog.books()[0].id.as_str())).unwrap();

        let (mut session, ticket) = open_session(book);
        let loading = notes_lines(&session, &palette, Language::English, 0.0);
        assert_eq!(
            text(&loading),
            format!("⠋ {}", Language::English.text(TextKey::Loading))
        );

        session.resolve(&ticket, Ok("# Title\n\nSome *notes* here".into()));
        assert_eq!(text(&notes_lines(&session, &palette, Language::English, 0.0)), "Some notes here");

        let (mut failed, ticket) = open_session(book);
        failed.resolve(&ticket, Err(FetchError::NotFound(book.content_ref.clone())));
        let lines = notes_lines(&failed, &palette, Language::English, 0.0);
        assert_eq!(text(&lines), Language::English.notes_load_failed());
        assert_eq!(lines[0].style.fg, Some(palette.error));
    }

    #[test]
    fn spinner_advances_with_time_and_wraps() {
        assert_eq!(spinner_frame(0.0), "⠋");
        assert_eq!(spinner_frame(1.5 / SPINNER_FPS), "⠙");
        assert_ne!(spinner_frame(0.0), spinner_frame(0.25));
        assert_eq!(spinner_frame(10.5 / SPINNER_FPS), "⠋");
        assert_eq!(spinner_frame(-1.0), "⠋");
    }
}
