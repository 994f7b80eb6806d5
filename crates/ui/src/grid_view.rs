//! Category-grouped tile grid.

use folio_application::CategoryGroup;
use folio_core::{BookId, Language, TextKey};
use folio_engine::CoverLoader;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui_image::Image as ImageWidget;
use ratatui_image::picker::Picker;

use crate::image_protocol::CoverProtocols;
use crate::theme::{Palette, contrast_text, rgb};

pub(crate) const TILE_WIDTH: u16 = 20;
pub(crate) const TILE_HEIGHT: u16 = 12;
const HEADER_HEIGHT: u16 = 1;
const GROUP_GAP: u16 = 1;

/// A tile or header positioned in content coordinates (before scrolling).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    Header { group: usize, y: u16 },
    Tile { group: usize, index: usize, id: BookId, x: u16, y: u16 },
}

pub(crate) fn placements(groups: &[CategoryGroup<'_>], width: u16) -> (Vec<Placement>, u16) {
    let per_row = (width / TILE_WIDTH).max(1);
    let mut out = Vec::new();
    let mut y = 0u16;
    for (g, group) in groups.iter().enumerate() {
        out.push(Placement::Header { group: g, y });
        y = y.saturating_add(HEADER_HEIGHT);
        for (i, book) in group.books.iter().enumerate() {
            let i16 = u16::try_from(i).unwrap_or(u16::MAX);
            out.push(Placement::Tile {
                group: g,
                index: i,
                id: book.id.clone(),
                x: (i16 % per_row) * TILE_WIDTH,
                y: y.saturating_add((i16 / per_row) * TILE_HEIGHT),
            });
        }
        let rows = u16::try_from(group.books.len())
            .unwrap_or(u16::MAX)
            .div_ceil(per_row)
            .max(1);
        let body = if group.books.is_empty() { 1 } else { rows * TILE_HEIGHT };
        y = y.saturating_add(body).saturating_add(GROUP_GAP);
    }
    (out, y)
}

/// Smallest scroll change that keeps `[top, top + height)` inside the viewport.
pub(crate) fn scroll_to_show(scroll: u16, viewport: u16, top: u16, height: u16) -> u16 {
    if top < scroll {
        top
    } else if top.saturating_add(height) > scroll.saturating_add(viewport) {
        top.saturating_add(height).saturating_sub(viewport).min(top)
    } else {
        scroll
    }
}

#[derive(Default)]
pub(crate) struct GridState {
    pub scroll: u16,
    pub hits: Vec<(Rect, BookId)>,
    followed: Option<BookId>,
}

impl GridState {
    /// Scrolls the hovered tile into view, once per change of hover.
    pub(crate) fn follow(&mut self, hovered: Option<&BookId>, placed: &[Placement], viewport: u16) {
        if self.followed.as_ref() == hovered {
            return;
        }
        self.followed = hovered.cloned();
        let Some(hovered) = hovered else {
            return;
        };
        if let Some(y) = placed.iter().find_map(|p| match p {
            Placement::Tile { id, y, .. } if id == hovered => Some(*y),
            _ => None,
        }) {
            self.scroll = scroll_to_show(self.scroll, viewport, y, TILE_HEIGHT);
        }
    }

    pub(crate) fn hit(&self, column: u16, row: u16) -> Option<&BookId> {
        self.hits
            .iter()
            .find(|(rect, _)| {
                column >= rect.x
                    && column < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
            .map(|(_, id)| id)
    }
}

pub(crate) struct GridView<'a> {
    pub groups: &'a [CategoryGroup<'a>],
    pub hovered: Option<&'a BookId>,
    pub covers: &'a CoverLoader,
    pub picker: &'a Picker,
    pub palette: &'a Palette,
    pub language: Language,
}

impl GridView<'_> {
    pub(crate) fn draw(
        &self,
        area: Rect,
        frame: &mut ratatui::Frame,
        state: &mut GridState,
        protocols: &mut CoverProtocols,
    ) {
        state.hits.clear();
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (placed, total) = placements(self.groups, area.width);

        state.follow(self.hovered, &placed, area.height);
        state.scroll = state.scroll.min(total.saturating_sub(area.height));

        for placement in &placed {
            let (x, y, h) = match placement {
                Placement::Header { y, .. } => (0, *y, HEADER_HEIGHT),
                Placement::Tile { x, y, .. } => (*x, *y, TILE_HEIGHT),
            };
            if y < state.scroll || y + h > state.scroll + area.height {
                continue;
            }
            let rect = Rect::new(area.x + x, area.y + y - state.scroll, 0, h);
            match placement {
                Placement::Header { group, .. } => {
                    let group = &self.groups[*group];
                    let mut spans = vec![Span::styled(
                        format!("■ {}", group.category.name),
                        Style::default()
                            .fg(rgb(group.category.accent_color))
                            .add_modifier(Modifier::BOLD),
                    )];
                    if group.books.is_empty() {
                        spans.push(Span::styled(
                            format!("  {}", self.language.text(TextKey::NoDescription)),
                            Style::default().fg(self.palette.muted),
                        ));
                    }
                    let rect = Rect { width: area.width, ..rect };
                    frame.render_widget(Paragraph::new(Line::from(spans)), rect);
                }
                Placement::Tile { group, index, id, .. } => {
                    let rect = Rect {
                        width: TILE_WIDTH.min(area.x + area.width - rect.x),
                        ..rect
                    };
                    self.draw_tile(frame, rect, *group, *index, protocols);
                    state.hits.push((rect, id.clone()));
                }
            }
        }
    }

    fn draw_tile(
        &self,
        frame: &mut ratatui::Frame,
        rect: Rect,
        group: usize,
        index: usize,
        protocols: &mut CoverProtocols,
    ) {
        let book = self.groups[group].books[index];
        let hovered = self.hovered == Some(&book.id);
        let border = if hovered {
            Style::default()
                .fg(self.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.palette.muted)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if hovered { BorderType::Thick } else { BorderType::Rounded })
            .border_style(border);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        if inner.height < 3 {
            return;
        }

        let cover_area = Rect { height: inner.height - 2, ..inner };
        let title_area = Rect {
            y: inner.y + inner.height - 2,
            height: 2,
            ..inner
        };

        let protocol = self
            .covers
            .image(&book.cover_image_ref)
            .and_then(|cover| {
                protocols.get_or_encode(self.picker, &book.cover_image_ref, &cover.image, cover_area)
            });
        match protocol {
            Some(protocol) => {
                let proto_area = protocol.area();
                let w = proto_area.width.min(cover_area.width);
                let h = proto_area.height.min(cover_area.height);
                let centred = Rect::new(
                    cover_area.x + cover_area.width.saturating_sub(w) / 2,
                    cover_area.y + cover_area.height.saturating_sub(h) / 2,
                    w,
                    h,
                );
                frame.render_widget(ImageWidget::new(protocol), centred);
            }
            None => {
                let swatch = Paragraph::new(book.title.clone())
                    .wrap(Wrap { trim: true })
                    .style(
                        Style::default()
                            .bg(rgb(book.accent_color))
                            .fg(contrast_text(book.accent_color)),
                    );
                frame.render_widget(swatch, cover_area);
            }
        }

        let title_style = if hovered {
            Style::default().fg(self.palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.palette.text)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(book.title.clone(), title_style)).wrap(Wrap { trim: true }),
            title_area,
        );
    }
}
