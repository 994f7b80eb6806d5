//! Content modal lifecycle and layout decisions.

use folio_core::{BookId, FetchError, Language};

use crate::loader::{ContentLoadState, ContentLoader, LoadStatus, LoadTicket};
use crate::store::SelectionState;

/// Terminal width (in columns) at which the modal switches to two columns.
pub const DESKTOP_MIN_WIDTH: u16 = 100;

/// Rows the mobile header keeps once fully collapsed.
pub const MOBILE_HEADER_MIN_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalLayout {
    Mobile,
    Desktop,
}

impl ModalLayout {
    pub fn for_width(width: u16) -> Self {
        if width >= DESKTOP_MIN_WIDTH {
            ModalLayout::Desktop
        } else {
            ModalLayout::Mobile
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderCollapse {
    pub height: u16,
    pub opacity: f32,
}

/// Parallax collapse of the mobile header: shrinks and fades as notes scroll.
pub fn mobile_header(scroll: u16, full_height: u16) -> HeaderCollapse {
    let full_height = full_height.max(MOBILE_HEADER_MIN_HEIGHT);
    let range = full_height - MOBILE_HEADER_MIN_HEIGHT;
    if range == 0 {
        return HeaderCollapse {
            height: full_height,
            opacity: 1.0,
        };
    }

    let progress = (scroll as f32 / range as f32).clamp(0.0, 1.0);
    let height = full_height - (range as f32 * progress).round() as u16;
    HeaderCollapse {
        height,
        opacity: 1.0 - progress,
    }
}

/// One open-modal session: which book is shown and the state of its notes.
#[derive(Debug, Clone)]
pub struct ModalSession {
    open_for: Option<BookId>,
    generation: u64,
    loader: ContentLoader,
    scroll: u16,
}

impl ModalSession {
    pub fn new(language: Language) -> Self {
        Self {
            open_for: None,
            generation: 0,
            loader: ContentLoader::new(language),
            scroll: 0,
        }
    }

    /// Reconciles with the store; returns a ticket when a fetch must be issued.
    pub fn sync(&mut self, selection: &SelectionState) -> Option<LoadTicket> {
        match selection.selected_book() {
            Some(book) if selection.is_modal_open() => {
                if self.open_for.as_ref() == Some(&book.id)
                    && self.generation == selection.open_generation()
                {
                    return None;
                }
                self.open_for = Some(book.id.clone());
                self.generation = selection.open_generation();
                self.scroll = 0;
                Some(self.loader.begin(book))
            }
            _ => {
                if self.open_for.take().is_some() {
                    self.loader.reset();
                    self.scroll = 0;
                }
                None
            }
        }
    }

    pub fn resolve(&mut self, ticket: &LoadTicket, result: Result<String, FetchError>) -> bool {
        self.loader.resolve(ticket, result)
    }

    pub fn set_language(&mut self, language: Language) {
        self.loader.set_language(language);
    }

    pub fn phase(&self) -> ModalPhase {
        if self.open_for.is_none() {
            return ModalPhase::Closed;
        }
        match self.loader.state().status {
            LoadStatus::Idle | LoadStatus::Loading => ModalPhase::Loading,
            LoadStatus::Loaded => ModalPhase::Loaded,
            LoadStatus::Failed => ModalPhase::Failed,
        }
    }

    pub fn open_for(&self) -> Option<&BookId> {
        self.open_for.as_ref()
    }

    pub fn content(&self) -> &ContentLoadState {
        self.loader.state()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_by(&mut self, delta: i32, max: u16) {
        let next = (self.scroll as i32 + delta).clamp(0, max as i32);
        self.scroll = next as u16;
    }
}
