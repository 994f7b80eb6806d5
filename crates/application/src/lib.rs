//! Application orchestration layer for Folio.

use folio_core::{BookId, BookRecord, Catalog, Settings};

mod grid;
mod loader;
mod modal;
mod store;

pub use grid::{CategoryGroup, NavDirection, grid_neighbor, group_by_category};
pub use loader::{ContentLoadState, ContentLoader, LoadStatus, LoadTicket};
pub use modal::{
    DESKTOP_MIN_WIDTH, HeaderCollapse, MOBILE_HEADER_MIN_HEIGHT, ModalLayout, ModalPhase,
    ModalSession, mobile_header,
};
pub use store::{SelectionState, SelectionStore, SubscriptionId};

#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub catalog: Catalog,
    pub store: SelectionStore,
}

impl AppContext {
    pub fn new(settings: Settings, catalog: Catalog) -> Self {
        Self {
            settings,
            catalog,
            store: SelectionStore::new(),
        }
    }

    pub fn with_store(mut self, store: SelectionStore) -> Self {
        self.store = store;
        self
    }

    /// Opens the modal for `id` and remembers it as recently opened.
    pub fn open_book(&mut self, id: &BookId) -> bool {
        let Some(book) = self.catalog.book(id).cloned() else {
            log::warn!("cannot open unknown book {id}");
            return false;
        };
        self.settings.record_opened(&book.id);
        self.store.open_book_modal(book);
        true
    }

    /// Opens the book `offset` places away from the selected one, wrapping around.
    pub fn open_relative(&mut self, offset: isize) -> bool {
        let len = self.catalog.len();
        if len == 0 {
            return false;
        }
        let state = self.store.snapshot();
        let Some(current) = state
            .selected_book()
            .and_then(|book| self.catalog.index_of(&book.id))
        else {
            return false;
        };
        let next = (current as isize + offset).rem_euclid(len as isize) as usize;
        let id = self.catalog.books()[next].id.clone();
        self.open_book(&id)
    }

    pub fn hovered_book(&self) -> Option<&BookRecord> {
        let state = self.store.snapshot();
        state
            .hovered_book_id()
            .and_then(|id| self.catalog.book(id))
    }
}
