//! Selection/hover store shared by every view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_core::{BookId, BookRecord};

/// Snapshot of what is hovered, what is selected and whether the modal is open.
///
/// `is_modal_open()` is true exactly when `selected_book()` is `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    hovered_book_id: Option<BookId>,
    selected_book: Option<BookRecord>,
    is_modal_open: bool,
    open_generation: u64,
}

impl SelectionState {
    pub fn hovered_book_id(&self) -> Option<&BookId> {
        self.hovered_book_id.as_ref()
    }

    pub fn selected_book(&self) -> Option<&BookRecord> {
        self.selected_book.as_ref()
    }

    pub fn is_modal_open(&self) -> bool {
        self.is_modal_open
    }

    /// Bumped each time the modal goes from closed to open.
    pub fn open_generation(&self) -> u64 {
        self.open_generation
    }

    pub fn is_hovered(&self, id: &BookId) -> bool {
        self.hovered_book_id.as_ref() == Some(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&SelectionState) + Send + Sync>;

#[derive(Default)]
struct StoreInner {
    state: SelectionState,
    version: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

/// Cloneable handle to the single selection state.
///
/// All mutations go through one mutex, so the hover id and the
/// selected-book/open-flag pair are never observed half-written.
#[derive(Clone, Default)]
pub struct SelectionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SelectionStore")
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SelectionState {
        self.lock().state.clone()
    }

    /// Number of mutations applied so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&SelectionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.lock();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        inner.subscribers.len() != before
    }

    pub fn set_hovered_book(&self, id: Option<BookId>) {
        self.mutate(|state| {
            if state.hovered_book_id == id {
                return false;
            }
            state.hovered_book_id = id;
            true
        });
    }

    pub fn open_book_modal(&self, book: BookRecord) {
        log::debug!("open book modal: {}", book.id);
        self.mutate(|state| {
            if !state.is_modal_open {
                state.open_generation += 1;
            }
            state.selected_book = Some(book);
            state.is_modal_open = true;
            true
        });
    }

    pub fn close_book_modal(&self) {
        self.mutate(|state| {
            if !state.is_modal_open && state.selected_book.is_none() {
                return false;
            }
            state.selected_book = None;
            state.is_modal_open = false;
            true
        });
    }

    /// Selecting a book opens the modal for it; clearing the selection closes it.
    pub fn set_selected_book(&self, book: Option<BookRecord>) {
        match book {
            Some(book) => self.open_book_modal(book),
            None => self.close_book_modal(),
        }
    }

    /// Returns `false` when asked to open with nothing selected.
    pub fn set_is_modal_open(&self, open: bool) -> bool {
        if !open {
            self.close_book_modal();
            return true;
        }

        let mut applied = false;
        self.mutate(|state| {
            applied = state.selected_book.is_some();
            if applied && !state.is_modal_open {
                state.open_generation += 1;
                state.is_modal_open = true;
                return true;
            }
            false
        });
        if !applied {
            log::warn!("ignored request to open the book modal without a selected book");
        }
        applied
    }

    fn mutate(&self, apply: impl FnOnce(&mut SelectionState) -> bool) {
        let (snapshot, subscribers) = {
            let mut inner = self.lock();
            if !apply(&mut inner.state) {
                return;
            }
            inner.version += 1;
            let subscribers = inner
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect::<Vec<_>>();
            (inner.state.clone(), subscribers)
        };

        for callback in subscribers {
            callback(&snapshot);
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
