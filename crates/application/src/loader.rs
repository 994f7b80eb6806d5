//! Notes loading with stale-response protection.

use folio_core::{BookId, BookRecord, FetchError, Language, parse_notes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLoadState {
    pub status: LoadStatus,
    pub raw_text: String,
    pub extracted_tags: Vec<String>,
    pub display_text: String,
}

impl Default for ContentLoadState {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            raw_text: String::new(),
            extracted_tags: Vec::new(),
            display_text: String::new(),
        }
    }
}

/// Identifies one issued content request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub book_id: BookId,
    pub content_ref: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ContentLoader {
    language: Language,
    generation: u64,
    requested: Option<BookId>,
    state: ContentLoadState,
}

impl ContentLoader {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            generation: 0,
            requested: None,
            state: ContentLoadState::default(),
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if self.state.status == LoadStatus::Failed {
            let message = language.notes_load_failed().to_string();
            self.state.raw_text = message.clone();
            self.state.display_text = message;
        }
    }

    pub fn state(&self) -> &ContentLoadState {
        &self.state
    }

    pub fn requested(&self) -> Option<&BookId> {
        self.requested.as_ref()
    }

    /// Starts a request for `book`, superseding any request still in flight.
    pub fn begin(&mut self, book: &BookRecord) -> LoadTicket {
        self.generation += 1;
        self.requested = Some(book.id.clone());
        self.state = ContentLoadState {
            status: LoadStatus::Loading,
            ..ContentLoadState::default()
        };
        LoadTicket {
            book_id: book.id.clone(),
            content_ref: book.content_ref.clone(),
            generation: self.generation,
        }
    }

    /// Applies a fetch result; returns `false` when the ticket is stale.
    pub fn resolve(&mut self, ticket: &LoadTicket, result: Result<String, FetchError>) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "discarding stale notes for {} (generation {}, current {})",
                ticket.book_id,
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.state = match result {
            Ok(raw) => {
                let doc = parse_notes(&raw);
                ContentLoadState {
                    status: LoadStatus::Loaded,
                    raw_text: raw,
                    extracted_tags: doc.tags,
                    display_text: doc.body,
                }
            }
            Err(err) => {
                log::warn!("failed to load notes for {}: {err}", ticket.book_id);
                let message = self.language.notes_load_failed().to_string();
                ContentLoadState {
                    status: LoadStatus::Failed,
                    raw_text: message.clone(),
                    extracted_tags: Vec::new(),
                    display_text: message,
                }
            }
        };
        true
    }

    /// Back to idle; anything still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.requested = None;
        self.state = ContentLoadState::default();
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation && self.requested.as_ref() == Some(&ticket.book_id)
    }
}
