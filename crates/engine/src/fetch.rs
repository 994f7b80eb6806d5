//! Background text fetches reported back over a channel.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use folio_core::{AssetSource, FetchError};

/// Runs `fetch_text` on short-lived worker threads; results carry the caller's key.
pub struct TextFetcher<K> {
    source: Arc<dyn AssetSource>,
    tx: Sender<(K, Result<String, FetchError>)>,
    rx: Receiver<(K, Result<String, FetchError>)>,
    in_flight: usize,
}

impl<K: Send + 'static> TextFetcher<K> {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        let (tx, rx) = channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn spawn(&mut self, key: K, reference: &str) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let reference = reference.to_string();
        self.in_flight += 1;
        log::debug!("fetching notes {reference}");
        thread::spawn(move || {
            let result = source.fetch_text(&reference);
            let _ = tx.send((key, result));
        });
    }

    /// Results in arrival order.
    pub fn poll(&mut self) -> Vec<(K, Result<String, FetchError>)> {
        let results: Vec<_> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
