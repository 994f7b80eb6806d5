//! Background cover fetch + decode with a per-reference cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use folio_core::{AssetSource, Catalog, FetchError, Rgb};
use image::RgbaImage;

#[derive(Debug, Clone)]
pub struct CoverImage {
    pub image: RgbaImage,
    pub average: Rgb,
}

impl CoverImage {
    pub fn decode(reference: &str, bytes: &[u8]) -> Result<Self, FetchError> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| FetchError::Decode {
                reference: reference.to_string(),
                message: err.to_string(),
            })?
            .to_rgba8();
        let average = average_color(&image);
        Ok(Self { image, average })
    }

    /// Pixel colour at texture coordinates in `0.0..=1.0`.
    pub fn sample(&self, u: f32, v: f32) -> Rgb {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return self.average;
        }
        let x = ((u.clamp(0.0, 1.0) * (w - 1) as f32).round() as u32).min(w - 1);
        let y = ((v.clamp(0.0, 1.0) * (h - 1) as f32).round() as u32).min(h - 1);
        let px = self.image.get_pixel(x, y);
        Rgb(px[0], px[1], px[2])
    }
}

fn average_color(image: &RgbaImage) -> Rgb {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let (r, g, b) = image.pixels().fold((0u64, 0u64, 0u64), |(r, g, b), px| {
        (r + px[0] as u64, g + px[1] as u64, b + px[2] as u64)
    });
    Rgb((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

#[derive(Debug, Clone)]
pub enum CoverState {
    Pending,
    Ready(Arc<CoverImage>),
    Failed,
}

/// A finished fetch, reported once per reference.
#[derive(Debug, Clone)]
pub struct CoverEvent {
    pub reference: String,
    pub loaded: bool,
}

pub struct CoverLoader {
    source: Arc<dyn AssetSource>,
    cache: HashMap<String, CoverState>,
    tx: Sender<(String, Result<CoverImage, FetchError>)>,
    rx: Receiver<(String, Result<CoverImage, FetchError>)>,
}

impl std::fmt::Debug for CoverLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverLoader")
            .field("cached", &self.cache.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl CoverLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        let (tx, rx) = channel();
        Self {
            source,
            cache: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Starts a fetch for `reference` unless it is already cached or in flight.
    ///
    /// Returns `true` when a new fetch was started.
    pub fn request(&mut self, reference: &str) -> bool {
        if self.cache.contains_key(reference) {
            return false;
        }
        if reference.trim().is_empty() {
            log::debug!("cover reference is empty; keeping accent colour");
            self.cache.insert(reference.to_string(), CoverState::Failed);
            return false;
        }

        self.cache
            .insert(reference.to_string(), CoverState::Pending);
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let reference = reference.to_string();
        log::debug!("fetching cover {reference}");
        thread::spawn(move || {
            let result = source
                .fetch_bytes(&reference)
                .and_then(|bytes| CoverImage::decode(&reference, &bytes));
            let _ = tx.send((reference, result));
        });
        true
    }

    pub fn request_catalog(&mut self, catalog: &Catalog) -> usize {
        catalog
            .books()
            .iter()
            .filter(|book| self.request(&book.cover_image_ref))
            .count()
    }

    /// Drains finished fetches into the cache.
    pub fn poll(&mut self) -> Vec<CoverEvent> {
        let mut events = Vec::new();
        while let Ok((reference, result)) = self.rx.try_recv() {
            let state = match result {
                Ok(cover) => {
                    log::debug!(
                        "cover {reference} ready ({}x{})",
                        cover.image.width(),
                        cover.image.height()
                    );
                    CoverState::Ready(Arc::new(cover))
                }
                Err(err) => {
                    log::warn!("cover unavailable: {err}");
                    CoverState::Failed
                }
            };
            let loaded = matches!(state, CoverState::Ready(_));
            self.cache.insert(reference.clone(), state);
            events.push(CoverEvent { reference, loaded });
        }
        events
    }

    pub fn state(&self, reference: &str) -> Option<&CoverState> {
        self.cache.get(reference)
    }

    pub fn image(&self, reference: &str) -> Option<Arc<CoverImage>> {
        match self.cache.get(reference) {
            Some(CoverState::Ready(cover)) => Some(Arc::clone(cover)),
            _ => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.cache
            .values()
            .filter(|state| matches!(state, CoverState::Pending))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct MemorySource {
        files: HashMap<String, Vec<u8>>,
        fetches: AtomicUsize,
    }

    impl AssetSource for MemorySource {
        fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(reference)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(reference.to_string()))
        }
    }

    fn png(color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba(color));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn drain(loader: &mut CoverLoader) -> Vec<CoverEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while loader.pending() > 0 && Instant::now() < deadline {
            events.extend(loader.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    fn loader() -> (CoverLoader, Arc<MemorySource>) {
        let mut files = HashMap::new();
        files.insert("covers/red.png".to_string(), png([200, 10, 10, 255]));
        files.insert("covers/broken.png".to_string(), b"not an image".to_vec());
        let source = Arc::new(MemorySource {
            files,
            fetches: AtomicUsize::new(0),
        });
        (CoverLoader::new(source.clone()), source)
    }

    #[test]
    fn decodes_and_caches_by_reference() {
        let (mut loader, source) = loader();
        assert!(loader.request("covers/red.png"));
        assert!(!loader.request("covers/red.png"));
        let events = drain(&mut loader);
        assert_eq!(events.len(), 1);
        assert!(events[0].loaded);

        let cover = loader.image("covers/red.png").unwrap();
        assert_eq!(cover.average, Rgb(200, 10, 10));
        assert_eq!(cover.sample(0.5, 0.5), Rgb(200, 10, 10));
        assert!(!loader.request("covers/red.png"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_permanent_and_never_retried() {
        let (mut loader, source) = loader();
        loader.request("covers/missing.png");
        loader.request("covers/broken.png");
        let events = drain(&mut loader);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.loaded));
        assert!(matches!(loader.state("covers/missing.png"), Some(CoverState::Failed)));
        assert!(matches!(loader.state("covers/broken.png"), Some(CoverState::Failed)));

        assert!(!loader.request("covers/missing.png"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_reference_fails_without_fetching() {
        let (mut loader, source) = loader();
        assert!(!loader.request("  "));
        assert!(matches!(loader.state("  "), Some(CoverState::Failed)));
        assert_eq!(loader.pending(), 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
