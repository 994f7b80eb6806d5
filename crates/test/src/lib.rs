//! Test helpers and fixtures.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use folio_core::{
    AssetSource, BookId, BookRecord, Catalog, CategoryRecord, FetchError, Rgb, Settings,
};

pub const ACCENT_X: Rgb = Rgb(0x2f, 0x6f, 0xb0);
pub const ACCENT_Y: Rgb = Rgb(0xc0, 0x5a, 0x2e);

pub fn make_settings() -> Settings {
    Settings {
        reduced_motion: true,
        ..Settings::default()
    }
}

pub fn make_book(id: &str, category: &str, x: f32, y: f32, accent: Rgb) -> BookRecord {
    BookRecord {
        id: BookId::new(id),
        title: format!("Book {id}"),
        category: category.to_string(),
        cover_image_ref: format!("covers/{id}.png"),
        content_ref: format!("notes/{id}.md"),
        tags: vec![category.to_lowercase()],
        spatial_position: [x, y, 0.0],
        spatial_rotation: [0.0, 0.0, 0.0],
        accent_color: accent,
        description: None,
    }
}

/// Two categories, three books: `book1` and `book2` in X, `book3` in Y.
pub fn scenario_catalog() -> Catalog {
    let categories = vec![
        CategoryRecord {
            name: "X".to_string(),
            accent_color: ACCENT_X,
            shelf_level: 1,
        },
        CategoryRecord {
            name: "Y".to_string(),
            accent_color: ACCENT_Y,
            shelf_level: 0,
        },
    ];
    let books = vec![
        make_book("book1", "X", -0.6, 2.49, ACCENT_X),
        make_book("book2", "X", 0.6, 2.49, Rgb(0x88, 0x22, 0x99)),
        make_book("book3", "Y", 0.0, 0.69, ACCENT_Y),
    ];
    Catalog::new(categories, books).expect("scenario catalog is valid")
}

/// A solid-colour PNG, as a cover image would arrive over the wire.
pub fn png_bytes(color: [u8; 3], size: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(size, size, image::Rgba([color[0], color[1], color[2], 255]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Answers from a fixed table and records every reference fetched.
#[derive(Default)]
pub struct ScriptedSource {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reference: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(reference.to_string(), Ok(body.into()));
        self
    }

    pub fn failing(mut self, reference: &str, message: &str) -> Self {
        self.responses.insert(
            reference.to_string(),
            Err(FetchError::Io {
                reference: reference.to_string(),
                message: message.to_string(),
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, reference: &str) -> usize {
        self.calls().iter().filter(|call| *call == reference).count()
    }
}

impl AssetSource for ScriptedSource {
    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(reference.to_string());
        }
        self.responses
            .get(reference)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(reference.to_string())))
    }
}

/// Holds every fetch until the test releases its reference, so arrival order is scripted.
pub struct GatedSource {
    bodies: HashMap<String, String>,
    released: Mutex<HashSet<String>>,
    wake: Condvar,
}

impl GatedSource {
    pub fn new(bodies: &[(&str, &str)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(reference, body)| (reference.to_string(), body.to_string()))
                .collect(),
            released: Mutex::new(HashSet::new()),
            wake: Condvar::new(),
        }
    }

    pub fn release(&self, reference: &str) {
        if let Ok(mut released) = self.released.lock() {
            released.insert(reference.to_string());
        }
        self.wake.notify_all();
    }
}

impl AssetSource for GatedSource {
    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        let mut released = self.released.lock().map_err(|_| FetchError::Io {
            reference: reference.to_string(),
            message: "gate poisoned".to_string(),
        })?;
        while !released.contains(reference) {
            released = self.wake.wait(released).map_err(|_| FetchError::Io {
                reference: reference.to_string(),
                message: "gate poisoned".to_string(),
            })?;
        }
        self.bodies
            .get(reference)
            .map(|body| body.clone().into_bytes())
            .ok_or_else(|| FetchError::NotFound(reference.to_string()))
    }
}

/// Calls `poll` until it yields something or five seconds pass.
pub fn wait_for<T>(mut poll: impl FnMut() -> Vec<T>) -> Vec<T> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let items = poll();
        if !items.is_empty() || Instant::now() >= deadline {
            return items;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_catalog_has_expected_shape() {
        let catalog = scenario_catalog();
        assert_eq!(catalog.categories().len(), 2);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.books_in_category("X").count(), 2);
    }

    #[test]
    fn scripted_source_records_calls() {
        let source = ScriptedSource::new()
            .with("a.md", "hello")
            .failing("b.png", "boom");
        assert_eq!(source.fetch_text("a.md").unwrap(), "hello");
        assert!(source.fetch_bytes("b.png").is_err());
        assert!(matches!(source.fetch_bytes("c"), Err(FetchError::NotFound(_))));
        assert_eq!(source.calls(), vec!["a.md", "b.png", "c"]);
    }

    #[test]
    fn png_fixture_decodes() {
        let bytes = png_bytes([1, 2, 3], 4);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
