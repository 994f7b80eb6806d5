use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(value: u32) -> Self {
        Self(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        )
    }

    /// Linear blend toward `other`; `t` is clamped to `0.0..=1.0`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (a as f32 + (b as f32 - a as f32) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    pub fn scale(self, factor: f32) -> Rgb {
        let factor = factor.max(0.0);
        let apply = |c: u8| -> u8 { (c as f32 * factor).round().clamp(0.0, 255.0) as u8 };
        Rgb(apply(self.0), apply(self.1), apply(self.2))
    }

    pub fn luminance(self) -> f32 {
        (0.2126 * self.0 as f32 + 0.7152 * self.1 as f32 + 0.0722 * self.2 as f32) / 255.0
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl std::str::FromStr for Rgb {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("expected #rrggbb colour");
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb::from_hex)
            .map_err(|_| "expected #rrggbb colour")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub category: String,
    pub cover_image_ref: String,
    pub content_ref: String,
    pub tags: Vec<String>,
    pub spatial_position: [f32; 3],
    pub spatial_rotation: [f32; 3],
    pub accent_color: Rgb,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub accent_color: Rgb,
    pub shelf_level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("book at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate book id `{0}`")]
    DuplicateBook(BookId),
    #[error("book `{0}` has an empty title")]
    EmptyTitle(BookId),
    #[error("duplicate category `{0}`")]
    DuplicateCategory(String),
    #[error("book `{book}` references unknown category `{category}`")]
    UnknownCategory { book: BookId, category: String },
}

/// Read-only catalog of books grouped into categories.
///
/// Every book is guaranteed to reference an existing category.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    categories: Vec<CategoryRecord>,
    books: Vec<BookRecord>,
    index_by_id: HashMap<BookId, usize>,
}

impl Catalog {
    pub fn new(
        categories: Vec<CategoryRecord>,
        books: Vec<BookRecord>,
    ) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for category in &categories {
            if !names.insert(category.name.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }
        }

        let mut index_by_id = HashMap::with_capacity(books.len());
        for (idx, book) in books.iter().enumerate() {
            if book.id.as_str().trim().is_empty() {
                return Err(CatalogError::EmptyId(idx));
            }
            if book.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle(book.id.clone()));
            }
            if !names.contains(book.category.as_str()) {
                return Err(CatalogError::UnknownCategory {
                    book: book.id.clone(),
                    category: book.category.clone(),
                });
            }
            if index_by_id.insert(book.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateBook(book.id.clone()));
            }
        }

        Ok(Self {
            categories,
            books,
            index_by_id,
        })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .map(|entry| CategoryRecord {
                name: entry.name.to_string(),
                accent_color: entry.accent,
                shelf_level: entry.shelf_level,
            })
            .collect();
        let books = BUILTIN_BOOKS.iter().map(BookEntry::to_record).collect();
        Self::new(categories, books)
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn categories(&self) -> &[CategoryRecord] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn book(&self, id: &BookId) -> Option<&BookRecord> {
        self.index_of(id).and_then(|idx| self.books.get(idx))
    }

    pub fn index_of(&self, id: &BookId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryRecord> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn books_in_category<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a BookRecord> + 'a {
        self.books.iter().filter(move |book| book.category == name)
    }
}

struct CategoryEntry {
    name: &'static str,
    accent: Rgb,
    shelf_level: u32,
}

struct BookEntry {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    cover: &'static str,
    notes: &'static str,
    tags: &'static [&'static str],
    position: [f32; 3],
    rotation: [f32; 3],
    accent: Rgb,
    description: Option<&'static str>,
}

impl BookEntry {
    fn to_record(&self) -> BookRecord {
        BookRecord {
            id: BookId::new(self.id),
            title: self.title.to_string(),
            category: self.category.to_string(),
            cover_image_ref: self.cover.to_string(),
            content_ref: self.notes.to_string(),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            spatial_position: self.position,
            spatial_rotation: self.rotation,
            accent_color: self.accent,
            description: self.description.map(str::to_string),
        }
    }
}

const BUILTIN_CATEGORIES: &[CategoryEntry] = &[
    CategoryEntry {
        name: "Systems",
        accent: Rgb::from_hex(0x4f7cac),
        shelf_level: 2,
    },
    CategoryEntry {
        name: "Thinking",
        accent: Rgb::from_hex(0xc0874f),
        shelf_level: 1,
    },
    CategoryEntry {
        name: "Fiction",
        accent: Rgb::from_hex(0x7a9e6b),
        shelf_level: 0,
    },
];

const BUILTIN_BOOKS: &[BookEntry] = &[
    BookEntry {
        id: "ddia",
        title: "Designing Data-Intensive Applications",
        category: "Systems",
        cover: "covers/ddia.png",
        notes: "notes/ddia.md",
        tags: &["databases", "distributed"],
        position: [-1.2, 4.29, 0.0],
        rotation: [0.0, 0.08, 0.0],
        accent: Rgb::from_hex(0xb5473a),
        description: Some("Replication, partitioning and the trade-offs behind them."),
    },
    BookEntry {
        id: "trpl",
        title: "The Rust Programming Language",
        category: "Systems",
        cover: "covers/trpl.png",
        notes: "notes/trpl.md",
        tags: &["rust", "languages"],
        position: [0.0, 4.29, 0.0],
        rotation: [0.0, 0.0, 0.0],
        accent: Rgb::from_hex(0xd9822b),
        description: Some("Ownership, borrowing and fearless concurrency."),
    },
    BookEntry {
        id: "ostep",
        title: "Operating Systems: Three Easy Pieces",
        category: "Systems",
        cover: "covers/ostep.png",
        notes: "notes/ostep.md",
        tags: &["os"],
        position: [1.2, 4.29, 0.0],
        rotation: [0.0, -0.08, 0.0],
        accent: Rgb::from_hex(0x3d6fb6),
        description: None,
    },
    BookEntry {
        id: "thinking-fast-and-slow",
        title: "Thinking, Fast and Slow",
        category: "Thinking",
        cover: "covers/thinking-fast-and-slow.png",
        notes: "notes/thinking-fast-and-slow.md",
        tags: &["psychology"],
        position: [-1.2, 2.49, 0.0],
        rotation: [0.0, 0.06, 0.0],
        accent: Rgb::from_hex(0xe0c341),
        description: Some("Two systems, many biases."),
    },
    BookEntry {
        id: "geb",
        title: "Gödel, Escher, Bach",
        category: "Thinking",
        cover: "covers/geb.png",
        notes: "notes/geb.md",
        tags: &["logic", "recursion"],
        position: [0.0, 2.49, 0.0],
        rotation: [0.0, 0.0, 0.0],
        accent: Rgb::from_hex(0x6b4c9a),
        description: Some("Strange loops all the way down."),
    },
    BookEntry {
        id: "everyday-things",
        title: "The Design of Everyday Things",
        category: "Thinking",
        cover: "covers/everyday-things.png",
        notes: "notes/everyday-things.md",
        tags: &["design"],
        position: [1.2, 2.49, 0.0],
        rotation: [0.0, -0.06, 0.0],
        accent: Rgb::from_hex(0xd14f4f),
        description: None,
    },
    BookEntry {
        id: "left-hand-of-darkness",
        title: "The Left Hand of Darkness",
        category: "Fiction",
        cover: "covers/left-hand-of-darkness.png",
        notes: "notes/left-hand-of-darkness.md",
        tags: &["sci-fi"],
        position: [-0.6, 0.69, 0.0],
        rotation: [0.0, 0.05, 0.0],
        accent: Rgb::from_hex(0x9fb7c9),
        description: Some("Winter, and a planet without fixed gender."),
    },
    BookEntry {
        id: "piranesi",
        title: "Piranesi",
        category: "Fiction",
        cover: "covers/piranesi.png",
        notes: "notes/piranesi.md",
        tags: &["fantasy"],
        position: [0.6, 0.69, 0.0],
        rotation: [0.0, -0.05, 0.0],
        accent: Rgb::from_hex(0x2f8f83),
        description: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, level: u32) -> CategoryRecord {
        CategoryRecord {
            name: name.to_string(),
            accent_color: Rgb(10, 20, 30),
            shelf_level: level,
        }
    }

    fn book(id: &str, category: &str) -> BookRecord {
        BookRecord {
            id: BookId::new(id),
            title: format!("Title {id}"),
            category: category.to_string(),
            cover_image_ref: format!("covers/{id}.png"),
            content_ref: format!("notes/{id}.md"),
            tags: Vec::new(),
            spatial_position: [0.0; 3],
            spatial_rotation: [0.0; 3],
            accent_color: Rgb(200, 10, 10),
            description: None,
        }
    }

    #[test]
    fn builtin_catalog_validates() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        for book in catalog.books() {
            assert!(catalog.category(&book.category).is_some());
        }
    }

    #[test]
    fn unknown_category_is_a_construction_error() {
        let err = Catalog::new(vec![category("x", 0)], vec![book("a", "y")]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownCategory {
                book: BookId::new("a"),
                category: "y".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_ids_and_categories_are_rejected() {
        let err = Catalog::new(vec![category("x", 0)], vec![book("a", "x"), book("a", "x")])
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateBook(BookId::new("a")));

        let err = Catalog::new(vec![category("x", 0), category("x", 1)], Vec::new()).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateCategory("x".to_string()));
    }

    #[test]
    fn blank_title_and_id_are_rejected() {
        let mut untitled = book("a", "x");
        untitled.title = "  ".to_string();
        assert_eq!(
            Catalog::new(vec![category("x", 0)], vec![untitled]).unwrap_err(),
            CatalogError::EmptyTitle(BookId::new("a"))
        );
        assert_eq!(
            Catalog::new(vec![category("x", 0)], vec![book(" ", "x")]).unwrap_err(),
            CatalogError::EmptyId(0)
        );
    }

    #[test]
    fn books_in_category_preserves_order() {
        let catalog = Catalog::new(
            vec![category("x", 0), category("y", 1)],
            vec![book("a", "x"), book("b", "y"), book("c", "x")],
        )
        .unwrap();
        let ids: Vec<_> = catalog
            .books_in_category("x")
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(catalog.index_of(&BookId::new("c")), Some(2));
        assert!(catalog.book(&BookId::new("missing")).is_none());
    }

    #[test]
    fn rgb_parses_and_formats() {
        let color: Rgb = "#4F7CAC".parse().unwrap();
        assert_eq!(color, Rgb(0x4f, 0x7c, 0xac));
        assert_eq!(color.to_string(), "#4f7cac");
        assert!("4f7ca".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn rgb_lerp_hits_endpoints() {
        let a = Rgb(0, 0, 0);
        let b = Rgb(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb(100, 50, 25));
        assert_eq!(b.scale(0.5), Rgb(100, 50, 25));
    }
}
