//! Declarative scene graph built from the catalog.

use folio_core::{BookId, Catalog, Rgb};

use crate::back_cover::{BACK_COVER_HEIGHT, BACK_COVER_WIDTH, BackCover, synthesize_back_cover};
use crate::math::Vec3;

pub const BOOK_SIZE: Vec3 = Vec3::new(0.9, 1.3, 0.2);
pub const SHELF_SPACING: f32 = 1.8;
pub const PLANK_THICKNESS: f32 = 0.08;
pub const PLANK_DEPTH: f32 = 0.6;
pub const BACKBOARD_THICKNESS: f32 = 0.05;
pub const SHELF_MARGIN: f32 = 0.4;
const EMPTY_SHELF_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub center: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Solid(Rgb),
    Cover { cover_ref: String },
    BackCover { book_index: usize },
}

#[derive(Debug, Clone)]
pub struct BookMesh {
    pub book_id: BookId,
    pub index: usize,
    pub title: String,
    pub cover_ref: String,
    pub base: Transform,
    pub size: Vec3,
    pub accent: Rgb,
    pub front: Material,
    pub back: Material,
    pub edge: Rgb,
}

#[derive(Debug, Clone)]
pub struct ShelfNode {
    pub category: String,
    pub level: u32,
    pub accent: Rgb,
    pub plank: BoxGeometry,
    pub backboard: BoxGeometry,
    pub label_anchor: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional { direction: Vec3 },
    Point { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    shelves: Vec<ShelfNode>,
    books: Vec<BookMesh>,
    back_covers: Vec<BackCover>,
    lights: Vec<Light>,
}

pub fn shelf_y(level: u32) -> f32 {
    level as f32 * SHELF_SPACING
}

impl SceneGraph {
    pub fn build(catalog: &Catalog) -> Self {
        let shelves = catalog
            .categories()
            .iter()
            .map(|category| {
                let xs: Vec<f32> = catalog
                    .books_in_category(&category.name)
                    .map(|book| book.spatial_position[0])
                    .collect();
                let (min_x, max_x) = if xs.is_empty() {
                    (-EMPTY_SHELF_WIDTH / 2.0, EMPTY_SHELF_WIDTH / 2.0)
                } else {
                    let min = xs.iter().copied().fold(f32::INFINITY, f32::min);
                    let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    (
                        min - BOOK_SIZE.x / 2.0 - SHELF_MARGIN,
                        max + BOOK_SIZE.x / 2.0 + SHELF_MARGIN,
                    )
                };
                let width = max_x - min_x;
                let center_x = (min_x + max_x) / 2.0;
                let y = shelf_y(category.shelf_level);

                ShelfNode {
                    category: category.name.clone(),
                    level: category.shelf_level,
                    accent: category.accent_color,
                    plank: BoxGeometry {
                        center: Vec3::new(center_x, y, 0.0),
                        size: Vec3::new(width, PLANK_THICKNESS, PLANK_DEPTH),
                    },
                    backboard: BoxGeometry {
                        center: Vec3::new(center_x, y + SHELF_SPACING / 2.0, -PLANK_DEPTH / 2.0),
                        size: Vec3::new(width, SHELF_SPACING, BACKBOARD_THICKNESS),
                    },
                    label_anchor: Vec3::new(min_x, y - PLANK_THICKNESS * 2.0, PLANK_DEPTH / 2.0),
                }
            })
            .collect();

        let books: Vec<BookMesh> = catalog
            .books()
            .iter()
            .enumerate()
            .map(|(index, book)| BookMesh {
                book_id: book.id.clone(),
                index,
                title: book.title.clone(),
                cover_ref: book.cover_image_ref.clone(),
                base: Transform {
                    position: Vec3::from_array(book.spatial_position),
                    rotation: Vec3::from_array(book.spatial_rotation),
                    scale: 1.0,
                },
                size: BOOK_SIZE,
                accent: book.accent_color,
                front: Material::Solid(book.accent_color),
                back: Material::BackCover { book_index: index },
                edge: book.accent_color.scale(0.6),
            })
            .collect();

        let back_covers = catalog
            .books()
            .iter()
            .map(|book| {
                synthesize_back_cover(
                    &book.title,
                    book.accent_color,
                    BACK_COVER_WIDTH,
                    BACK_COVER_HEIGHT,
                )
            })
            .collect();

        Self {
            shelves,
            books,
            back_covers,
            lights: default_lights(),
        }
    }

    pub fn shelves(&self) -> &[ShelfNode] {
        &self.shelves
    }

    pub fn books(&self) -> &[BookMesh] {
        &self.books
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn back_cover(&self, book_index: usize) -> Option<&BackCover> {
        self.back_covers.get(book_index)
    }

    pub fn book(&self, id: &BookId) -> Option<&BookMesh> {
        self.books.iter().find(|mesh| &mesh.book_id == id)
    }

    /// Swaps the front material of every book using `cover_ref` to the loaded cover.
    pub fn apply_cover(&mut self, cover_ref: &str) -> usize {
        let mut upgraded = 0;
        for mesh in self.books.iter_mut().filter(|m| m.cover_ref == cover_ref) {
            mesh.front = Material::Cover {
                cover_ref: cover_ref.to_string(),
            };
            upgraded += 1;
        }
        upgraded
    }

    /// Flat Lambert shading of `base` for a surface with `normal` at `point`.
    pub fn shade(&self, base: Rgb, normal: Vec3, point: Vec3) -> Rgb {
        let normal = normal.normalize();
        let intensity: f32 = self
            .lights
            .iter()
            .map(|light| match light.kind {
                LightKind::Ambient => light.intensity,
                LightKind::Directional { direction } => {
                    normal.dot(-direction.normalize()).max(0.0) * light.intensity
                }
                LightKind::Point { position } => {
                    normal.dot((position - point).normalize()).max(0.0) * light.intensity
                }
            })
            .sum();
        base.scale(intensity.clamp(0.15, 1.25))
    }

    /// Axis-aligned bounds of everything in the scene.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        let mut include = |center: Vec3, size: Vec3| {
            let half = size * 0.5;
            min = Vec3::new(
                min.x.min(center.x - half.x),
                min.y.min(center.y - half.y),
                min.z.min(center.z - half.z),
            );
            max = Vec3::new(
                max.x.max(center.x + half.x),
                max.y.max(center.y + half.y),
                max.z.max(center.z + half.z),
            );
        };
        for shelf in &self.shelves {
            include(shelf.plank.center, shelf.plank.size);
            include(shelf.backboard.center, shelf.backboard.size);
        }
        for book in &self.books {
            include(book.base.position, book.size);
        }
        if min.x > max.x {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        (min, max)
    }
}

fn default_lights() -> Vec<Light> {
    vec![
        Light {
            kind: LightKind::Ambient,
            intensity: 0.45,
        },
        Light {
            kind: LightKind::Directional {
                direction: Vec3::new(-0.4, -0.6, -1.0),
            },
            intensity: 0.6,
        },
        Light {
            kind: LightKind::Point {
                position: Vec3::new(3.0, 6.0, 4.0),
            },
            intensity: 0.2,
        },
    ]
}
