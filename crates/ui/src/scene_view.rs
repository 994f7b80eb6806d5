//! Software rasteriser for the 3D shelf, drawn with half-block cells.

use folio_core::{BookId, Rgb};
use folio_engine::{
    BoxGeometry, Camera, Material, Point2, Pose, SceneGraph, ShelfEngine, Vec3,
    point_in_polygon, quad_uv,
};
use image::{Rgba, RgbaImage};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

use crate::theme::{contrast_text, rgb};

/// Terminal cells are roughly twice as tall as wide; half blocks make pixels square.
pub(crate) fn aspect_for(area: Rect) -> f32 {
    if area.height == 0 {
        return 1.0;
    }
    f32::from(area.width) / (f32::from(area.height) * 2.0)
}

/// Maps a terminal cell inside `area` to normalised device coordinates.
pub(crate) fn cell_to_ndc(area: Rect, column: u16, row: u16) -> Option<Point2> {
    if area.width == 0
        || area.height == 0
        || column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }
    let px = f32::from(column - area.x) + 0.5;
    let py = f32::from(row - area.y) * 2.0 + 1.0;
    let w = f32::from(area.width);
    let h = f32::from(area.height) * 2.0;
    Some((px / w * 2.0 - 1.0, 1.0 - py / h * 2.0))
}

struct Raster {
    image: RgbaImage,
}

impl Raster {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        let Rgb(r, g, b) = background;
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([r, g, b, 255])),
        }
    }

    fn ndc_to_px(&self, point: Point2) -> (f32, f32) {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;
        ((point.0 + 1.0) / 2.0 * w, (1.0 - point.1) / 2.0 * h)
    }

    fn px_to_ndc(&self, x: u32, y: u32) -> Point2 {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;
        (
            (x as f32 + 0.5) / w * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / h * 2.0,
        )
    }

    /// Fills `polygon` (NDC), colouring each covered pixel with `shade(point)`.
    fn fill(&mut self, polygon: &[Point2], mut shade: impl FnMut(Point2) -> Rgb) {
        if polygon.len() < 3 {
            return;
        }
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &p in polygon {
            let (x, y) = self.ndc_to_px(p);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let w = self.image.width();
        let h = self.image.height();
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(w);
        let y1 = (max_y.ceil().max(0.0) as u32).min(h);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = self.px_to_ndc(x, y);
                if point_in_polygon(polygon, p) {
                    let Rgb(r, g, b) = shade(p);
                    self.image.put_pixel(x, y, Rgba([r, g, b, 255]));
                }
            }
        }
    }
}

fn box_pose(geometry: &BoxGeometry) -> Pose {
    Pose {
        position: geometry.center,
        rotation: Vec3::ZERO,
        scale: 1.0,
    }
}

fn draw_box(raster: &mut Raster, scene: &SceneGraph, camera: &Camera, pose: &Pose, size: Vec3, color: Rgb) {
    let Some(projected) = camera.project_box(pose, size) else {
        return;
    };
    let side = scene.shade(color.scale(0.8), Vec3::new(0.0, 1.0, 0.0), pose.position);
    raster.fill(&projected.hull, |_| side);
    let face = scene.shade(color, Vec3::new(0.0, 0.0, 1.0), pose.position);
    raster.fill(&projected.front, |_| face);
}

/// Rasterises shelves and books back to front at `width` x `height` pixels.
pub(crate) fn rasterize(
    engine: &ShelfEngine,
    camera: &Camera,
    width: u32,
    height: u32,
    background: Rgb,
) -> RgbaImage {
    let scene = engine.scene();
    let covers = engine.covers();
    let mut raster = Raster::new(width, height, background);

    for shelf in scene.shelves() {
        let board = shelf.accent.lerp(background, 0.55);
        draw_box(&mut raster, scene, camera, &box_pose(&shelf.backboard), shelf.backboard.size, board);
    }
    for shelf in scene.shelves() {
        let wood = shelf.accent.scale(0.7);
        draw_box(&mut raster, scene, camera, &box_pose(&shelf.plank), shelf.plank.size, wood);
    }

    let mut order: Vec<(f32, usize)> = scene
        .books()
        .iter()
        .zip(engine.poses())
        .enumerate()
        .filter_map(|(i, (mesh, pose))| {
            camera
                .project_box(pose, mesh.size)
                .map(|projected| (projected.depth, i))
        })
        .collect();
    order.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (_, i) in order {
        let (mesh, pose) = (&scene.books()[i], &engine.poses()[i]);
        let Some(projected) = camera.project_box(pose, mesh.size) else {
            continue;
        };
        let normal = Vec3::new(0.0, 0.0, 1.0).rotate_euler(pose.rotation);
        let edge = scene.shade(mesh.edge, Vec3::new(1.0, 0.0, 0.0).rotate_euler(pose.rotation), pose.position);
        raster.fill(&projected.hull, |_| edge);

        if projected.front_facing {
            let quad = projected.front;
            let lit = |color: Rgb| scene.shade(color, normal, pose.position);
            match &mesh.front {
                Material::Cover { cover_ref } => {
                    if let Some(cover) = covers.image(cover_ref) {
                        raster.fill(&quad, |p| {
                            let (u, v) = quad_uv(&quad, p).unwrap_or((0.5, 0.5));
                            lit(cover.sample(u, v))
                        });
                    } else {
                        let flat = lit(mesh.accent);
                        raster.fill(&quad, |_| flat);
                    }
                }
                Material::Solid(color) => {
                    let flat = lit(*color);
                    raster.fill(&quad, |_| flat);
                }
                Material::BackCover { .. } => {}
            }
        } else {
            let quad = projected.back;
            let lit = |color: Rgb| scene.shade(color, -normal, pose.position);
            if let Material::BackCover { book_index } = mesh.back
                && let Some(back) = scene.back_cover(book_index)
            {
                raster.fill(&quad, |p| {
                    let (_, v) = quad_uv(&quad, p).unwrap_or((0.5, 0.5));
                    lit(back.color_at(v))
                });
            } else {
                let flat = lit(mesh.accent.scale(0.5));
                raster.fill(&quad, |_| flat);
            }
        }
    }

    raster.image
}

/// Screen cell of a world point, if it lands inside `area`.
fn world_to_cell(camera: &Camera, area: Rect, point: Vec3) -> Option<(u16, u16)> {
    let p = camera.project(point)?;
    if !(-1.0..=1.0).contains(&p.x) || !(-1.0..=1.0).contains(&p.y) {
        return None;
    }
    let col = ((p.x + 1.0) / 2.0 * f32::from(area.width)).floor() as u16;
    let row = ((1.0 - p.y) / 2.0 * f32::from(area.height)).floor() as u16;
    Some((
        area.x + col.min(area.width.saturating_sub(1)),
        area.y + row.min(area.height.saturating_sub(1)),
    ))
}

/// The 3D shelf widget for one frame.
pub(crate) struct SceneCanvas<'a> {
    pub engine: &'a ShelfEngine,
    pub hovered: Option<&'a BookId>,
    pub background: Rgb,
    pub label_style: Style,
}

impl Widget for SceneCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let camera = self.engine.camera(aspect_for(area));
        let image = rasterize(
            self.engine,
            &camera,
            u32::from(area.width),
            u32::from(area.height) * 2,
            self.background,
        );
        blit_half_blocks(&image, area, buf);

        for shelf in self.engine.scene().shelves() {
            if let Some((x, y)) = world_to_cell(&camera, area, shelf.label_anchor) {
                let max = usize::from(area.x + area.width - x);
                buf.set_stringn(
                    x,
                    y,
                    &shelf.category,
                    max,
                    self.label_style.fg(rgb(shelf.accent)).add_modifier(Modifier::BOLD),
                );
            }
        }

        if let Some(mesh) = self.hovered.and_then(|id| self.engine.scene().book(id))
            && let Some(pose) = self.engine.poses().get(mesh.index)
        {
            let above = pose.position + Vec3::new(0.0, mesh.size.y * pose.scale * 0.5 + 0.15, 0.0);
            if let Some((x, y)) = world_to_cell(&camera, area, above) {
                let title = format!(" {} ", mesh.title);
                let width = title.chars().count() as u16;
                let x = x.saturating_sub(width / 2).max(area.x);
                let max = usize::from(area.x + area.width - x);
                buf.set_stringn(
                    x,
                    y,
                    &title,
                    max,
                    Style::default()
                        .fg(contrast_text(mesh.accent))
                        .bg(rgb(mesh.accent))
                        .add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}

fn blit_half_blocks(image: &RgbaImage, area: Rect, buf: &mut Buffer) {
    for row in 0..area.height {
        for col in 0..area.width {
            let x = u32::from(col);
            let top = image.get_pixel(x, u32::from(row) * 2);
            let bottom = image.get_pixel(x, u32::from(row) * 2 + 1);
            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                cell.set_char('▀')
                    .set_fg(Color::Rgb(top[0], top[1], top[2]))
                    .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{AssetSource, Catalog, FetchError};
    use std::sync::Arc;

    struct Empty;

    impl AssetSource for Empty {
        fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::NotFound(reference.to_string()))
        }
    }

    fn engine() -> ShelfEngine {
        ShelfEngine::new(&Catalog::builtin().unwrap(), Arc::new(Empty))
    }

    #[test]
    fn cell_mapping_covers_the_area() {
        let area = Rect::new(10, 5, 20, 10);
        let (x, y) = cell_to_ndc(area, 10, 5).unwrap();
        assert!(x < -0.9 && y > 0.9);
        let (x, y) = cell_to_ndc(area, 29, 14).unwrap();
        assert!(x > 0.9 && y < -0.9);
        assert!(cell_to_ndc(area, 30, 5).is_none());
        assert!(cell_to_ndc(area, 9, 5).is_none());
        assert_eq!(aspect_for(area), 1.0);
    }

    #[test]
    fn books_are_painted_over_the_background() {
        let engine = engine();
        let camera = engine.camera(1.0);
        let background = Rgb(0, 0, 0);
        let image = rasterize(&engine, &camera, 80, 80, background);

        let mesh = &engine.scene().books()[0];
        let centre = camera.project(engine.poses()[0].position).unwrap();
        let px = ((centre.x + 1.0) / 2.0 * 80.0) as u32;
        let py = ((1.0 - centre.y) / 2.0 * 80.0) as u32;
        let pixel = image.get_pixel(px, py);
        assert_ne!(Rgb(pixel[0], pixel[1], pixel[2]), background);
        assert_ne!(mesh.accent, background);

        let corner = image.get_pixel(0, 0);
        assert_eq!(Rgb(corner[0], corner[1], corner[2]), background);
    }

    #[test]
    fn widget_renders_shelf_labels() {
        let engine = engine();
        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);
        SceneCanvas {
            engine: &engine,
            hovered: None,
            background: Rgb(0, 0, 0),
            label_style: Style::default(),
        }
        .render(area, &mut buf);

        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Systems"));
        assert!(text.contains("Fiction"));
    }
}
