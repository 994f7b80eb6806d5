use folio_core::Rgb;
use image::{ImageBuffer, Rgba, RgbaImage};

pub const BACK_COVER_WIDTH: u32 = 36;
pub const BACK_COVER_HEIGHT: u32 = 52;

/// Locally generated rear face: a vertical gradient with the title on top.
#[derive(Debug, Clone)]
pub struct BackCover {
    pub title: String,
    pub top: Rgb,
    pub bottom: Rgb,
    pub image: RgbaImage,
}

impl BackCover {
    /// Gradient colour at `v` (0 = top, 1 = bottom).
    pub fn color_at(&self, v: f32) -> Rgb {
        self.top.lerp(self.bottom, v)
    }
}

pub fn synthesize_back_cover(title: &str, accent: Rgb, width: u32, height: u32) -> BackCover {
    let width = width.max(1);
    let height = height.max(1);
    let top = accent.lerp(Rgb(255, 255, 255), 0.18);
    let bottom = accent.scale(0.35);
    let span = (height - 1).max(1) as f32;

    let image: RgbaImage = ImageBuffer::from_fn(width, height, |_, y| {
        let Rgb(r, g, b) = top.lerp(bottom, y as f32 / span);
        Rgba([r, g, b, 255])
    });

    BackCover {
        title: title.trim().to_string(),
        top,
        bottom,
        image,
    }
}
