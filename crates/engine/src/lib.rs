//! Scene model for the 3D bookshelf: geometry, animation, camera and textures.

use std::sync::Arc;

use folio_core::{AssetSource, BookId, Catalog};

mod back_cover;
mod camera;
mod covers;
mod fetch;
mod math;
mod orbit;
mod pose;
mod scene;

pub use back_cover::{BACK_COVER_HEIGHT, BACK_COVER_WIDTH, BackCover, synthesize_back_cover};
pub use camera::{
    Camera, NEAR_PLANE, Point2, Projected, ProjectedBox, convex_hull, pick, point_in_polygon,
    quad_uv,
};
pub use covers::{CoverEvent, CoverImage, CoverLoader, CoverState};
pub use fetch::TextFetcher;
pub use math::Vec3;
pub use orbit::{OrbitConfig, OrbitControls};
pub use pose::{
    EASE_PER_FRAME, HOVER_LIFT, HOVER_SCALE, HOVER_TILT, PHASE_STEP, Pose, PoseAnimator,
    ease_toward, frame_factor, target_pose,
};
pub use scene::{
    BOOK_SIZE, BoxGeometry, BookMesh, Light, LightKind, Material, SHELF_SPACING, SceneGraph,
    ShelfNode, Transform, shelf_y,
};

/// Everything the scene view needs per frame, owned by the UI thread.
#[derive(Debug)]
pub struct ShelfEngine {
    scene: SceneGraph,
    animator: PoseAnimator,
    orbit: OrbitControls,
    covers: CoverLoader,
}

impl ShelfEngine {
    pub fn new(catalog: &Catalog, source: Arc<dyn AssetSource>) -> Self {
        let scene = SceneGraph::build(catalog);
        let animator = PoseAnimator::new(&scene);
        let mut covers = CoverLoader::new(source);
        let started = covers.request_catalog(catalog);
        log::info!(
            "scene built: {} shelves, {} books, {started} cover fetches",
            scene.shelves().len(),
            scene.books().len()
        );
        Self {
            scene,
            animator,
            orbit: OrbitControls::default(),
            covers,
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.animator.set_reduced_motion(reduced);
    }

    /// Advances one frame: applies finished covers, orbit damping and book easing.
    pub fn tick(&mut self, dt: f32, hovered: Option<&BookId>) -> Vec<CoverEvent> {
        let events = self.covers.poll();
        for event in events.iter().filter(|event| event.loaded) {
            self.scene.apply_cover(&event.reference);
        }
        self.orbit.update();
        self.animator.tick(&self.scene, dt, hovered);
        events
    }

    pub fn camera(&self, aspect: f32) -> Camera {
        self.orbit.camera(aspect)
    }

    pub fn pick(&self, point: Point2, aspect: f32) -> Option<BookId> {
        pick(&self.scene, self.animator.poses(), &self.camera(aspect), point)
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn poses(&self) -> &[Pose] {
        self.animator.poses()
    }

    /// Seconds of animation clock advanced so far.
    pub fn time(&self) -> f32 {
        self.animator.time()
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    pub fn covers(&self) -> &CoverLoader {
        &self.covers
    }

    pub fn covers_mut(&mut self) -> &mut CoverLoader {
        &mut self.covers
    }
}
