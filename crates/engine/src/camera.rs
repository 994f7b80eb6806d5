//! Perspective projection into normalised device coordinates and picking.

use folio_core::BookId;

use crate::math::Vec3;
use crate::pose::Pose;
use crate::scene::SceneGraph;

pub const NEAR_PLANE: f32 = 0.1;

/// A point in normalised device coordinates; `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

pub type Point2 = (f32, f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedBox {
    pub corners: [Projected; 8],
    pub hull: Vec<Point2>,
    /// Face at local +z, counter-clockwise from bottom-left.
    pub front: [Point2; 4],
    /// Face at local -z, same corner order as `front`.
    pub back: [Point2; 4],
    pub front_facing: bool,
    pub depth: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::UP,
            fov_y,
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
            near: NEAR_PLANE,
        }
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }

    /// Projects a world point; `None` when it lies in front of the near plane.
    pub fn project(&self, point: Vec3) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let rel = point - self.eye;
        let depth = rel.dot(forward);
        if depth < self.near {
            return None;
        }
        let half = (self.fov_y / 2.0).tan();
        Some(Projected {
            x: rel.dot(right) / (depth * half * self.aspect),
            y: rel.dot(up) / (depth * half),
            depth,
        })
    }

    /// Projects a box of `size` posed by `pose`; `None` if any corner is clipped.
    pub fn project_box(&self, pose: &Pose, size: Vec3) -> Option<ProjectedBox> {
        let half = size * (0.5 * pose.scale);
        let mut corners = [Projected {
            x: 0.0,
            y: 0.0,
            depth: 0.0,
        }; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            let local = Vec3::new(sign(1) * half.x, sign(2) * half.y, sign(4) * half.z);
            *corner = self.project(pose.position + local.rotate_euler(pose.rotation))?;
        }

        let flat = |i: usize| (corners[i].x, corners[i].y);
        let normal = Vec3::new(0.0, 0.0, 1.0).rotate_euler(pose.rotation);
        let front_center = pose.position + normal * half.z;
        let depth = corners.iter().map(|c| c.depth).sum::<f32>() / 8.0;

        Some(ProjectedBox {
            corners,
            hull: convex_hull(&corners.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>()),
            front: [flat(4), flat(5), flat(7), flat(6)],
            back: [flat(0), flat(1), flat(3), flat(2)],
            front_facing: normal.dot(self.eye - front_center) > 0.0,
            depth,
        })
    }
}

fn cross2(o: Point2, a: Point2, b: Point2) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Andrew's monotone chain; counter-clockwise, no repeated end point.
pub fn convex_hull(points: &[Point2]) -> Vec<Point2> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point2>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2 && cross2(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}

/// Even-odd ray casting test.
pub fn point_in_polygon(polygon: &[Point2], point: Point2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > point.1) != (yj > point.1) {
            let x_cross = (xj - xi) * (point.1 - yi) / (yj - yi) + xi;
            if point.0 < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Texture coordinates of `point` inside a face quad (`u` left to right, `v` top to bottom).
pub fn quad_uv(quad: &[Point2; 4], point: Point2) -> Option<(f32, f32)> {
    let [bl, br, tr, tl] = *quad;
    let barycentric = |a: Point2, b: Point2, c: Point2| -> Option<(f32, f32, f32)> {
        let det = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
        if det.abs() < f32::EPSILON {
            return None;
        }
        let wa = ((b.1 - c.1) * (point.0 - c.0) + (c.0 - b.0) * (point.1 - c.1)) / det;
        let wb = ((c.1 - a.1) * (point.0 - c.0) + (a.0 - c.0) * (point.1 - c.1)) / det;
        let wc = 1.0 - wa - wb;
        let tol = -1e-3;
        (wa >= tol && wb >= tol && wc >= tol).then_some((wa, wb, wc))
    };

    if let Some((wa, wb, wc)) = barycentric(bl, br, tr) {
        let u = wb + wc;
        let v = wa + wb;
        return Some((u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)));
    }
    barycentric(bl, tr, tl).map(|(wa, wb, _)| (wb.clamp(0.0, 1.0), wa.clamp(0.0, 1.0)))
}

/// Nearest book whose projected silhouette contains `point` (NDC).
pub fn pick(scene: &SceneGraph, poses: &[Pose], camera: &Camera, point: Point2) -> Option<BookId> {
    scene
        .books()
        .iter()
        .zip(poses)
        .filter_map(|(mesh, pose)| {
            let projected = camera.project_box(pose, mesh.size)?;
            point_in_polygon(&projected.hull, point).then_some((projected.depth, &mesh.book_id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id.clone())
}
