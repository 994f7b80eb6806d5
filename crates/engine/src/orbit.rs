//! Damped orbit controls around a fixed target.

use crate::camera::Camera;
use crate::math::Vec3;

const REST_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_limit: f32,
    pub fov_y: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 2.5, 0.0),
            distance: 7.5,
            azimuth: 0.0,
            polar: 1.45,
            min_distance: 4.0,
            max_distance: 12.0,
            min_polar: 0.9,
            max_polar: 1.75,
            damping: 0.12,
            rotate_speed: 0.04,
            zoom_speed: 0.08,
            pan_limit: 2.0,
            fov_y: 0.87,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Velocity {
    azimuth: f32,
    polar: f32,
    zoom: f32,
    pan: Vec3,
}

impl Velocity {
    fn is_rest(&self) -> bool {
        self.azimuth.abs() < REST_EPSILON
            && self.polar.abs() < REST_EPSILON
            && self.zoom.abs() < REST_EPSILON
            && self.pan.length() < REST_EPSILON
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: OrbitConfig,
    target: Vec3,
    distance: f32,
    azimuth: f32,
    polar: f32,
    velocity: Velocity,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig) -> Self {
        let mut controls = Self {
            config,
            target: config.target,
            distance: config.distance,
            azimuth: config.azimuth,
            polar: config.polar,
            velocity: Velocity::default(),
        };
        controls.clamp();
        controls
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    /// Adds a rotation impulse in drag units (cells or pixels).
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.velocity.azimuth -= dx * self.config.rotate_speed;
        self.velocity.polar -= dy * self.config.rotate_speed;
    }

    /// Positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        self.velocity.zoom -= steps * self.config.zoom_speed;
    }

    /// Pans in the camera's screen plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(Vec3::UP).normalize();
        let up = right.cross(forward).normalize();
        let scale = self.distance * 0.01;
        self.velocity.pan += (right * -dx + up * dy) * scale;
    }

    /// Applies pending impulses, then damps and clamps.
    pub fn update(&mut self) {
        self.azimuth += self.velocity.azimuth;
        self.polar += self.velocity.polar;
        self.distance *= self.velocity.zoom.exp();
        self.target += self.velocity.pan;

        let keep = 1.0 - self.config.damping.clamp(0.0, 1.0);
        self.velocity.azimuth *= keep;
        self.velocity.polar *= keep;
        self.velocity.zoom *= keep;
        self.velocity.pan = self.velocity.pan * keep;

        self.clamp();
        if self.velocity.is_rest() {
            self.velocity = Velocity::default();
        }
    }

    fn clamp(&mut self) {
        let cfg = &self.config;
        if self.polar <= cfg.min_polar || self.polar >= cfg.max_polar {
            self.velocity.polar = 0.0;
        }
        self.polar = self.polar.clamp(cfg.min_polar, cfg.max_polar);

        if self.distance <= cfg.min_distance || self.distance >= cfg.max_distance {
            self.velocity.zoom = 0.0;
        }
        self.distance = self.distance.clamp(cfg.min_distance, cfg.max_distance);

        self.target = self.target.clamp_around(cfg.target, cfg.pan_limit);
        self.azimuth = self.azimuth.rem_euclid(std::f32::consts::TAU);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn is_at_rest(&self) -> bool {
        self.velocity.is_rest()
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::new(self.eye(), self.target, self.config.fov_y, aspect)
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}
