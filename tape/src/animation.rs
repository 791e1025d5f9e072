use std::f64::consts::TAU;

use nalgebra::{Matrix4, Perspective3, Point3};
use ribbon::{Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationParams {
  /// Radius of the circle each animated object oscillates around
  pub orbit_radius: f32,
  /// Per-object phase multiplier applied to the y oscillation
  pub phase_multiplier: f32,
  /// Converts elapsed milliseconds into oscillation phase
  pub time_scale: f64,
  /// Fraction of the remaining distance to the pointer target the camera covers each tick
  pub camera_ease: f32,
  /// Pointer offsets from the viewport center are divided by this
  pub pointer_divisor: f32,
}

impl Default for AnimationParams {
  fn default() -> Self {
    AnimationParams {
      orbit_radius: 5.,
      phase_multiplier: 1.1,
      time_scale: 0.0001,
      camera_ease: 0.05,
      pointer_divisor: 100.,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
  pub fov_degrees: f32,
  pub near: f32,
  pub far: f32,
  /// Initial distance of the camera from the origin along +Z
  pub z: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    CameraParams {
      fov_degrees: 60.,
      near: 0.01,
      far: 100.,
      z: 3.,
    }
  }
}

impl CameraParams {
  pub fn projection_matrix(&self, viewport: &Viewport) -> Matrix4<f32> {
    Perspective3::new(
      viewport.aspect(),
      self.fov_degrees.to_radians(),
      self.near,
      self.far,
    )
    .to_homogeneous()
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
  pub width: f32,
  pub height: f32,
}

impl Viewport {
  /// Zero-sized dimensions (e.g. a hidden window) are treated as 2px to keep the aspect ratio
  /// finite.
  pub fn new(width: f32, height: f32) -> Self {
    let sanitize = |dim: f32| if dim > 0. { dim } else { 2. };
    Viewport {
      width: sanitize(width),
      height: sanitize(height),
    }
  }

  pub fn half_width(&self) -> f32 {
    self.width / 2.
  }

  pub fn half_height(&self) -> f32 {
    self.height / 2.
  }

  pub fn aspect(&self) -> f32 {
    self.width / self.height
  }
}

/// Everything that changes from frame to frame.  Geometry is static and lives in `Scene`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
  pub elapsed_ms: f64,
  pub camera: Vec3,
  /// Pointer offset from the viewport center, already scaled by `pointer_divisor`
  pub pointer: Vec2,
  pub viewport: Viewport,
}

impl AnimationState {
  pub fn new(camera_z: f32, viewport: Viewport) -> Self {
    AnimationState {
      elapsed_ms: 0.,
      camera: Vec3::new(0., 0., camera_z),
      pointer: Vec2::zeros(),
      viewport,
    }
  }

  /// Advances the clock by `dt_ms` and eases the camera one step towards the pointer target.
  /// Pointer-down moves the camera up, so the y target is negated.
  pub fn advance(self, dt_ms: f64, params: &AnimationParams) -> Self {
    let mut camera = self.camera;
    camera.x += (self.pointer.x - camera.x) * params.camera_ease;
    camera.y += (-self.pointer.y - camera.y) * params.camera_ease;

    AnimationState {
      elapsed_ms: self.elapsed_ms + dt_ms.max(0.),
      camera,
      ..self
    }
  }

  pub fn with_pointer(self, client_x: f32, client_y: f32, params: &AnimationParams) -> Self {
    AnimationState {
      pointer: Vec2::new(
        (client_x - self.viewport.half_width()) / params.pointer_divisor,
        (client_y - self.viewport.half_height()) / params.pointer_divisor,
      ),
      ..self
    }
  }

  pub fn resized(self, viewport: Viewport) -> Self {
    AnimationState { viewport, ..self }
  }

  /// Oscillation phase, wrapped into [0, 2pi).  Wall-clock milliseconds are far too large to
  /// feed through `f32` trig directly.
  pub fn phase(&self, params: &AnimationParams) -> f64 {
    (self.elapsed_ms * params.time_scale).rem_euclid(TAU)
  }

  pub fn object_position(&self, ix: usize, params: &AnimationParams) -> Vec3 {
    let t = self.phase(params);
    let radius = params.orbit_radius as f64;
    let i = ix as f64;
    Vec3::new(
      (radius * (t + i).cos()) as f32,
      (radius * (t + i * params.phase_multiplier as f64).sin()) as f32,
      0.,
    )
  }

  /// View matrix for a camera at `self.camera` looking at the origin.
  pub fn view_matrix(&self) -> Matrix4<f32> {
    Matrix4::look_at_rh(
      &Point3::from(self.camera),
      &Point3::origin(),
      &Vec3::y(),
    )
  }
}
