use std::f32::consts::PI;

use rand::Rng;

use crate::{Result, RibbonError, Vec3};

/// Polar angles are drawn from `[POLAR_BAND_START, POLAR_BAND_START + POLAR_BAND_WIDTH)`, which
/// keeps control points away from both poles.
pub const POLAR_BAND_START: f32 = PI / 6.;
pub const POLAR_BAND_WIDTH: f32 = PI * (2. / 3.);

/// A point on a sphere centered at the origin.
///
/// `polar` is measured from the +Y axis and `azimuth` is measured around Y starting from +Z, the
/// same convention three.js uses for `Vector3.setFromSphericalCoords`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
  radius: f32,
  polar: f32,
  azimuth: f32,
  position: Vec3,
}

impl ControlPoint {
  pub fn from_spherical(radius: f32, polar: f32, azimuth: f32) -> Self {
    let (sin_polar, cos_polar) = polar.sin_cos();
    let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();
    let position = Vec3::new(
      radius * sin_polar * sin_azimuth,
      radius * cos_polar,
      radius * sin_polar * cos_azimuth,
    );

    ControlPoint {
      radius,
      polar,
      azimuth,
      position,
    }
  }

  pub fn radius(&self) -> f32 {
    self.radius
  }

  pub fn polar(&self) -> f32 {
    self.polar
  }

  pub fn azimuth(&self) -> f32 {
    self.azimuth
  }

  pub fn position(&self) -> Vec3 {
    self.position
  }
}

/// Places `count` points on the unit sphere with azimuths evenly spaced over a full turn.  The
/// polar angle for each index is provided by `polar_angle`.
///
/// Output order is the order the curve will pass through the points.
pub fn spherical_control_points(
  count: usize,
  mut polar_angle: impl FnMut(usize) -> f32,
) -> Result<Vec<ControlPoint>> {
  if count < 2 {
    return Err(RibbonError::invalid_argument(format!(
      "at least two control points are needed to build a curve, found: {count}"
    )));
  }

  Ok(
    (0..count)
      .map(|i| {
        let azimuth = (i as f32 / count as f32) * PI * 2.;
        ControlPoint::from_spherical(1., polar_angle(i), azimuth)
      })
      .collect(),
  )
}

pub fn sample_control_points(count: usize, rng: &mut impl Rng) -> Result<Vec<ControlPoint>> {
  spherical_control_points(count, |_| {
    rng.gen::<f32>() * POLAR_BAND_WIDTH + POLAR_BAND_START
  })
}
