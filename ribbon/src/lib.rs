//! Builds ribbon-shaped strip meshes that follow a smooth spline through points on the unit
//! sphere.
//!
//! The pipeline is:
//!
//! 1. [`sampler`]: control points on the unit sphere
//! 2. [`spline`]: Catmull-Rom curve through them, re-sampled at equal arc length
//! 3. [`frames`]: tangent/normal/binormal frames propagated along the samples
//! 4. [`extrude`]: cross-section offsets pushed out along each frame into a vertex grid

use std::fmt;

pub mod extrude;
pub mod frames;
pub mod sampler;
pub mod spline;

pub use extrude::{extrude, strip_offsets, CrossSectionOffset, RibbonGrid, RibbonMesh};
pub use frames::{propagate_frames, Frame};
pub use sampler::{sample_control_points, spherical_control_points, ControlPoint};
pub use spline::{build_curve, Curve, CurveOptions, CurveType};

pub type Vec3 = nalgebra::Vector3<f32>;
pub type Vec2 = nalgebra::Vector2<f32>;

#[derive(Clone, Debug, PartialEq)]
pub enum RibbonError {
  InvalidArgument(String),
  DegenerateCurve(String),
}

impl RibbonError {
  #[cold]
  pub fn invalid_argument(msg: impl Into<String>) -> Self {
    RibbonError::InvalidArgument(msg.into())
  }

  #[cold]
  pub fn degenerate_curve(msg: impl Into<String>) -> Self {
    RibbonError::DegenerateCurve(msg.into())
  }

  pub fn message(&self) -> &str {
    match self {
      RibbonError::InvalidArgument(msg) | RibbonError::DegenerateCurve(msg) => msg,
    }
  }
}

impl fmt::Display for RibbonError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RibbonError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
      RibbonError::DegenerateCurve(msg) => write!(f, "degenerate curve: {msg}"),
    }
  }
}

impl std::error::Error for RibbonError {}

pub type Result<T> = std::result::Result<T, RibbonError>;

/// Everything needed to turn a set of control points into a ribbon.
#[derive(Clone, Debug)]
pub struct RibbonParams {
  pub curve: CurveOptions,
  pub segment_count: usize,
  pub offsets: Vec<CrossSectionOffset>,
  /// Always `true` for the tape sketch.  This smooths out the twist between the first and last
  /// frames even though the curve itself is open; it is not a topological closure.
  pub closed_frames: bool,
}

impl Default for RibbonParams {
  fn default() -> Self {
    RibbonParams {
      curve: CurveOptions::default(),
      segment_count: 500,
      offsets: strip_offsets(extrude::DEFAULT_HALF_WIDTH),
      closed_frames: true,
    }
  }
}

/// The outputs of every stage of the pipeline, kept together so callers can draw the
/// centerline alongside the ribbon itself.
#[derive(Clone, Debug)]
pub struct RibbonGeometry {
  pub curve: Curve,
  pub samples: Vec<Vec3>,
  pub frames: Vec<Frame>,
  pub grid: RibbonGrid,
}

pub fn build_ribbon(points: &[ControlPoint], params: &RibbonParams) -> Result<RibbonGeometry> {
  let positions: Vec<Vec3> = points.iter().map(ControlPoint::position).collect();
  let curve = Curve::new(&positions, &params.curve)?;
  let samples = curve.sample(params.segment_count)?;
  let frames = curve.compute_frames(params.segment_count, params.closed_frames)?;
  let grid = extrude(&samples, &frames, &params.offsets)?;

  log::info!(
    "Built ribbon from {} control points; curve length={:.4}, segments={}, grid={}x{}",
    points.len(),
    curve.length(),
    params.segment_count,
    grid.rows(),
    grid.cols()
  );

  Ok(RibbonGeometry {
    curve,
    samples,
    frames,
    grid,
  })
}
