use common::rand::Rng;
use ribbon::{
  build_ribbon, sample_control_points, ControlPoint, RibbonError, RibbonGeometry, RibbonGrid,
  RibbonMesh, Vec3,
};

use crate::{
  animation::{AnimationParams, AnimationState},
  config::TapeConfig,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneObjectKind {
  Ribbon,
  Billboard,
}

/// Static geometry for the sketch plus the per-object positions the animator writes each tick.
///
/// The ribbon is animated object 0 and billboards follow at indices `1..=billboard_count`, so
/// the ribbon drifts around along with the billboards.
pub struct Scene {
  pub ribbon: RibbonGeometry,
  pub ribbon_mesh: RibbonMesh,
  /// Line strip through the curve samples
  pub centerline: Vec<f32>,
  /// Shared by every billboard
  pub billboard_mesh: RibbonMesh,
  objects: Vec<SceneObjectKind>,
  object_positions: Vec<f32>,
}

/// A `width` x `height` quad in the XY plane centered on the origin, built as a 2x2 grid so it
/// shares winding and UV layout with the ribbon.
fn build_billboard_mesh(width: f32, height: f32) -> Result<RibbonMesh, RibbonError> {
  let (hw, hh) = (width / 2., height / 2.);
  let grid = RibbonGrid::new(
    2,
    2,
    vec![
      Vec3::new(-hw, hh, 0.),
      Vec3::new(hw, hh, 0.),
      Vec3::new(-hw, -hh, 0.),
      Vec3::new(hw, -hh, 0.),
    ],
  )?;
  Ok(grid.to_mesh())
}

impl Scene {
  pub fn compose(config: &TapeConfig, rng: &mut impl Rng) -> Result<Self, RibbonError> {
    let points = sample_control_points(config.control_point_count, rng)?;
    Self::from_control_points(config, &points)
  }

  pub fn from_control_points(
    config: &TapeConfig,
    points: &[ControlPoint],
  ) -> Result<Self, RibbonError> {
    let ribbon = build_ribbon(points, &config.ribbon_params())?;
    let ribbon_mesh = ribbon.grid.to_mesh();
    let centerline = ribbon
      .samples
      .iter()
      .flat_map(|p| [p.x, p.y, p.z])
      .collect();
    let billboard_mesh = build_billboard_mesh(config.billboard_width, config.billboard_height)?;

    let mut objects = Vec::with_capacity(config.billboard_count + 1);
    objects.push(SceneObjectKind::Ribbon);
    objects.extend(std::iter::repeat(SceneObjectKind::Billboard).take(config.billboard_count));
    let object_positions = vec![0.; objects.len() * 3];

    log::info!(
      "Composed tape scene with {} animated objects ({} billboards)",
      objects.len(),
      config.billboard_count
    );

    Ok(Scene {
      ribbon,
      ribbon_mesh,
      centerline,
      billboard_mesh,
      objects,
      object_positions,
    })
  }

  pub fn objects(&self) -> &[SceneObjectKind] {
    &self.objects
  }

  pub fn object_count(&self) -> usize {
    self.objects.len()
  }

  /// Flat `[x, y, z, x, y, z, ...]` positions, one triple per animated object.
  pub fn object_positions(&self) -> &[f32] {
    &self.object_positions
  }

  pub fn update_object_positions(&mut self, state: &AnimationState, params: &AnimationParams) {
    for (ix, out) in self.object_positions.chunks_exact_mut(3).enumerate() {
      let pos = state.object_position(ix, params);
      out.copy_from_slice(&[pos.x, pos.y, pos.z]);
    }
  }
}
