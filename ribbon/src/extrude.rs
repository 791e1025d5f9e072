use crate::{frames::Frame, Result, RibbonError, Vec2, Vec3};

pub const DEFAULT_HALF_WIDTH: f32 = 0.1;

/// `x` units along the local normal and `y` units along the local binormal.
pub type CrossSectionOffset = Vec2;

/// Two offsets straddling the curve along the binormal, giving a flat double-sided strip of
/// `2 * half_width`.
pub fn strip_offsets(half_width: f32) -> Vec<CrossSectionOffset> {
  vec![Vec2::new(0., half_width), Vec2::new(0., -half_width)]
}

/// Row-major grid of vertices: one row per cross-section offset, one column per curve sample.
///
/// Mesh winding is derived from this ordering, so rows and columns must not be swapped.
#[derive(Clone, Debug, PartialEq)]
pub struct RibbonGrid {
  rows: usize,
  cols: usize,
  vertices: Vec<Vec3>,
}

impl RibbonGrid {
  pub fn new(rows: usize, cols: usize, vertices: Vec<Vec3>) -> Result<Self> {
    if rows == 0 || cols == 0 {
      return Err(RibbonError::invalid_argument(format!(
        "grid dimensions must be positive, found {rows}x{cols}"
      )));
    }
    if vertices.len() != rows * cols {
      return Err(RibbonError::invalid_argument(format!(
        "expected {} vertices for a {rows}x{cols} grid, found {}",
        rows * cols,
        vertices.len()
      )));
    }

    Ok(RibbonGrid {
      rows,
      cols,
      vertices,
    })
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn vertices(&self) -> &[Vec3] {
    &self.vertices
  }

  pub fn vertex(&self, row: usize, col: usize) -> Vec3 {
    self.vertices[row * self.cols + col]
  }

  pub fn row(&self, row: usize) -> &[Vec3] {
    &self.vertices[row * self.cols..(row + 1) * self.cols]
  }

  pub fn to_position_buffer(&self) -> Vec<f32> {
    self.vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
  }

  /// Triangulates the grid the same way a plane geometry with `cols - 1` width segments and
  /// `rows - 1` height segments is triangulated.  A single-row grid has no faces.
  pub fn to_mesh(&self) -> RibbonMesh {
    let (rows, cols) = (self.rows, self.cols);
    if rows < 2 || cols < 2 {
      log::warn!("Ribbon grid is {rows}x{cols}; no faces will be generated");
    }

    let u_denom = cols.saturating_sub(1).max(1) as f32;
    let v_denom = rows.saturating_sub(1).max(1) as f32;
    let mut uvs = Vec::with_capacity(rows * cols * 2);
    for row in 0..rows {
      for col in 0..cols {
        uvs.push(col as f32 / u_denom);
        uvs.push(1. - row as f32 / v_denom);
      }
    }

    let quad_count = rows.saturating_sub(1) * cols.saturating_sub(1);
    let mut indices: Vec<u32> = Vec::with_capacity(quad_count * 6);
    for row in 0..rows.saturating_sub(1) {
      for col in 0..cols.saturating_sub(1) {
        let a = (col + cols * row) as u32;
        let b = (col + cols * (row + 1)) as u32;
        let c = ((col + 1) + cols * (row + 1)) as u32;
        let d = ((col + 1) + cols * row) as u32;

        indices.push(a);
        indices.push(b);
        indices.push(d);

        indices.push(b);
        indices.push(c);
        indices.push(d);
      }
    }

    RibbonMesh {
      rows,
      cols,
      positions: self.to_position_buffer(),
      uvs,
      indices,
    }
  }
}

/// Flat buffers ready to hand to a renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RibbonMesh {
  pub rows: usize,
  pub cols: usize,
  pub positions: Vec<f32>,
  pub uvs: Vec<f32>,
  pub indices: Vec<u32>,
}

/// For each offset (in order), for each sample (in order):
/// `samples[i] + frames[i].normal * offset.x + frames[i].binormal * offset.y`.
pub fn extrude(
  samples: &[Vec3],
  frames: &[Frame],
  offsets: &[CrossSectionOffset],
) -> Result<RibbonGrid> {
  if offsets.is_empty() {
    return Err(RibbonError::invalid_argument(
      "at least one cross-section offset is required",
    ));
  }
  if let Some(ix) = offsets.iter().position(|o| !o.iter().all(|c| c.is_finite())) {
    return Err(RibbonError::invalid_argument(format!(
      "cross-section offset {ix} is not finite: {:?}",
      offsets[ix]
    )));
  }
  if samples.is_empty() {
    return Err(RibbonError::invalid_argument(
      "at least one curve sample is required",
    ));
  }
  if samples.len() != frames.len() {
    return Err(RibbonError::invalid_argument(format!(
      "sample count ({}) does not match frame count ({})",
      samples.len(),
      frames.len()
    )));
  }

  let mut vertices = Vec::with_capacity(offsets.len() * samples.len());
  for offset in offsets {
    for (sample, frame) in samples.iter().zip(frames) {
      vertices.push(sample + frame.offset(offset));
    }
  }

  RibbonGrid::new(offsets.len(), samples.len(), vertices)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{sampler::sample_control_points, spline::build_curve};

  fn random_curve_samples(segment_count: usize) -> (Vec<Vec3>, Vec<Frame>) {
    let mut rng = common::build_rng((8938, 7827385782));
    let points = sample_control_points(7, &mut rng).unwrap();
    let curve = build_curve(&points).unwrap();
    (
      curve.sample(segment_count).unwrap(),
      curve.compute_frames(segment_count, true).unwrap(),
    )
  }

  #[test]
  fn test_zero_offset_reproduces_curve() {
    let (samples, frames) = random_curve_samples(100);
    let grid = extrude(&samples, &frames, &[Vec2::new(0., 0.)]).unwrap();
    assert_eq!(grid.rows(), 1);
    assert_eq!(grid.cols(), 101);
    assert_eq!(grid.vertices(), &samples[..]);
  }

  #[test]
  fn test_strip_is_symmetric() {
    let h = 0.1;
    let (samples, frames) = random_curve_samples(500);
    let grid = extrude(&samples, &frames, &strip_offsets(h)).unwrap();
    assert_eq!((grid.rows(), grid.cols()), (2, 501));

    for (col, sample) in samples.iter().enumerate() {
      let top = grid.vertex(0, col);
      let bottom = grid.vertex(1, col);
      assert!(((top - sample).norm() - h).abs() < 1e-5);
      assert!(((bottom - sample).norm() - h).abs() < 1e-5);
      assert!(((top - bottom).norm() - 2. * h).abs() < 1e-5);
      assert!(((top + bottom) * 0.5 - sample).norm() < 1e-5);
      // displaced along the binormal, i.e. perpendicular to the direction of travel
      assert!((top - sample).dot(&frames[col].tangent).abs() < 1e-5);
    }
  }

  #[test]
  fn test_row_order_follows_offsets() {
    let (samples, frames) = random_curve_samples(10);
    let offsets = vec![
      Vec2::new(0.05, 0.),
      Vec2::new(0., 0.05),
      Vec2::new(-0.05, 0.),
    ];
    let grid = extrude(&samples, &frames, &offsets).unwrap();
    assert_eq!(grid.rows(), 3);
    for (row, offset) in offsets.iter().enumerate() {
      for col in 0..samples.len() {
        let expected =
          samples[col] + frames[col].normal * offset.x + frames[col].binormal * offset.y;
        assert!((grid.vertex(row, col) - expected).norm() < 1e-6);
      }
      assert_eq!(grid.row(row).len(), samples.len());
    }
  }

  #[test]
  fn test_rejects_bad_input() {
    let (samples, frames) = random_curve_samples(10);
    assert!(matches!(
      extrude(&samples, &frames, &[]),
      Err(RibbonError::InvalidArgument(_))
    ));
    assert!(matches!(
      extrude(&samples[1..], &frames, &strip_offsets(0.1)),
      Err(RibbonError::InvalidArgument(_))
    ));
    assert!(RibbonGrid::new(2, 2, vec![Vec3::zeros(); 3]).is_err());
  }

  #[test]
  fn test_rejects_non_finite_offsets() {
    let (samples, frames) = random_curve_samples(10);
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
      for offsets in [
        vec![Vec2::new(bad, 0.), Vec2::new(0., 0.)],
        vec![Vec2::new(0., 0.1), Vec2::new(0., bad)],
      ] {
        assert!(matches!(
          extrude(&samples, &frames, &offsets),
          Err(RibbonError::InvalidArgument(_))
        ));
      }
    }
  }

  #[test]
  fn test_mesh_indexing() {
    let vertices = vec![
      Vec3::new(0., 1., 0.),
      Vec3::new(1., 1., 0.),
      Vec3::new(2., 1., 0.),
      Vec3::new(0., 0., 0.),
      Vec3::new(1., 0., 0.),
      Vec3::new(2., 0., 0.),
    ];
    let mesh = RibbonGrid::new(2, 3, vertices).unwrap().to_mesh();
    assert_eq!(mesh.positions.len(), 18);
    assert_eq!(mesh.indices, vec![0, 3, 1, 3, 4, 1, 1, 4, 2, 4, 5, 2]);
    assert_eq!(
      mesh.uvs,
      vec![0., 1., 0.5, 1., 1., 1., 0., 0., 0.5, 0., 1., 0.]
    );
  }

  #[test]
  fn test_single_row_mesh_has_no_faces() {
    let (samples, frames) = random_curve_samples(10);
    let mesh = extrude(&samples, &frames, &[Vec2::zeros()]).unwrap().to_mesh();
    assert!(mesh.indices.is_empty());
    assert_eq!(mesh.positions.len(), 11 * 3);
  }
}
