use nalgebra::{Rotation3, Unit};

use crate::{spline::Curve, Result, RibbonError, Vec2, Vec3};

const TANGENT_EPSILON: f32 = 1e-7;

/// Right-handed orthonormal basis attached to a point on a curve; `binormal = tangent x normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
  pub tangent: Vec3,
  pub normal: Vec3,
  pub binormal: Vec3,
}

impl Frame {
  /// Picks the world axis along which the tangent has the smallest component and
  /// orthogonalizes it against the tangent to get the initial normal.
  pub fn seed(tangent: Vec3) -> Self {
    let (tx, ty, tz) = (tangent.x.abs(), tangent.y.abs(), tangent.z.abs());
    let mut min = f32::MAX;
    let mut axis = Vec3::x();
    if tx <= min {
      min = tx;
      axis = Vec3::x();
    }
    if ty <= min {
      min = ty;
      axis = Vec3::y();
    }
    if tz <= min {
      axis = Vec3::z();
    }

    let side = tangent.cross(&axis).normalize();
    let normal = tangent.cross(&side);
    Frame {
      tangent,
      normal,
      binormal: tangent.cross(&normal),
    }
  }

  /// Moves this frame onto a new unit tangent by applying the smallest rotation that takes the
  /// old tangent to the new one.  This keeps the normal from spinning around the curve from one
  /// sample to the next.
  pub fn transport(&self, tangent: Vec3) -> Self {
    let axis = self.tangent.cross(&tangent);
    let mut normal = self.normal;
    if axis.norm() > f32::EPSILON {
      let theta = self.tangent.dot(&tangent).clamp(-1., 1.).acos();
      let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), theta);
      normal = rotation * normal;
    }

    // re-project onto the plane perpendicular to the new tangent so rounding error doesn't pile
    // up over hundreds of steps
    let normal = (normal - tangent * tangent.dot(&normal)).normalize();
    Frame {
      tangent,
      normal,
      binormal: tangent.cross(&normal),
    }
  }

  /// Rotates the normal and binormal about the tangent by `angle` radians.
  pub fn twisted(&self, angle: f32) -> Self {
    let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(self.tangent), angle);
    let normal = rotation * self.normal;
    Frame {
      tangent: self.tangent,
      normal,
      binormal: self.tangent.cross(&normal),
    }
  }

  /// Maps a cross-section offset (x along the normal, y along the binormal) into world space
  /// relative to the frame's origin.
  #[inline]
  pub fn offset(&self, offset: &Vec2) -> Vec3 {
    self.normal * offset.x + self.binormal * offset.y
  }
}

fn normalize_tangent(tangent: &Vec3, ix: usize) -> Result<Vec3> {
  let magnitude = tangent.norm();
  if !(magnitude > TANGENT_EPSILON) {
    return Err(RibbonError::degenerate_curve(format!(
      "zero-length tangent at sample {ix}: {tangent:?}"
    )));
  }
  Ok(tangent / magnitude)
}

/// Builds one frame per tangent by transporting a seed frame along the sequence.
///
/// When `closed` is set, the leftover twist between the first and last normals is measured and
/// unwound gradually across all of the frames so they meet up at the seam.  This is applied
/// regardless of whether the underlying curve actually closes.
pub fn propagate_frames(tangents: &[Vec3], closed: bool) -> Result<Vec<Frame>> {
  let Some(first) = tangents.first() else {
    return Err(RibbonError::invalid_argument(
      "at least one tangent is needed to build frames",
    ));
  };

  let mut frames = Vec::with_capacity(tangents.len());
  frames.push(Frame::seed(normalize_tangent(first, 0)?));
  for (ix, tangent) in tangents.iter().enumerate().skip(1) {
    let tangent = normalize_tangent(tangent, ix)?;
    let next = frames[ix - 1].transport(tangent);
    frames.push(next);
  }

  if closed && frames.len() > 1 {
    let segment_count = frames.len() - 1;
    let first = frames[0];
    let last_normal = frames[segment_count].normal;

    let mut theta = first.normal.dot(&last_normal).clamp(-1., 1.).acos() / segment_count as f32;
    if first.tangent.dot(&first.normal.cross(&last_normal)) > 0. {
      theta = -theta;
    }

    for (ix, frame) in frames.iter_mut().enumerate().skip(1) {
      *frame = frame.twisted(theta * ix as f32);
    }
  }

  Ok(frames)
}

impl Curve {
  /// Computes `segment_count + 1` frames, aligned 1:1 with `Curve::sample(segment_count)`.
  pub fn compute_frames(&self, segment_count: usize, closed: bool) -> Result<Vec<Frame>> {
    if segment_count == 0 {
      return Err(RibbonError::invalid_argument(
        "segment count must be positive",
      ));
    }

    let tangents = (0..=segment_count)
      .map(|i| self.tangent_at(i as f32 / segment_count as f32))
      .collect::<Result<Vec<_>>>()?;
    propagate_frames(&tangents, closed)
  }
}

#[cfg(test)]
mod tests {
  use std::f32::consts::PI;

  use super::*;
  use crate::{
    sampler::sample_control_points,
    spline::{build_curve, CurveOptions},
  };

  const TOLERANCE: f32 = 1e-4;

  fn assert_orthonormal(frame: &Frame, ix: usize) {
    for v in [frame.tangent, frame.normal, frame.binormal] {
      assert!((v.norm() - 1.).abs() < TOLERANCE, "frame {ix} not unit: {frame:?}");
    }
    assert!(frame.tangent.dot(&frame.normal).abs() < TOLERANCE, "frame {ix}: {frame:?}");
    assert!(frame.tangent.dot(&frame.binormal).abs() < TOLERANCE, "frame {ix}: {frame:?}");
    assert!(frame.normal.dot(&frame.binormal).abs() < TOLERANCE, "frame {ix}: {frame:?}");
    // right-handed
    assert!((frame.tangent.cross(&frame.normal) - frame.binormal).norm() < TOLERANCE);
  }

  #[test]
  fn test_frames_orthonormal_on_random_curves() {
    let mut rng = common::build_rng((89538, 382173857842));
    for _ in 0..10 {
      let points = sample_control_points(7, &mut rng).unwrap();
      let curve = build_curve(&points).unwrap();
      for closed in [false, true] {
        let frames = curve.compute_frames(500, closed).unwrap();
        assert_eq!(frames.len(), 501);
        for (ix, frame) in frames.iter().enumerate() {
          assert_orthonormal(frame, ix);
        }
      }
    }
  }

  #[test]
  fn test_frames_align_with_samples() {
    let mut rng = common::build_rng((11, 12));
    let points = sample_control_points(4, &mut rng).unwrap();
    let curve = build_curve(&points).unwrap();
    for segment_count in [1, 3, 64] {
      let samples = curve.sample(segment_count).unwrap();
      let frames = curve.compute_frames(segment_count, true).unwrap();
      assert_eq!(samples.len(), frames.len());
    }
    assert!(matches!(
      curve.compute_frames(0, true),
      Err(RibbonError::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_no_flips_between_neighbors() {
    let mut rng = common::build_rng((21, 22));
    for _ in 0..10 {
      let points = sample_control_points(7, &mut rng).unwrap();
      let curve = build_curve(&points).unwrap();
      let frames = curve.compute_frames(500, true).unwrap();

      for (ix, pair) in frames.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        let tangent_turn = a.tangent.dot(&b.tangent).clamp(-1., 1.).acos();
        let normal_turn = a.normal.dot(&b.normal).clamp(-1., 1.).acos();
        // the normal only turns as much as the tangent does, plus a small share of the seam
        // correction
        assert!(
          normal_turn <= tangent_turn + 0.05,
          "sample {ix}: normal turned {normal_turn} while tangent turned {tangent_turn}"
        );
      }
    }
  }

  #[test]
  fn test_straight_line_frames_are_constant() {
    let tangents = vec![Vec3::new(0., 0., 1.); 20];
    let frames = propagate_frames(&tangents, true).unwrap();
    for frame in &frames {
      assert_eq!(frame.tangent, Vec3::new(0., 0., 1.));
      assert!((frame.normal - frames[0].normal).norm() < 1e-6);
      assert!((frame.binormal - frames[0].binormal).norm() < 1e-6);
    }
  }

  #[test]
  fn test_seed_frame_axes() {
    // smallest component is y, so the normal is derived from the y axis
    let frame = Frame::seed(Vec3::new(0.8, 0., 0.6));
    assert!((frame.normal - Vec3::new(0., -1., 0.)).norm() < 1e-6);
    assert!((frame.binormal - Vec3::new(0.6, 0., -0.8)).norm() < 1e-6);

    // ties go to the later axis
    let frame = Frame::seed(Vec3::new(0., 1., 0.));
    assert!((frame.normal - Vec3::new(0., 0., -1.)).norm() < 1e-6);
  }

  #[test]
  fn test_transport_around_circle() {
    // tangents of a circle in the XZ plane; the normal should stay parallel to Y throughout
    let steps = 64;
    let tangents: Vec<Vec3> = (0..=steps)
      .map(|i| {
        let angle = 0.5 + i as f32 / steps as f32 * PI * 2.;
        Vec3::new(angle.cos(), 0., -angle.sin())
      })
      .collect();
    let frames = propagate_frames(&tangents, false).unwrap();
    for frame in &frames {
      assert!((frame.normal.y.abs() - 1.).abs() < 1e-4, "{frame:?}");
    }
  }

  #[test]
  fn test_closed_frames_meet_at_seam() {
    let points: Vec<Vec3> = (0..6)
      .map(|i| {
        let angle = i as f32 / 6. * PI * 2.;
        Vec3::new(angle.cos(), (angle * 2.).sin() * 0.4, angle.sin())
      })
      .collect();
    let curve = Curve::new(
      &points,
      &CurveOptions {
        closed: true,
        ..CurveOptions::default()
      },
    )
    .unwrap();

    let frames = curve.compute_frames(300, true).unwrap();
    let first = frames.first().unwrap();
    let last = frames.last().unwrap();
    assert!((first.tangent - last.tangent).norm() < 1e-3);
    assert!(first.normal.dot(&last.normal) > 0.999, "{first:?} vs {last:?}");
  }

  #[test]
  fn test_zero_tangent_is_degenerate() {
    let tangents = vec![
      Vec3::new(1., 0., 0.),
      Vec3::new(0., 0., 0.),
      Vec3::new(1., 0., 0.),
    ];
    assert!(matches!(
      propagate_frames(&tangents, true),
      Err(RibbonError::DegenerateCurve(_))
    ));
    assert!(matches!(
      propagate_frames(&[], true),
      Err(RibbonError::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_frame_offset() {
    let frame = Frame::seed(Vec3::new(1., 0., 0.));
    let offset = frame.offset(&Vec2::new(2., 3.));
    assert!((offset - (frame.normal * 2. + frame.binormal * 3.)).norm() < 1e-6);
    assert!(offset.dot(&frame.tangent).abs() < 1e-6);
  }
}
