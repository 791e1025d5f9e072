use std::str::FromStr;

use crate::{sampler::ControlPoint, Result, RibbonError, Vec3};

/// Consecutive control points closer than this are treated as duplicates.
const DUPLICATE_POINT_EPSILON: f32 = 1e-6;
const TANGENT_EPSILON: f32 = 1e-7;
/// Knot intervals shorter than this fall back to a fixed interval to avoid dividing by ~0.
const KNOT_INTERVAL_EPSILON: f32 = 1e-4;

/// How knot intervals are derived from the distances between control points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveType {
  /// Knot intervals are `|p_{i+1} - p_i|^0.5`.  Avoids cusps and self-intersections within a
  /// segment.
  #[default]
  Centripetal,
  /// Knot intervals are `|p_{i+1} - p_i|`.
  Chordal,
  /// Uniform knots; tangents are scaled by `CurveOptions::tension`.
  CatmullRom,
}

impl FromStr for CurveType {
  type Err = RibbonError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "centripetal" => Ok(CurveType::Centripetal),
      "chordal" => Ok(CurveType::Chordal),
      "catmullrom" => Ok(CurveType::CatmullRom),
      _ => Err(RibbonError::invalid_argument(format!(
        "unknown curve type \"{s}\"; expected one of centripetal, chordal, catmullrom"
      ))),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurveOptions {
  pub closed: bool,
  pub curve_type: CurveType,
  /// Only used by `CurveType::CatmullRom`
  pub tension: f32,
  /// Number of uniform parameter steps used to build the arc length lookup table
  pub arc_length_divisions: usize,
}

impl Default for CurveOptions {
  fn default() -> Self {
    CurveOptions {
      closed: false,
      curve_type: CurveType::Centripetal,
      tension: 0.5,
      arc_length_divisions: 200,
    }
  }
}

/// Cubic in Hermite form: `c0 + c1*t + c2*t^2 + c3*t^3` for `t` in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
struct CubicPoly {
  c0: Vec3,
  c1: Vec3,
  c2: Vec3,
  c3: Vec3,
}

impl CubicPoly {
  /// Builds the cubic that starts at `x0` with tangent `t0` and ends at `x1` with tangent `t1`.
  fn hermite(x0: Vec3, x1: Vec3, t0: Vec3, t1: Vec3) -> Self {
    CubicPoly {
      c0: x0,
      c1: t0,
      c2: -3. * x0 + 3. * x1 - 2. * t0 - t1,
      c3: 2. * x0 - 2. * x1 + t0 + t1,
    }
  }

  fn uniform(x0: Vec3, x1: Vec3, x2: Vec3, x3: Vec3, tension: f32) -> Self {
    Self::hermite(x1, x2, tension * (x2 - x0), tension * (x3 - x1))
  }

  fn non_uniform(
    x0: Vec3,
    x1: Vec3,
    x2: Vec3,
    x3: Vec3,
    dt0: f32,
    dt1: f32,
    dt2: f32,
  ) -> Self {
    // tangents for the non-uniform parametrization, rescaled to [0, 1] over the middle interval
    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;
    Self::hermite(x1, x2, t1, t2)
  }

  #[inline]
  fn eval(&self, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t3
  }

  #[inline]
  fn derivative(&self, t: f32) -> Vec3 {
    self.c1 + self.c2 * (2. * t) + self.c3 * (3. * t * t)
  }
}

/// A Catmull-Rom spline through a sequence of points, parametrized over [0, 1].
///
/// A lookup table of cumulative chord lengths is built once at construction, which is what
/// `point_at`/`tangent_at`/`sample` use to convert arc length fractions into curve parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
  points: Vec<Vec3>,
  options: CurveOptions,
  segments: Vec<CubicPoly>,
  arc_lengths: Vec<f32>,
}

fn knot_interval(a: &Vec3, b: &Vec3, exponent: f32) -> f32 {
  (b - a).norm_squared().powf(exponent)
}

impl Curve {
  pub fn new(points: &[Vec3], options: &CurveOptions) -> Result<Self> {
    if points.len() < 2 {
      return Err(RibbonError::invalid_argument(format!(
        "a curve requires at least two points, found: {}",
        points.len()
      )));
    }
    if !options.tension.is_finite() {
      return Err(RibbonError::invalid_argument(format!(
        "curve tension must be finite, found: {}",
        options.tension
      )));
    }
    if options.arc_length_divisions == 0 {
      return Err(RibbonError::invalid_argument(
        "arc length divisions must be positive",
      ));
    }
    if let Some(ix) = points.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
      return Err(RibbonError::invalid_argument(format!(
        "curve point {ix} is not finite: {:?}",
        points[ix]
      )));
    }

    let pair_count = if options.closed {
      points.len()
    } else {
      points.len() - 1
    };
    for i in 0..pair_count {
      let (a, b) = (points[i], points[(i + 1) % points.len()]);
      if (b - a).norm() < DUPLICATE_POINT_EPSILON {
        return Err(RibbonError::degenerate_curve(format!(
          "control points {i} and {} are identical: {a:?}",
          (i + 1) % points.len()
        )));
      }
    }

    let segments = (0..pair_count)
      .map(|ix| Self::build_segment(points, ix, options))
      .collect();

    let mut curve = Curve {
      points: points.to_owned(),
      options: options.clone(),
      segments,
      arc_lengths: Vec::new(),
    };
    curve.arc_lengths = curve.compute_arc_lengths(options.arc_length_divisions);

    if !(curve.length() > DUPLICATE_POINT_EPSILON) {
      return Err(RibbonError::degenerate_curve(format!(
        "curve has no length: {}",
        curve.length()
      )));
    }

    Ok(curve)
  }

  fn build_segment(points: &[Vec3], ix: usize, options: &CurveOptions) -> CubicPoly {
    let l = points.len();
    let p1 = points[ix % l];
    let p2 = points[(ix + 1) % l];

    // open curves get phantom endpoints mirrored through the first/last points
    let p0 = if options.closed || ix > 0 {
      points[(ix + l - 1) % l]
    } else {
      2. * points[0] - points[1]
    };
    let p3 = if options.closed || ix + 2 < l {
      points[(ix + 2) % l]
    } else {
      2. * points[l - 1] - points[l - 2]
    };

    let exponent = match options.curve_type {
      CurveType::Centripetal => 0.25,
      CurveType::Chordal => 0.5,
      CurveType::CatmullRom => return CubicPoly::uniform(p0, p1, p2, p3, options.tension),
    };

    let mut dt0 = knot_interval(&p0, &p1, exponent);
    let mut dt1 = knot_interval(&p1, &p2, exponent);
    let mut dt2 = knot_interval(&p2, &p3, exponent);
    if dt1 < KNOT_INTERVAL_EPSILON {
      dt1 = 1.;
    }
    if dt0 < KNOT_INTERVAL_EPSILON {
      dt0 = dt1;
    }
    if dt2 < KNOT_INTERVAL_EPSILON {
      dt2 = dt1;
    }

    CubicPoly::non_uniform(p0, p1, p2, p3, dt0, dt1, dt2)
  }

  fn compute_arc_lengths(&self, divisions: usize) -> Vec<f32> {
    let mut lengths = Vec::with_capacity(divisions + 1);
    lengths.push(0.);

    let mut last = self.point(0.);
    let mut sum = 0.;
    for i in 1..=divisions {
      let cur = self.point(i as f32 / divisions as f32);
      sum += (cur - last).norm();
      lengths.push(sum);
      last = cur;
    }
    lengths
  }

  /// Maps a global parameter in [0, 1] to `(segment index, local parameter)`.
  fn locate(&self, t: f32) -> (usize, f32) {
    let segment_count = self.segments.len();
    let p = segment_count as f32 * t.clamp(0., 1.);
    let ix = p.floor() as usize;
    if ix >= segment_count {
      // t == 1 lands at the very end of the last segment
      return (segment_count - 1, 1.);
    }
    (ix, p - ix as f32)
  }

  pub fn control_points(&self) -> &[Vec3] {
    &self.points
  }

  pub fn options(&self) -> &CurveOptions {
    &self.options
  }

  pub fn is_closed(&self) -> bool {
    self.options.closed
  }

  /// Total length as measured by the arc length lookup table.
  pub fn length(&self) -> f32 {
    self.arc_lengths.last().copied().unwrap_or(0.)
  }

  /// Point at curve parameter `t`.  Parameter spacing is not uniform in arc length.
  pub fn point(&self, t: f32) -> Vec3 {
    let (ix, local_t) = self.locate(t);
    self.segments[ix].eval(local_t)
  }

  /// Unit tangent at curve parameter `t`, taken from the analytic derivative of the segment.
  pub fn tangent(&self, t: f32) -> Result<Vec3> {
    let (ix, local_t) = self.locate(t);
    let derivative = self.segments[ix].derivative(local_t);
    let magnitude = derivative.norm();
    if !(magnitude > TANGENT_EPSILON) {
      return Err(RibbonError::degenerate_curve(format!(
        "tangent vanishes at t={t} (segment {ix}, magnitude={magnitude})"
      )));
    }
    Ok(derivative / magnitude)
  }

  /// Converts a fraction of the total arc length into a curve parameter.
  pub fn u_to_t(&self, u: f32) -> f32 {
    let lengths = &self.arc_lengths;
    let last_ix = lengths.len() - 1;
    let target = u.clamp(0., 1.) * lengths[last_ix];

    // largest index with `lengths[i] <= target`; lengths[0] == 0 so there always is one
    let i = lengths
      .partition_point(|&len| len <= target)
      .saturating_sub(1);
    if i >= last_ix || lengths[i] == target {
      return i.min(last_ix) as f32 / last_ix as f32;
    }

    let before = lengths[i];
    let after = lengths[i + 1];
    let fraction = (target - before) / (after - before);
    (i as f32 + fraction) / last_ix as f32
  }

  pub fn point_at(&self, u: f32) -> Vec3 {
    self.point(self.u_to_t(u))
  }

  pub fn tangent_at(&self, u: f32) -> Result<Vec3> {
    self.tangent(self.u_to_t(u))
  }

  /// Returns `segment_count + 1` points spaced evenly by arc length, including both endpoints.
  pub fn sample(&self, segment_count: usize) -> Result<Vec<Vec3>> {
    if segment_count == 0 {
      return Err(RibbonError::invalid_argument(
        "segment count must be positive",
      ));
    }

    Ok(
      (0..=segment_count)
        .map(|i| self.point_at(i as f32 / segment_count as f32))
        .collect(),
    )
  }
}

/// Builds an open centripetal curve through `points` in order.
pub fn build_curve(points: &[ControlPoint]) -> Result<Curve> {
  let positions: Vec<Vec3> = points.iter().map(ControlPoint::position).collect();
  Curve::new(&positions, &CurveOptions::default())
}
