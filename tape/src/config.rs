use nanoserde::DeJson;
use ribbon::{CrossSectionOffset, CurveOptions, CurveType, RibbonError, RibbonParams, Vec2};

use crate::animation::{AnimationParams, CameraParams};

/// Shape of the JSON the host passes in.  Every field is optional; anything left out falls back
/// to `TapeConfig::default()`.
#[derive(DeJson, Default)]
struct RawTapeConfig {
  #[nserde(default)]
  control_point_count: Option<usize>,
  #[nserde(default)]
  segment_count: Option<usize>,
  // [[x, y], ...]
  #[nserde(default)]
  ribbon_offsets: Option<Vec<Vec<f32>>>,
  #[nserde(default)]
  curve_type: Option<String>,
  #[nserde(default)]
  tension: Option<f32>,
  #[nserde(default)]
  closed_curve: Option<bool>,
  #[nserde(default)]
  closed_frames: Option<bool>,
  #[nserde(default)]
  arc_length_divisions: Option<usize>,
  #[nserde(default)]
  billboard_count: Option<usize>,
  #[nserde(default)]
  billboard_width: Option<f32>,
  #[nserde(default)]
  billboard_height: Option<f32>,
  #[nserde(default)]
  orbit_radius: Option<f32>,
  #[nserde(default)]
  phase_multiplier: Option<f32>,
  #[nserde(default)]
  time_scale: Option<f64>,
  #[nserde(default)]
  camera_fov_degrees: Option<f32>,
  #[nserde(default)]
  camera_near: Option<f32>,
  #[nserde(default)]
  camera_far: Option<f32>,
  #[nserde(default)]
  camera_z: Option<f32>,
  #[nserde(default)]
  camera_ease: Option<f32>,
  #[nserde(default)]
  pointer_divisor: Option<f32>,
  #[nserde(default)]
  seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TapeConfig {
  pub control_point_count: usize,
  pub segment_count: usize,
  pub ribbon_offsets: Vec<CrossSectionOffset>,
  pub curve_type: CurveType,
  pub tension: f32,
  pub closed_curve: bool,
  pub closed_frames: bool,
  pub arc_length_divisions: usize,
  pub billboard_count: usize,
  pub billboard_width: f32,
  pub billboard_height: f32,
  pub animation: AnimationParams,
  pub camera: CameraParams,
  /// `None` draws a fresh seed from the platform entropy source
  pub seed: Option<u64>,
}

impl Default for TapeConfig {
  fn default() -> Self {
    let ribbon = RibbonParams::default();
    TapeConfig {
      control_point_count: 7,
      segment_count: ribbon.segment_count,
      ribbon_offsets: ribbon.offsets,
      curve_type: ribbon.curve.curve_type,
      tension: ribbon.curve.tension,
      closed_curve: ribbon.curve.closed,
      closed_frames: ribbon.closed_frames,
      arc_length_divisions: ribbon.curve.arc_length_divisions,
      billboard_count: 500,
      billboard_width: 0.1,
      billboard_height: 0.4,
      animation: AnimationParams::default(),
      camera: CameraParams::default(),
      seed: None,
    }
  }
}

fn parse_offsets(raw: Vec<Vec<f32>>) -> Result<Vec<CrossSectionOffset>, RibbonError> {
  raw
    .into_iter()
    .enumerate()
    .map(|(ix, pair)| match pair.as_slice() {
      [x, y] => Ok(Vec2::new(*x, *y)),
      _ => Err(RibbonError::invalid_argument(format!(
        "ribbon offset {ix} must be an [x, y] pair, found {} values",
        pair.len()
      ))),
    })
    .collect()
}

impl TapeConfig {
  pub fn from_json(json: &str) -> Result<Self, RibbonError> {
    if json.trim().is_empty() {
      return Ok(TapeConfig::default());
    }

    let raw = RawTapeConfig::deserialize_json(json)
      .map_err(|err| RibbonError::invalid_argument(format!("invalid tape config: {err:?}")))?;
    let defaults = TapeConfig::default();
    let animation_defaults = defaults.animation;
    let camera_defaults = defaults.camera;

    let config = TapeConfig {
      control_point_count: raw
        .control_point_count
        .unwrap_or(defaults.control_point_count),
      segment_count: raw.segment_count.unwrap_or(defaults.segment_count),
      ribbon_offsets: match raw.ribbon_offsets {
        Some(offsets) => parse_offsets(offsets)?,
        None => defaults.ribbon_offsets,
      },
      curve_type: match raw.curve_type {
        Some(name) => name.parse()?,
        None => defaults.curve_type,
      },
      tension: raw.tension.unwrap_or(defaults.tension),
      closed_curve: raw.closed_curve.unwrap_or(defaults.closed_curve),
      closed_frames: raw.closed_frames.unwrap_or(defaults.closed_frames),
      arc_length_divisions: raw
        .arc_length_divisions
        .unwrap_or(defaults.arc_length_divisions),
      billboard_count: raw.billboard_count.unwrap_or(defaults.billboard_count),
      billboard_width: raw.billboard_width.unwrap_or(defaults.billboard_width),
      billboard_height: raw.billboard_height.unwrap_or(defaults.billboard_height),
      animation: AnimationParams {
        orbit_radius: raw.orbit_radius.unwrap_or(animation_defaults.orbit_radius),
        phase_multiplier: raw
          .phase_multiplier
          .unwrap_or(animation_defaults.phase_multiplier),
        time_scale: raw.time_scale.unwrap_or(animation_defaults.time_scale),
        camera_ease: raw.camera_ease.unwrap_or(animation_defaults.camera_ease),
        pointer_divisor: raw
          .pointer_divisor
          .unwrap_or(animation_defaults.pointer_divisor),
      },
      camera: CameraParams {
        fov_degrees: raw.camera_fov_degrees.unwrap_or(camera_defaults.fov_degrees),
        near: raw.camera_near.unwrap_or(camera_defaults.near),
        far: raw.camera_far.unwrap_or(camera_defaults.far),
        z: raw.camera_z.unwrap_or(camera_defaults.z),
      },
      seed: raw.seed.or(defaults.seed),
    };
    config.validated()
  }

  fn validated(mut self) -> Result<Self, RibbonError> {
    let ease = self.animation.camera_ease;
    if !(0.0..=1.0).contains(&ease) {
      let clamped = if ease.is_nan() { 0. } else { ease.clamp(0., 1.) };
      log::warn!("camera_ease={ease} is outside of [0, 1]; clamping to {clamped}");
      self.animation.camera_ease = clamped;
    }

    if !self.tension.is_finite() {
      return Err(RibbonError::invalid_argument(format!(
        "tension must be finite, found {}",
        self.tension
      )));
    }
    if !(self.animation.pointer_divisor.abs() > 0.) {
      return Err(RibbonError::invalid_argument(
        "pointer_divisor must be non-zero",
      ));
    }
    let camera = &self.camera;
    if !(camera.near > 0. && camera.far > camera.near) {
      return Err(RibbonError::invalid_argument(format!(
        "camera clip planes must satisfy 0 < near < far, found near={} far={}",
        camera.near, camera.far
      )));
    }
    if !(camera.fov_degrees > 0. && camera.fov_degrees < 180.) {
      return Err(RibbonError::invalid_argument(format!(
        "camera fov must be in (0, 180) degrees, found {}",
        camera.fov_degrees
      )));
    }
    if !(self.billboard_width > 0. && self.billboard_height > 0.) {
      return Err(RibbonError::invalid_argument(format!(
        "billboard dimensions must be positive, found {}x{}",
        self.billboard_width, self.billboard_height
      )));
    }

    Ok(self)
  }

  pub fn ribbon_params(&self) -> RibbonParams {
    RibbonParams {
      curve: CurveOptions {
        closed: self.closed_curve,
        curve_type: self.curve_type,
        tension: self.tension,
        arc_length_divisions: self.arc_length_divisions,
      },
      segment_count: self.segment_count,
      offsets: self.ribbon_offsets.clone(),
      closed_frames: self.closed_frames,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_is_default() {
    let config = TapeConfig::from_json("").unwrap();
    assert_eq!(config, TapeConfig::default());
    assert_eq!(TapeConfig::from_json("{}").unwrap(), TapeConfig::default());

    assert_eq!(config.control_point_count, 7);
    assert_eq!(config.segment_count, 500);
    assert_eq!(
      config.ribbon_offsets,
      vec![Vec2::new(0., 0.1), Vec2::new(0., -0.1)]
    );
    assert_eq!(config.curve_type, CurveType::Centripetal);
    assert!(!config.closed_curve);
    assert!(config.closed_frames);
    assert_eq!(config.billboard_count, 500);
    assert_eq!(config.seed, None);
  }

  #[test]
  fn test_overrides() {
    let config = TapeConfig::from_json(
      r#"{
        "control_point_count": 9,
        "segment_count": 64,
        "ribbon_offsets": [[0.0, 0.25], [0.5, 0.0], [0.0, -0.25]],
        "curve_type": "chordal",
        "billboard_count": 12,
        "orbit_radius": 3.5,
        "camera_z": 4.0,
        "seed": 42
      }"#,
    )
    .unwrap();

    assert_eq!(config.control_point_count, 9);
    assert_eq!(config.segment_count, 64);
    assert_eq!(config.ribbon_offsets.len(), 3);
    assert_eq!(config.ribbon_offsets[1], Vec2::new(0.5, 0.));
    assert_eq!(config.curve_type, CurveType::Chordal);
    assert_eq!(config.billboard_count, 12);
    assert_eq!(config.animation.orbit_radius, 3.5);
    assert_eq!(config.camera.z, 4.);
    assert_eq!(config.seed, Some(42));
    // untouched fields keep their defaults
    assert_eq!(config.animation.phase_multiplier, 1.1);

    let params = config.ribbon_params();
    assert_eq!(params.segment_count, 64);
    assert_eq!(params.curve.curve_type, CurveType::Chordal);
    assert!(params.closed_frames);
  }

  #[test]
  fn test_invalid_configs() {
    for json in [
      "{not json",
      r#"{"ribbon_offsets": [[0.0, 0.1, 0.2]]}"#,
      r#"{"curve_type": "bezier"}"#,
      r#"{"pointer_divisor": 0.0}"#,
      r#"{"camera_near": 2.0, "camera_far": 1.0}"#,
      r#"{"billboard_width": -1.0}"#,
      r#"{"tension": 1e39}"#,
    ] {
      let err = TapeConfig::from_json(json).unwrap_err();
      assert!(matches!(err, RibbonError::InvalidArgument(_)), "{json}: {err}");
    }
  }

  #[test]
  fn test_camera_ease_is_clamped() {
    let config = TapeConfig::from_json(r#"{"camera_ease": 4.0}"#).unwrap();
    assert_eq!(config.animation.camera_ease, 1.);
  }
}
