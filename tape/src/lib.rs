//! Anaglyph ribbon sketch: a strip mesh following a random spline around the unit sphere plus a
//! field of billboards orbiting the origin, with a camera that drifts towards the pointer.
//!
//! Geometry is built once when the context is created.  After that the host calls
//! `tape_ctx_tick` from its display-refresh callback and reads back object positions and camera
//! matrices; stereo rendering itself is left to the host renderer.

pub mod animation;
pub mod config;
pub mod interface;
pub mod scene;

pub use animation::{AnimationParams, AnimationState, CameraParams, Viewport};
pub use config::TapeConfig;
pub use interface::TapeCtx;
pub use scene::{Scene, SceneObjectKind};
