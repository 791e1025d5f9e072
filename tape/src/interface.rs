use nalgebra::Matrix4;
use ribbon::RibbonError;
use wasm_bindgen::prelude::*;

use crate::{
  animation::{AnimationState, Viewport},
  config::TapeConfig,
  scene::Scene,
};

static mut DID_INIT: bool = false;

fn maybe_init() {
  unsafe {
    if DID_INIT {
      return;
    }
    DID_INIT = true;
  }

  console_error_panic_hook::set_once();
  wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Owns everything the sketch needs between frames.  Created by `create_tape_ctx` and released
/// by `free_tape_ctx`; the host holds the pointer.
pub struct TapeCtx {
  config: TapeConfig,
  scene: Scene,
  state: AnimationState,
  last_tick_ms: Option<f64>,
}

impl TapeCtx {
  pub fn new(config: TapeConfig, viewport: Viewport) -> Result<Self, RibbonError> {
    let mut rng = match config.seed {
      Some(seed) => common::build_rng_from_u64(seed),
      None => common::build_entropy_rng(),
    };
    let scene = Scene::compose(&config, &mut rng)?;
    let state = AnimationState::new(config.camera.z, viewport);

    let mut ctx = TapeCtx {
      config,
      scene,
      state,
      last_tick_ms: None,
    };
    ctx.scene.update_object_positions(&ctx.state, &ctx.config.animation);
    Ok(ctx)
  }

  pub fn config(&self) -> &TapeConfig {
    &self.config
  }

  pub fn scene(&self) -> &Scene {
    &self.scene
  }

  pub fn state(&self) -> &AnimationState {
    &self.state
  }

  /// `now_ms` is the host's wall-clock time.  The first tick jumps the clock straight to it so
  /// the oscillation phase matches what a `Date.now()`-driven loop would produce.
  pub fn tick(&mut self, now_ms: f64) {
    let prev_ms = self.last_tick_ms.unwrap_or(self.state.elapsed_ms);
    self.last_tick_ms = Some(now_ms);

    self.state = self.state.advance(now_ms - prev_ms, &self.config.animation);
    self
      .scene
      .update_object_positions(&self.state, &self.config.animation);
  }

  pub fn pointer_move(&mut self, client_x: f32, client_y: f32) {
    self.state = self
      .state
      .with_pointer(client_x, client_y, &self.config.animation);
  }

  pub fn resize(&mut self, width: f32, height: f32) {
    self.state = self.state.resized(Viewport::new(width, height));
  }

  pub fn view_matrix(&self) -> Matrix4<f32> {
    self.state.view_matrix()
  }

  pub fn projection_matrix(&self) -> Matrix4<f32> {
    self.config.camera.projection_matrix(&self.state.viewport)
  }
}

#[wasm_bindgen]
pub fn create_tape_ctx(
  config_json: &str,
  viewport_width: f32,
  viewport_height: f32,
) -> Result<*mut TapeCtx, JsValue> {
  maybe_init();

  let ctx = TapeConfig::from_json(config_json)
    .and_then(|config| TapeCtx::new(config, Viewport::new(viewport_width, viewport_height)));
  match ctx {
    Ok(ctx) => Ok(Box::into_raw(Box::new(ctx))),
    Err(err) => {
      log::error!("Failed to build tape scene: {err}");
      Err(JsValue::from_str(&err.to_string()))
    }
  }
}

#[wasm_bindgen]
pub fn free_tape_ctx(ctx: *mut TapeCtx) {
  if ctx.is_null() {
    return;
  }
  drop(unsafe { Box::from_raw(ctx) });
}

#[wasm_bindgen]
pub fn tape_ctx_tick(ctx: *mut TapeCtx, now_ms: f64) {
  let ctx = unsafe { &mut *ctx };
  ctx.tick(now_ms);
}

#[wasm_bindgen]
pub fn tape_ctx_pointer_move(ctx: *mut TapeCtx, client_x: f32, client_y: f32) {
  let ctx = unsafe { &mut *ctx };
  ctx.pointer_move(client_x, client_y);
}

#[wasm_bindgen]
pub fn tape_ctx_resize(ctx: *mut TapeCtx, width: f32, height: f32) {
  let ctx = unsafe { &mut *ctx };
  ctx.resize(width, height);
}

#[wasm_bindgen]
pub fn tape_ctx_get_ribbon_positions(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.ribbon_mesh.positions.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_ribbon_uvs(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.ribbon_mesh.uvs.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_ribbon_indices(ctx: *const TapeCtx) -> Vec<u32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.ribbon_mesh.indices.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_centerline_positions(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.centerline.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_billboard_positions(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.billboard_mesh.positions.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_billboard_uvs(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.billboard_mesh.uvs.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_get_billboard_indices(ctx: *const TapeCtx) -> Vec<u32> {
  let ctx = unsafe { &*ctx };
  ctx.scene.billboard_mesh.indices.clone()
}

#[wasm_bindgen]
pub fn tape_ctx_object_count(ctx: *const TapeCtx) -> usize {
  let ctx = unsafe { &*ctx };
  ctx.scene.object_count()
}

/// Pointer into wasm memory holding `3 * object_count` floats.  Rewritten on every tick, so the
/// host should read it right after `tape_ctx_tick`.
#[wasm_bindgen]
pub fn tape_ctx_get_object_positions(ctx: *const TapeCtx) -> *const f32 {
  let ctx = unsafe { &*ctx };
  ctx.scene.object_positions().as_ptr()
}

#[wasm_bindgen]
pub fn tape_ctx_get_camera_position(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  let camera = ctx.state.camera;
  vec![camera.x, camera.y, camera.z]
}

/// Column-major
#[wasm_bindgen]
pub fn tape_ctx_get_view_matrix(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.view_matrix().as_slice().to_owned()
}

/// Column-major
#[wasm_bindgen]
pub fn tape_ctx_get_projection_matrix(ctx: *const TapeCtx) -> Vec<f32> {
  let ctx = unsafe { &*ctx };
  ctx.projection_matrix().as_slice().to_owned()
}
