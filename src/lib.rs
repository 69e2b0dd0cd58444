//! # chaos-tree
//!
//! An animated tree made of particles and instanced meshes that assembles
//! from a scattered cloud ("chaos") into a formed tree and back.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chaos_tree::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let mut scene = Scene::new(SceneConfig::for_theme(Theme::Classic));
//!     scene.gallery_mut().add(PhotoRef::from("holiday.jpg"));
//!     chaos_tree::app::run(scene)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Two positions per entity
//!
//! Every point, ornament, leaf, ribbon segment and photo card gets a chaos
//! position (uniform inside a ball) and a target position (on or around the
//! tree cone) exactly once, when it is created. Nothing re-randomizes them
//! afterwards; see [`record::EntityRecord`].
//!
//! ### Progress
//!
//! Each population keeps its own [`progress::Progress`], a value in `[0, 1]`
//! damped toward the target of the current [`progress::Mode`]. Positions are
//! blended with the eased value, so a mode flip mid-transition reverses
//! smoothly from wherever the population is.
//!
//! ### Populations
//!
//! | Population                 | Simulated | Drawn as                  |
//! |----------------------------|-----------|---------------------------|
//! | [`field::PointField`]      | shader    | camera-facing quads       |
//! | [`ornament::OrnamentField`]| CPU       | instanced meshes          |
//! | trunk, leaves, ribbon      | CPU       | instanced meshes          |
//! | [`feature::Star`]          | CPU       | single emissive mesh      |
//! | [`feature::PhotoGallery`]  | CPU       | backing, photo, ring      |
//!
//! Point fields only upload their progress each frame; the vertex shader
//! evaluates the same formula as [`field::evaluate_point`].
//!
//! ### Themes and configuration
//!
//! [`theme::Theme`] selects a full set of tables; any part can be overridden
//! from JSON via [`config::SceneConfig::from_json_file`].

extern crate self as chaos_tree;

pub mod app;
pub mod config;
pub mod distribution;
pub mod error;
pub mod feature;
pub mod field;
pub mod gpu;
pub mod mesh;
pub mod ornament;
pub mod progress;
pub mod record;
pub mod scene;
pub mod shader_utils;
pub mod spawn;
pub mod theme;
pub mod time;

pub use bytemuck;
pub use chaos_tree_derive::PointAttributes;
pub use glam::{Quat, Vec3};
pub use wgpu;

pub use error::{AppError, ConfigError, GpuError, PhotoError};
pub use scene::Scene;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::{
        Color, OrnamentFieldConfig, PointFieldConfig, PointFieldKind, SceneConfig, ShapeKind,
    };
    pub use crate::error::{AppError, ConfigError, GpuError, PhotoError};
    pub use crate::feature::{PhotoGallery, PhotoRef, Star};
    pub use crate::field::{PointField, PointLayout};
    pub use crate::ornament::{Instanced, OrnamentField};
    pub use crate::progress::{Mode, ModeSignal, Progress};
    pub use crate::scene::Scene;
    pub use crate::spawn::SpawnContext;
    pub use crate::theme::Theme;
    pub use crate::time::FrameClock;
    pub use crate::{Quat, Vec3};
    pub use chaos_tree_derive::PointAttributes;
}
