//! Cue-based animation control for skinned glTF models.
//!
//! An [`AnimatedModel`] owns one loaded asset: its scene graph, the ordered
//! clip table and a private [`AnimationMixer`]. Gameplay code drives it with
//! a handful of calls inside the frame loop:
//!
//! ```rust,no_run
//! use cue_model::{AnimatedModel, GltfLoader};
//!
//! # async fn run() -> cue_model::Result<()> {
//! let loader = GltfLoader::new("assets");
//! let mut hero = AnimatedModel::load_from(&loader, "Astronaut.glb", std::f32::consts::FRAC_PI_2).await?;
//! hero.cue(10, true, 0.0)?;
//!
//! // Clones animate on their own skeleton.
//! let mut twin = hero.duplicate()?;
//! twin.cue(0, true, 0.0)?;
//!
//! // once per frame
//! hero.cue(9, false, 0.1)?;
//! hero.advance(1.0 / 60.0)?;
//! twin.advance(1.0 / 60.0)?;
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod controller;
pub mod error;
pub mod loader;
pub mod locomotion;
pub mod math;
pub mod scene;
pub mod skinning;

pub use animation::{AnimationClip, AnimationMixer, LoopMode, MixerEvent, PlaybackState};
pub use controller::{AnimatedModel, ModelRoot, duplicate_animatable};
pub use error::{LoadError, ModelError, Result};
pub use loader::{AssetLoader, GltfLoader, LoadedAsset, parse_gltf};
pub use locomotion::{Buttons, InputState, LocomotionDriver, LocomotionProfile};
pub use math::Aabb;
pub use scene::{SceneGraph, SceneNode, Transform};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
