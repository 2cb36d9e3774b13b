//! Clip playback and blending
//!
//! This module provides everything between an immutable clip table and the
//! node transforms of one model instance:
//! - Clip and track definitions
//! - Keyframe interpolation (step, linear, cubic spline)
//! - Per-clip actions with loop modes and weight fades
//! - A mixer that blends all weighted actions into a pose
//! - The derived playback state reported to gameplay code
//!
//! # Example
//!
//! ```rust,ignore
//! use cue_model::animation::{AnimationMixer, LoopMode};
//!
//! let mut mixer = AnimationMixer::new(clips, &graph)?;
//!
//! // Crossfade into clip 2 over a fifth of a second
//! mixer.crossfade_to(2, LoopMode::Repeat, 0.2);
//!
//! // Once per frame
//! for event in mixer.update(delta_time, &mut graph) {
//!     log::debug!("{event:?}");
//! }
//! graph.update_world_matrices();
//! ```

mod action;
mod clip;
mod interpolation;
mod mixer;
mod state;

pub use action::{ActionEvent, ClipAction, Fade, LoopMode};
pub use clip::{AnimationClip, Interpolation, Property, Track, TrackValues};
pub use interpolation::{Sample, find_keyframe_index, sample_track};
pub use mixer::{AnimationMixer, MixerEvent};
pub use state::PlaybackState;
