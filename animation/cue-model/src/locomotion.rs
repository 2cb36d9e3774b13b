//! Gameplay-facing locomotion driver
//!
//! Turns a per-frame input snapshot into cues on an [`AnimatedModel`]: walk
//! or run while moving, idle when standing still, and a play-once attack
//! that interrupts whatever was playing and hands control back when it
//! finishes.
//!
//! # Example
//!
//! ```rust,ignore
//! use cue_model::{Buttons, InputState, LocomotionDriver, LocomotionProfile};
//!
//! let mut driver = LocomotionDriver::new(LocomotionProfile {
//!     attack_clip: Some(9),
//!     ..LocomotionProfile::default()
//! });
//!
//! let mut events = Vec::new();
//! loop {
//!     let input = InputState::new(Buttons::FORWARD | Buttons::SPRINT);
//!     driver.update(&mut model, &input, &events)?;
//!     events = model.advance(frame_time)?;
//! }
//! ```

use bitflags::bitflags;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::animation::MixerEvent;
use crate::controller::AnimatedModel;
use crate::error::Result;
use crate::scene::Transform;

bitflags! {
    /// Buttons held during one frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const FORWARD = 0x01;
        const BACK    = 0x02;
        const LEFT    = 0x04;
        const RIGHT   = 0x08;
        const SPRINT  = 0x10;
        const ATTACK  = 0x20;
    }
}

/// Input snapshot for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub buttons: Buttons,
}

impl InputState {
    pub fn new(buttons: Buttons) -> Self {
        Self { buttons }
    }

    /// Unit movement direction on the XZ plane, forward is -Z
    pub fn direction(&self) -> Vec3 {
        let mut direction = Vec3::ZERO;
        if self.buttons.contains(Buttons::FORWARD) {
            direction.z -= 1.0;
        }
        if self.buttons.contains(Buttons::BACK) {
            direction.z += 1.0;
        }
        if self.buttons.contains(Buttons::LEFT) {
            direction.x -= 1.0;
        }
        if self.buttons.contains(Buttons::RIGHT) {
            direction.x += 1.0;
        }
        direction.normalize_or_zero()
    }

    pub fn is_moving(&self) -> bool {
        self.direction() != Vec3::ZERO
    }

    pub fn is_sprinting(&self) -> bool {
        self.buttons.contains(Buttons::SPRINT)
    }

    pub fn is_attacking(&self) -> bool {
        self.buttons.contains(Buttons::ATTACK)
    }
}

fn default_idle_clip() -> usize {
    0
}

fn default_walk_clip() -> usize {
    2
}

fn default_run_clip() -> usize {
    1
}

fn default_move_blend() -> f32 {
    0.2
}

fn default_idle_blend() -> f32 {
    0.3
}

fn default_attack_blend() -> f32 {
    0.1
}

fn default_resume_blend() -> f32 {
    1.0
}

fn default_turn_rate() -> f32 {
    0.1
}

/// Clip indices and timings used by [`LocomotionDriver`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionProfile {
    #[serde(default = "default_idle_clip")]
    pub idle_clip: usize,
    #[serde(default = "default_walk_clip")]
    pub walk_clip: usize,
    #[serde(default = "default_run_clip")]
    pub run_clip: usize,
    /// Play-once clip triggered by [`Buttons::ATTACK`]; attacks are ignored without one
    #[serde(default)]
    pub attack_clip: Option<usize>,
    /// Crossfade into walk or run, in seconds
    #[serde(default = "default_move_blend")]
    pub move_blend: f32,
    /// Fade back to idle, in seconds
    #[serde(default = "default_idle_blend")]
    pub idle_blend: f32,
    #[serde(default = "default_attack_blend")]
    pub attack_blend: f32,
    /// Crossfade back to the interrupted clip after an attack, in seconds
    #[serde(default = "default_resume_blend")]
    pub resume_blend: f32,
    /// Maximum facing change per update, in radians
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,
}

impl Default for LocomotionProfile {
    fn default() -> Self {
        Self {
            idle_clip: default_idle_clip(),
            walk_clip: default_walk_clip(),
            run_clip: default_run_clip(),
            attack_clip: None,
            move_blend: default_move_blend(),
            idle_blend: default_idle_blend(),
            attack_blend: default_attack_blend(),
            resume_blend: default_resume_blend(),
            turn_rate: default_turn_rate(),
        }
    }
}

#[cfg(feature = "yaml")]
impl LocomotionProfile {
    /// Load a profile from a YAML file
    pub fn from_yaml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_yaml_ng::from_reader(reader)?)
    }

    /// Load a profile from a YAML string
    pub fn from_yaml_str(
        yaml: &str,
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}

/// Turn `transform` toward `direction` by at most `max_step` radians
///
/// Only the XZ components matter. A zero direction leaves the facing alone.
pub fn align_facing(transform: &mut Transform, direction: Vec3, max_step: f32) {
    if direction.x == 0.0 && direction.z == 0.0 {
        return;
    }

    let target = Quat::from_rotation_y(-direction.z.atan2(direction.x));
    let angle = transform.rotation.angle_between(target);
    transform.rotation = if angle <= max_step {
        target
    } else {
        transform.rotation.slerp(target, max_step / angle).normalize()
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interrupt {
    attack_clip: usize,
    resume: Option<usize>,
}

/// Drives walk, run, idle and attack cues from input snapshots
#[derive(Debug, Clone, Default)]
pub struct LocomotionDriver {
    profile: LocomotionProfile,
    interrupt: Option<Interrupt>,
}

impl LocomotionDriver {
    pub fn new(profile: LocomotionProfile) -> Self {
        Self {
            profile,
            interrupt: None,
        }
    }

    pub fn profile(&self) -> &LocomotionProfile {
        &self.profile
    }

    /// True while an attack is playing
    pub fn is_attacking(&self) -> bool {
        self.interrupt.is_some()
    }

    /// Apply one frame of input
    ///
    /// `events` are the mixer events returned by the previous
    /// [`AnimatedModel::advance`]; they tell the driver when an attack ended.
    pub fn update(
        &mut self,
        model: &mut AnimatedModel,
        input: &InputState,
        events: &[MixerEvent],
    ) -> Result<()> {
        if let Some(interrupt) = self.interrupt
            && events.contains(&MixerEvent::Finished {
                clip: interrupt.attack_clip,
            })
        {
            self.interrupt = None;
            let resume = interrupt.resume.unwrap_or(self.profile.idle_clip);
            log::debug!("Attack finished, resuming clip {resume}");
            model.cue(resume, true, self.profile.resume_blend)?;
        }

        if input.is_attacking()
            && self.interrupt.is_none()
            && let Some(attack_clip) = self.profile.attack_clip
        {
            let resume = model.current_animation().filter(|&c| c != attack_clip);
            model.cue(attack_clip, false, self.profile.attack_blend)?;
            self.interrupt = Some(Interrupt {
                attack_clip,
                resume,
            });
        }

        if self.interrupt.is_none() {
            self.update_locomotion(model, input)?;
        }

        if let Some(transform) = model.root_transform_mut() {
            align_facing(transform, input.direction(), self.profile.turn_rate);
        }
        Ok(())
    }

    fn update_locomotion(&self, model: &mut AnimatedModel, input: &InputState) -> Result<()> {
        if input.is_moving() {
            let target = if input.is_sprinting() {
                self.profile.run_clip
            } else {
                self.profile.walk_clip
            };
            if model.current_animation() != Some(target) {
                model.cue(target, true, self.profile.move_blend)?;
            }
        } else if model.current_animation() != Some(self.profile.idle_clip) {
            model.stop(self.profile.idle_blend)?;
            model.cue(self.profile.idle_clip, true, self.profile.idle_blend)?;
        }
        Ok(())
    }
}
