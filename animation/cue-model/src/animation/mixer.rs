//! Clip mixer for one model instance
//!
//! The mixer keeps one [`ClipAction`] per clip and, on every update, blends
//! the sampled values of all weighted actions into the bound node
//! transforms. Any weight deficit below 1.0 is filled with the rest pose
//! captured at bind time, which is how a fade-out returns the skeleton to its
//! base pose.

use std::sync::Arc;

use super::action::{ActionEvent, ClipAction, LoopMode};
use super::clip::{AnimationClip, Property};
use super::interpolation::{Sample, sample_track};
use crate::error::LoadError;
use crate::math::Lerp;
use crate::scene::{SceneGraph, Transform};

/// Notification emitted by [`AnimationMixer::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerEvent {
    /// A repeating clip wrapped around
    Looped { clip: usize },
    /// A play-once clip reached its end and now holds the last frame
    Finished { clip: usize },
}

#[derive(Debug, Clone)]
struct PropertyBinding {
    node: usize,
    property: Property,
    rest: Sample,
}

impl Sample {
    fn read(transform: &Transform, property: Property) -> Self {
        match property {
            Property::Translation => Self::Translation(transform.translation),
            Property::Rotation => Self::Rotation(transform.rotation),
            Property::Scale => Self::Scale(transform.scale),
        }
    }

    fn write(self, transform: &mut Transform) {
        match self {
            Self::Translation(v) => transform.translation = v,
            Self::Rotation(q) => transform.rotation = q,
            Self::Scale(v) => transform.scale = v,
        }
    }

    fn mix(self, other: Self, t: f32) -> Self {
        match (self, other) {
            (Self::Translation(a), Self::Translation(b)) => Self::Translation(a.lerp_to(&b, t)),
            (Self::Rotation(a), Self::Rotation(b)) => Self::Rotation(a.lerp_to(&b, t)),
            (Self::Scale(a), Self::Scale(b)) => Self::Scale(a.lerp_to(&b, t)),
            (a, _) => a,
        }
    }
}

/// Per-instance clip blending engine
#[derive(Debug)]
pub struct AnimationMixer {
    clips: Arc<[AnimationClip]>,
    actions: Vec<ClipAction>,
    bindings: Vec<PropertyBinding>,
    /// Binding index for every track, per clip
    track_bindings: Vec<Vec<usize>>,
    time: f32,
}

impl AnimationMixer {
    /// Bind a clip table to the nodes of `graph`
    ///
    /// The current node transforms become the rest pose. Fails if a track
    /// targets a node that does not exist or carries the wrong number of
    /// values.
    pub fn new(clips: Arc<[AnimationClip]>, graph: &SceneGraph) -> Result<Self, LoadError> {
        let mut bindings: Vec<PropertyBinding> = Vec::new();
        let mut track_bindings = Vec::with_capacity(clips.len());

        for clip in clips.iter() {
            let mut per_track = Vec::with_capacity(clip.tracks.len());
            for track in &clip.tracks {
                let Some(node) = graph.node(track.target) else {
                    return Err(LoadError::Malformed(format!(
                        "clip '{}' targets node {} but the scene has {} nodes",
                        clip.name,
                        track.target,
                        graph.nodes.len()
                    )));
                };

                if track.values.len() != track.expected_value_count() {
                    return Err(LoadError::Malformed(format!(
                        "clip '{}' track on node {} has {} values for {} keys",
                        clip.name,
                        track.target,
                        track.values.len(),
                        track.times.len()
                    )));
                }

                let property = track.property();
                let index = match bindings
                    .iter()
                    .position(|b| b.node == track.target && b.property == property)
                {
                    Some(index) => index,
                    None => {
                        bindings.push(PropertyBinding {
                            node: track.target,
                            property,
                            rest: Sample::read(&node.transform, property),
                        });
                        bindings.len() - 1
                    }
                };
                per_track.push(index);
            }
            track_bindings.push(per_track);
        }

        log::debug!(
            "Mixer bound {} clips to {} node properties",
            clips.len(),
            bindings.len()
        );

        Ok(Self {
            actions: (0..clips.len()).map(ClipAction::new).collect(),
            clips,
            bindings,
            track_bindings,
            time: 0.0,
        })
    }

    /// Shared clip definitions
    pub fn clips(&self) -> &Arc<[AnimationClip]> {
        &self.clips
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn action(&self, clip: usize) -> Option<&ClipAction> {
        self.actions.get(clip)
    }

    /// Effective blend weight of a clip, 0 for unknown indices
    pub fn weight(&self, clip: usize) -> f32 {
        self.actions
            .get(clip)
            .map_or(0.0, ClipAction::effective_weight)
    }

    /// Total time this mixer has been advanced
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Clips currently contributing to the pose
    pub fn active_clips(&self) -> impl Iterator<Item = usize> + '_ {
        self.actions
            .iter()
            .filter(|a| a.effective_weight() > 0.0)
            .map(ClipAction::clip)
    }

    pub fn set_loop_mode(&mut self, clip: usize, loop_mode: LoopMode) {
        if let Some(action) = self.actions.get_mut(clip) {
            action.set_loop_mode(loop_mode);
        }
    }

    /// Restart `clip` and fade it in while every other weighted clip fades out
    ///
    /// `seconds == 0` is an instant cut.
    pub fn crossfade_to(&mut self, clip: usize, loop_mode: LoopMode, seconds: f32) {
        if clip >= self.actions.len() {
            return;
        }

        for action in self.actions.iter_mut().filter(|a| a.clip() != clip) {
            if action.effective_weight() > 0.0 {
                action.fade_to(0.0, seconds);
            } else {
                action.halt();
            }
        }

        let target = &mut self.actions[clip];
        target.set_loop_mode(loop_mode);
        target.fade_to(1.0, seconds);
        target.restart();
    }

    /// Fade `clip` back to full weight without touching its time
    pub fn fade_in(&mut self, clip: usize, seconds: f32) {
        if let Some(action) = self.actions.get_mut(clip) {
            action.fade_to(1.0, seconds);
        }
    }

    /// Fade every weighted clip toward zero
    pub fn fade_out_all(&mut self, seconds: f32) {
        for action in self.actions.iter_mut().filter(|a| a.is_enabled()) {
            action.fade_to(0.0, seconds);
        }
    }

    /// Advance all actions by `dt` seconds and write the blended pose
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph) -> Vec<MixerEvent> {
        self.time += dt;

        let mut events = Vec::new();
        for action in &mut self.actions {
            let duration = self.clips[action.clip()].duration;
            match action.advance(dt, duration) {
                Some(ActionEvent::Looped) => events.push(MixerEvent::Looped {
                    clip: action.clip(),
                }),
                Some(ActionEvent::Finished) => events.push(MixerEvent::Finished {
                    clip: action.clip(),
                }),
                None => {}
            }
        }

        self.apply(graph);
        log::trace!(
            "Mixer advanced {dt:.4}s to {:.4}s, {} events",
            self.time,
            events.len()
        );
        events
    }

    /// Blend every weighted action into the bound node transforms
    pub fn apply(&self, graph: &mut SceneGraph) {
        let mut accum: Vec<Option<(Sample, f32)>> = vec![None; self.bindings.len()];

        for action in &self.actions {
            let weight = action.effective_weight();
            if weight <= 0.0 {
                continue;
            }

            let clip = &self.clips[action.clip()];
            for (track, &binding) in clip.tracks.iter().zip(&self.track_bindings[action.clip()]) {
                let Some(sample) = sample_track(track, action.time()) else {
                    continue;
                };
                accum[binding] = Some(match accum[binding] {
                    None => (sample, weight),
                    Some((value, total)) => {
                        let total = total + weight;
                        (value.mix(sample, weight / total), total)
                    }
                });
            }
        }

        for (binding, slot) in self.bindings.iter().zip(accum) {
            let value = match slot {
                None => binding.rest,
                Some((value, total)) if total < 1.0 => value.mix(binding.rest, 1.0 - total),
                Some((value, _)) => value,
            };
            if let Some(node) = graph.node_mut(binding.node) {
                value.write(&mut node.transform);
            }
        }
    }

    /// Write the rest pose captured at bind time back into `graph`
    pub fn restore_rest_pose(&self, graph: &mut SceneGraph) {
        for binding in &self.bindings {
            if let Some(node) = graph.node_mut(binding.node) {
                binding.rest.write(&mut node.transform);
            }
        }
    }
}
