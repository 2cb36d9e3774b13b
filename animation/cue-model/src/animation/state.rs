//! Observable playback state of a model

use super::mixer::AnimationMixer;

/// What a model is doing right now, derived from its cue history and mixer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    /// Nothing cued yet, or a stop has fully faded out
    Idle,
    /// The current clip runs at full weight
    Playing {
        clip: usize,
        looping: bool,
        elapsed: f32,
    },
    /// A crossfade from the previously cued clip is in progress
    Blending {
        from: usize,
        to: usize,
        remaining: f32,
    },
    /// A stop is fading the current clip toward the rest pose
    Stopping { clip: usize, remaining: f32 },
    /// A play-once clip reached its end and holds its last frame
    Holding { clip: usize },
}

impl PlaybackState {
    /// Resolve the state from the mixer and the controller's cue history
    pub fn resolve(mixer: &AnimationMixer, current: Option<usize>, last: Option<usize>) -> Self {
        let Some(clip) = current else {
            return Self::Idle;
        };
        let Some(action) = mixer.action(clip) else {
            return Self::Idle;
        };
        if !action.is_enabled() {
            return Self::Idle;
        }

        if action.is_fading_out() {
            return Self::Stopping {
                clip,
                remaining: action.fade().map_or(0.0, |f| f.remaining()),
            };
        }

        if let (Some(from), Some(fade)) = (last, action.fade())
            && from != clip
            && mixer.weight(from) > 0.0
        {
            return Self::Blending {
                from,
                to: clip,
                remaining: fade.remaining(),
            };
        }

        if action.is_finished() {
            return Self::Holding { clip };
        }

        Self::Playing {
            clip,
            looping: action.loop_mode().is_looping(),
            elapsed: action.time(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The clip the state is about, the incoming one while blending
    pub fn clip(&self) -> Option<usize> {
        match *self {
            Self::Idle => None,
            Self::Playing { clip, .. } | Self::Stopping { clip, .. } | Self::Holding { clip } => {
                Some(clip)
            }
            Self::Blending { to, .. } => Some(to),
        }
    }
}
