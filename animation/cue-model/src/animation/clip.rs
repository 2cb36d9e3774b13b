//! Clip definitions: immutable keyframe tracks targeting scene nodes

use glam::{Quat, Vec3};

/// How values between two keyframes are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Hold the earlier key until the next one
    Step,
    Linear,
    /// Values are stored as (in_tangent, value, out_tangent) triples
    CubicSpline,
}

/// The node property a track animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Translation,
    Rotation,
    Scale,
}

/// Keyframe values, one entry per key (three per key for cubic splines)
#[derive(Debug, Clone)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl TrackValues {
    pub fn property(&self) -> Property {
        match self {
            Self::Translation(_) => Property::Translation,
            Self::Rotation(_) => Property::Rotation,
            Self::Scale(_) => Property::Scale,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single animated property of one node
#[derive(Debug, Clone)]
pub struct Track {
    /// Target node index in the owning scene graph
    pub target: usize,
    pub interpolation: Interpolation,
    /// Key times in seconds, ascending
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    pub fn property(&self) -> Property {
        self.values.property()
    }

    /// Number of values expected for `times.len()` keys
    pub fn expected_value_count(&self) -> usize {
        match self.interpolation {
            Interpolation::CubicSpline => self.times.len() * 3,
            Interpolation::Step | Interpolation::Linear => self.times.len(),
        }
    }

    /// Time of the last key, 0 for an empty track
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// An animation clip (a named time series of skeletal poses)
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds; the last key time over all tracks
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::end_time).fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }
}
