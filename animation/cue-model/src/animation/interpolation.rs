//! Keyframe interpolation for clip tracks

use super::clip::{Interpolation, Track, TrackValues};
use crate::math::{Lerp, hermite};
use glam::{Quat, Vec3, Vec4};

/// A value sampled from one track
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Find the index of the keyframe at or before the given time
///
/// Returns None if the track has no keyframes. The result is the earlier key
/// of the bracketing pair, so callers interpolate between `[index]` and
/// `[index + 1]`.
pub fn find_keyframe_index(times: &[f32], time: f32) -> Option<usize> {
    if times.is_empty() {
        return None;
    }

    let last_index = times.len() - 1;
    if time >= times[last_index] {
        return Some(last_index);
    }

    // Largest index where times[index] <= time
    let mut low = 0;
    let mut high = last_index;

    while low < high {
        let mid = (low + high).div_ceil(2);
        if times[mid] <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

/// Bracketing keys and the normalized position between them
fn bracket(times: &[f32], time: f32) -> Option<(usize, usize, f32, f32)> {
    let index = find_keyframe_index(times, time)?;
    if index >= times.len() - 1 || time <= times[0] {
        let clamped = if time <= times[0] { 0 } else { index };
        return Some((clamped, clamped, 0.0, 0.0));
    }

    let t0 = times[index];
    let t1 = times[index + 1];
    let span = t1 - t0;
    let t = if span > 0.0 {
        ((time - t0) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some((index, index + 1, t, span))
}

fn sample_values<T: Lerp>(
    values: &[T],
    interpolation: Interpolation,
    (i0, i1, t, _): (usize, usize, f32, f32),
) -> Option<T> {
    let v0 = values.get(i0)?;
    if i0 == i1 {
        return Some(*v0);
    }
    let v1 = values.get(i1)?;

    Some(match interpolation {
        Interpolation::Step => *v0,
        Interpolation::Linear | Interpolation::CubicSpline => v0.lerp_to(v1, t),
    })
}

fn cubic_vec3(values: &[Vec3], (i0, i1, t, span): (usize, usize, f32, f32)) -> Option<Vec3> {
    // layout per key: in_tangent, value, out_tangent
    let p0 = *values.get(i0 * 3 + 1)?;
    if i0 == i1 {
        return Some(p0);
    }
    let m0 = *values.get(i0 * 3 + 2)? * span;
    let m1 = *values.get(i1 * 3)? * span;
    let p1 = *values.get(i1 * 3 + 1)?;
    Some(hermite(p0, m0, p1, m1, t))
}

fn cubic_quat(values: &[Quat], (i0, i1, t, span): (usize, usize, f32, f32)) -> Option<Quat> {
    let p0 = *values.get(i0 * 3 + 1)?;
    if i0 == i1 {
        return Some(p0.normalize());
    }
    let m0 = Vec4::from(*values.get(i0 * 3 + 2)?) * span;
    let m1 = Vec4::from(*values.get(i1 * 3)?) * span;
    let p1 = *values.get(i1 * 3 + 1)?;

    let t2 = t * t;
    let t3 = t2 * t;
    let v = Vec4::from(p0) * (2.0 * t3 - 3.0 * t2 + 1.0)
        + m0 * (t3 - 2.0 * t2 + t)
        + Vec4::from(p1) * (-2.0 * t3 + 3.0 * t2)
        + m1 * (t3 - t2);
    Some(Quat::from_vec4(v).normalize())
}

/// Sample a track at `time` seconds
///
/// Times before the first key clamp to the first value and times after the
/// last key clamp to the last value. Returns None for an empty or truncated
/// track.
pub fn sample_track(track: &Track, time: f32) -> Option<Sample> {
    let keys = bracket(&track.times, time)?;

    match (&track.values, track.interpolation) {
        (TrackValues::Translation(v), Interpolation::CubicSpline) => {
            cubic_vec3(v, keys).map(Sample::Translation)
        }
        (TrackValues::Scale(v), Interpolation::CubicSpline) => cubic_vec3(v, keys).map(Sample::Scale),
        (TrackValues::Rotation(v), Interpolation::CubicSpline) => {
            cubic_quat(v, keys).map(Sample::Rotation)
        }
        (TrackValues::Translation(v), interp) => {
            sample_values(v, interp, keys).map(Sample::Translation)
        }
        (TrackValues::Scale(v), interp) => sample_values(v, interp, keys).map(Sample::Scale),
        (TrackValues::Rotation(v), interp) => sample_values(v, interp, keys).map(Sample::Rotation),
    }
}
