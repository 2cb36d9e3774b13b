//! Formatting utilities

use cue_model::{AnimationClip, PlaybackState};
use glam::Vec3;
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3}s")
}

pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// Clip label used in tables: `index:name`
pub fn clip_label(clips: &[AnimationClip], index: usize) -> String {
    match clips.get(index) {
        Some(clip) => format!("{index}:{}", clip.name),
        None => index.to_string(),
    }
}

/// Format a playback state with clip names
pub fn format_state(state: &PlaybackState, clips: &[AnimationClip]) -> String {
    match *state {
        PlaybackState::Idle => "Idle".to_string(),
        PlaybackState::Playing {
            clip,
            looping,
            elapsed,
        } => format!(
            "Playing {} {} @ {}",
            clip_label(clips, clip),
            if looping { "loop" } else { "once" },
            format_seconds(elapsed)
        ),
        PlaybackState::Blending {
            from,
            to,
            remaining,
        } => format!(
            "Blending {} -> {} ({} left)",
            clip_label(clips, from),
            clip_label(clips, to),
            format_seconds(remaining)
        ),
        PlaybackState::Stopping { clip, remaining } => format!(
            "Stopping {} ({} left)",
            clip_label(clips, clip),
            format_seconds(remaining)
        ),
        PlaybackState::Holding { clip } => format!("Holding {}", clip_label(clips, clip)),
    }
}
