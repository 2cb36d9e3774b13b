//! Controller behaviour against the skinned fixture

use std::f32::consts::FRAC_PI_2;

use crate::common::*;
use cue_model::{AnimatedModel, MixerEvent, ModelError, PlaybackState};
use glam::Vec3;
use pretty_assertions::assert_eq;

fn hips(model: &AnimatedModel) -> Vec3 {
    model.scene().unwrap().nodes[HIPS].transform.translation
}

/// Advance in fixed steps, collecting every mixer event
fn run_for(model: &mut AnimatedModel, seconds: f32, step: f32) -> Vec<MixerEvent> {
    let mut events = Vec::new();
    let mut elapsed = 0.0;
    while elapsed + 1e-6 < seconds {
        events.extend(model.advance(step).unwrap());
        elapsed += step;
    }
    events
}

#[tokio::test]
async fn test_fresh_model_has_clips_and_no_cue() {
    let model = fixture_model().await;

    assert!(model.is_loaded());
    assert_eq!(model.clip_count(), 4);
    assert_eq!(model.current_animation(), None);
    assert_eq!(model.last_animation(), None);
    assert_eq!(model.playback_state(), PlaybackState::Idle);
    assert_eq!(model.clip_index("Attack"), Some(ATTACK));
}

#[tokio::test]
async fn test_duplicate_animates_independently() {
    let mut model = fixture_model().await;
    model.cue(RUN, true, 0.0).unwrap();
    model.advance(0.5).unwrap();
    assert!(hips(&model).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));

    let mut twin = model.duplicate().unwrap();
    assert_eq!(twin.current_animation(), None);
    assert_eq!(twin.clip_count(), 4);
    // the copy starts from the rest pose, not the source's current pose
    assert!(hips(&twin).abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));

    twin.cue(WALK, true, 0.0).unwrap();
    twin.advance(0.25).unwrap();
    assert!(hips(&twin).abs_diff_eq(Vec3::new(0.25, 1.0, 0.0), 1e-5));
    assert!(hips(&model).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));

    model.advance(0.25).unwrap();
    assert!(hips(&model).abs_diff_eq(Vec3::new(1.5, 1.0, 0.0), 1e-5));
    assert!(hips(&twin).abs_diff_eq(Vec3::new(0.25, 1.0, 0.0), 1e-5));

    let source = model.scene().unwrap();
    let copy = twin.scene().unwrap();
    assert_ne!(
        source.meshes[0].primitives[0].positions.as_ptr(),
        copy.meshes[0].primitives[0].positions.as_ptr()
    );
    assert!(std::ptr::eq(model.clips().as_ptr(), twin.clips().as_ptr()));
}

#[tokio::test]
async fn test_recue_of_running_clip_keeps_time() {
    let mut model = fixture_model().await;
    model.cue(RUN, true, 0.0).unwrap();
    model.advance(0.3).unwrap();

    model.cue(RUN, true, 0.5).unwrap();
    assert!((model.clip_time(RUN).unwrap() - 0.3).abs() < 1e-5);
    assert_eq!(model.last_animation(), None);

    model.advance(0.1).unwrap();
    assert!((model.clip_time(RUN).unwrap() - 0.4).abs() < 1e-5);
}

#[tokio::test]
async fn test_instant_cut() {
    let mut model = fixture_model().await;
    model.cue(RUN, true, 0.0).unwrap();
    model.advance(0.5).unwrap();
    assert!((hips(&model).x - 1.0).abs() < 1e-5);

    model.cue(WALK, true, 0.0).unwrap();
    assert_eq!(model.clip_weight(RUN), 0.0);
    assert_eq!(model.clip_weight(WALK), 1.0);

    // the first step after a cut shows walk alone, nothing left of run
    model.advance(0.1).unwrap();
    assert!(hips(&model).abs_diff_eq(Vec3::new(0.1, 1.0, 0.0), 1e-5));
}

#[tokio::test]
async fn test_crossfade_takes_blend_seconds() {
    let mut model = fixture_model().await;
    model.cue(IDLE, true, 0.0).unwrap();
    model.advance(0.1).unwrap();

    model.cue(WALK, true, 1.0).unwrap();
    assert!(model.clip_weight(IDLE) > 0.0);
    assert!(matches!(
        model.playback_state(),
        PlaybackState::Blending {
            from: IDLE,
            to: WALK,
            ..
        }
    ));

    model.advance(0.5).unwrap();
    assert!((model.clip_weight(IDLE) - 0.5).abs() < 1e-5);
    assert!((model.clip_weight(WALK) - 0.5).abs() < 1e-5);
    // idle holds x = 0, walk is at x = 0.5 after half a second
    assert!((hips(&model).x - 0.25).abs() < 1e-5);

    model.advance(0.5).unwrap();
    assert_eq!(model.clip_weight(IDLE), 0.0);
    assert!(matches!(
        model.playback_state(),
        PlaybackState::Playing { clip: WALK, .. }
    ));
}

#[tokio::test]
async fn test_out_of_range_cue_changes_nothing() {
    let mut model = fixture_model().await;
    model.cue(WALK, true, 0.0).unwrap();
    model.advance(0.2).unwrap();

    let err = model.cue(4, true, 0.0).unwrap_err();
    assert!(matches!(
        err,
        ModelError::ClipIndexOutOfRange { index: 4, count: 4 }
    ));
    assert_eq!(model.current_animation(), Some(WALK));
    assert_eq!(model.last_animation(), None);
    assert!((model.clip_time(WALK).unwrap() - 0.2).abs() < 1e-5);
}

#[test_log::test(tokio::test)]
async fn test_resume_after_interrupt() {
    let mut model = fixture_model().await;
    model.cue(WALK, true, 0.0).unwrap();
    model.advance(0.2).unwrap();

    model.cue(ATTACK, false, 0.1).unwrap();
    assert_eq!(model.current_animation(), Some(ATTACK));
    assert_eq!(model.last_animation(), Some(WALK));

    let events = run_for(&mut model, 0.6, 0.05);
    assert!(events.contains(&MixerEvent::Finished { clip: ATTACK }));
    assert_eq!(model.playback_state(), PlaybackState::Holding { clip: ATTACK });

    model.cue(WALK, true, 1.0).unwrap();
    assert_eq!(model.current_animation(), Some(WALK));
    assert_eq!(model.last_animation(), Some(ATTACK));
    assert_eq!(model.clip_time(WALK), Some(0.0));
    assert!((model.clip_weight(ATTACK) - 1.0).abs() < 1e-5);

    model.advance(1.0).unwrap();
    assert_eq!(model.clip_weight(ATTACK), 0.0);
    assert!((model.clip_weight(WALK) - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_stop_returns_to_rest_pose() {
    let mut model = fixture_model().await;
    model.cue(RUN, true, 0.0).unwrap();
    model.advance(0.5).unwrap();

    model.stop(0.5).unwrap();
    model.advance(0.25).unwrap();
    assert!(matches!(
        model.playback_state(),
        PlaybackState::Stopping { clip: RUN, .. }
    ));

    model.advance(0.25).unwrap();
    assert_eq!(model.playback_state(), PlaybackState::Idle);
    assert!(hips(&model).abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    assert_eq!(model.current_animation(), Some(RUN));
}

#[tokio::test]
async fn test_play_once_reports_finished_once() {
    let mut model = fixture_model().await;
    model.cue(ATTACK, false, 0.0).unwrap();

    let events = run_for(&mut model, 1.0, 0.1);
    let finished = events
        .iter()
        .filter(|e| **e == MixerEvent::Finished { clip: ATTACK })
        .count();
    assert_eq!(finished, 1);
    assert_eq!(model.clip_time(ATTACK), Some(0.5));
}

#[tokio::test]
async fn test_looping_clip_reports_loops() {
    let mut model = fixture_model().await;
    model.cue(WALK, true, 0.0).unwrap();

    let events = run_for(&mut model, 2.5, 0.25);
    let loops = events
        .iter()
        .filter(|e| **e == MixerEvent::Looped { clip: WALK })
        .count();
    assert_eq!(loops, 2);
}

#[tokio::test]
async fn test_bounding_box_follows_pose() {
    let mut model = fixture_model().await;
    let rest = model.bounding_box().unwrap();
    assert!(rest.min.abs_diff_eq(Vec3::new(-0.5, 1.0, 0.0), 1e-5));
    assert!(rest.max.abs_diff_eq(Vec3::new(0.5, 2.0, 0.0), 1e-5));

    model.cue(RUN, true, 0.0).unwrap();
    model.advance(0.5).unwrap();
    let posed = model.bounding_box().unwrap();
    assert!((posed.center().x - 1.0).abs() < 1e-5);

    model.root_transform_mut().unwrap().translation = Vec3::new(0.0, 0.0, 5.0);
    model.advance(0.0).unwrap();
    let moved = model.bounding_box().unwrap();
    assert!((moved.center().z - 5.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_rotation_offset_turns_the_model() {
    let model = AnimatedModel::load_from(&MemoryLoader::fixture(), FIXTURE_NAME, FRAC_PI_2)
        .await
        .unwrap();
    assert_eq!(model.rotation_offset(), Some(FRAC_PI_2));

    // the quad spans X in the asset and Z once turned a quarter about +Y
    let bounds = model.bounding_box().unwrap();
    assert!(bounds.size().abs_diff_eq(Vec3::new(0.0, 1.0, 1.0), 1e-5));
}

#[tokio::test]
async fn test_joint_matrices_identity_at_rest() {
    let model = fixture_model().await;
    let matrices = model.joint_matrices(0).unwrap();
    assert_eq!(matrices.len(), 2);
    assert!(matrices.iter().all(|m| m.abs_diff_eq(glam::Mat4::IDENTITY, 1e-5)));
    assert!(model.joint_matrices(1).is_none());
}

#[tokio::test]
async fn test_duplicate_before_load_fails() {
    let model = AnimatedModel::new();
    assert!(matches!(model.duplicate(), Err(ModelError::NotLoaded)));
}

#[tokio::test]
async fn test_single_key_clip_played_once_finishes() {
    let mut model = pose_model().await;
    model.cue(1, false, 0.0).unwrap();

    let events = model.advance(0.1).unwrap();
    assert_eq!(events, vec![MixerEvent::Finished { clip: 1 }]);
    assert_eq!(model.playback_state(), PlaybackState::Holding { clip: 1 });
    let fist = model.scene().unwrap().nodes[0].transform.translation;
    assert_eq!(fist, Vec3::new(0.0, 0.0, -1.0));

    // a finished clip restarts when cued again
    model.cue(1, false, 0.0).unwrap();
    assert_eq!(
        model.advance(0.1).unwrap(),
        vec![MixerEvent::Finished { clip: 1 }]
    );
}

#[tokio::test]
async fn test_single_key_clip_looping_keeps_playing() {
    let mut model = pose_model().await;
    model.cue(0, true, 0.0).unwrap();

    for _ in 0..5 {
        assert!(model.advance(0.1).unwrap().is_empty());
    }
    assert!(matches!(
        model.playback_state(),
        PlaybackState::Playing { clip: 0, looping: true, .. }
    ));
}
