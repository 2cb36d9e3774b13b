//! Locomotion driver against the skinned fixture

use crate::common::*;
use cue_model::{AnimatedModel, Buttons, InputState, LocomotionDriver, LocomotionProfile, MixerEvent};
use glam::Quat;
use pretty_assertions::assert_eq;

const FRAME: f32 = 1.0 / 30.0;

fn driver() -> LocomotionDriver {
    LocomotionDriver::new(LocomotionProfile {
        attack_clip: Some(ATTACK),
        ..LocomotionProfile::default()
    })
}

/// One frame: driver update followed by a mixer step
fn frame(
    driver: &mut LocomotionDriver,
    model: &mut AnimatedModel,
    buttons: Buttons,
    events: &[MixerEvent],
) -> Vec<MixerEvent> {
    driver
        .update(model, &InputState::new(buttons), events)
        .unwrap();
    model.advance(FRAME).unwrap()
}

#[tokio::test]
async fn test_idle_walk_run_switching() {
    let mut model = fixture_model().await;
    let mut driver = driver();

    frame(&mut driver, &mut model, Buttons::empty(), &[]);
    assert_eq!(model.current_animation(), Some(IDLE));

    frame(&mut driver, &mut model, Buttons::FORWARD, &[]);
    assert_eq!(model.current_animation(), Some(WALK));
    assert_eq!(model.last_animation(), Some(IDLE));

    frame(&mut driver, &mut model, Buttons::FORWARD | Buttons::SPRINT, &[]);
    assert_eq!(model.current_animation(), Some(RUN));
    assert_eq!(model.last_animation(), Some(WALK));

    frame(&mut driver, &mut model, Buttons::empty(), &[]);
    assert_eq!(model.current_animation(), Some(IDLE));
    assert_eq!(model.last_animation(), Some(RUN));
}

#[tokio::test]
async fn test_held_direction_does_not_restart_walk() {
    let mut model = fixture_model().await;
    let mut driver = driver();

    for _ in 0..10 {
        frame(&mut driver, &mut model, Buttons::LEFT, &[]);
    }
    assert_eq!(model.current_animation(), Some(WALK));
    assert!((model.clip_time(WALK).unwrap() - 10.0 * FRAME).abs() < 1e-4);
}

#[test_log::test(tokio::test)]
async fn test_attack_interrupts_and_resumes() {
    let mut model = fixture_model().await;
    let mut driver = driver();

    let mut events = frame(&mut driver, &mut model, Buttons::FORWARD, &[]);
    events = frame(
        &mut driver,
        &mut model,
        Buttons::FORWARD | Buttons::ATTACK,
        &events,
    );
    assert!(driver.is_attacking());
    assert_eq!(model.current_animation(), Some(ATTACK));
    assert_eq!(model.last_animation(), Some(WALK));

    // movement does not cut the attack short
    for _ in 0..30 {
        if !driver.is_attacking() {
            break;
        }
        events = frame(&mut driver, &mut model, Buttons::FORWARD, &events);
    }

    assert!(!driver.is_attacking());
    assert_eq!(model.current_animation(), Some(WALK));
    assert_eq!(model.last_animation(), Some(ATTACK));
}

#[tokio::test]
async fn test_attack_from_rest_resumes_idle() {
    let mut model = fixture_model().await;
    let mut driver = driver();

    let mut events = frame(&mut driver, &mut model, Buttons::ATTACK, &[]);
    assert_eq!(model.current_animation(), Some(ATTACK));

    for _ in 0..30 {
        events = frame(&mut driver, &mut model, Buttons::empty(), &events);
        if !driver.is_attacking() {
            break;
        }
    }
    assert_eq!(model.current_animation(), Some(IDLE));
}

#[tokio::test]
async fn test_attack_without_clip_is_ignored() {
    let mut model = fixture_model().await;
    let mut driver = LocomotionDriver::default();

    frame(&mut driver, &mut model, Buttons::ATTACK, &[]);
    assert!(!driver.is_attacking());
    assert_eq!(model.current_animation(), Some(IDLE));
}

#[tokio::test]
async fn test_facing_turns_toward_movement() {
    let mut model = fixture_model().await;
    let mut driver = driver();
    let turn_rate = driver.profile().turn_rate;

    frame(&mut driver, &mut model, Buttons::FORWARD, &[]);
    let rotation = model.root_transform().unwrap().rotation;
    assert!((rotation.angle_between(Quat::IDENTITY) - turn_rate).abs() < 1e-4);

    for _ in 0..40 {
        frame(&mut driver, &mut model, Buttons::FORWARD, &[]);
    }
    let facing = model.root_transform().unwrap().rotation;
    assert!(facing.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), 1e-4));
}

#[tokio::test]
async fn test_single_key_attack_hands_back_control() {
    let mut model = pose_model().await;
    let mut driver = LocomotionDriver::new(LocomotionProfile {
        idle_clip: 0,
        walk_clip: 0,
        run_clip: 0,
        attack_clip: Some(1),
        ..LocomotionProfile::default()
    });

    let events = frame(&mut driver, &mut model, Buttons::ATTACK, &[]);
    assert_eq!(events, vec![MixerEvent::Finished { clip: 1 }]);
    assert!(driver.is_attacking());

    frame(&mut driver, &mut model, Buttons::empty(), &events);
    assert!(!driver.is_attacking());
    assert_eq!(model.current_animation(), Some(0));
}
