#![cfg(test)]

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Mat4, Vec3};

use super::{FixedStepClock, PhysicsTransformState};

#[test]
fn boundary_alphas_return_the_stored_transforms()
{
    let mut state = PhysicsTransformState::new(Mat4::IDENTITY);
    state.update_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));

    assert_eq!(state.get_interpolated_transform(0.0), Mat4::IDENTITY);
    assert_eq!(state.get_interpolated_transform(1.0), Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    //out of range alphas clamp instead of extrapolating
    assert_eq!(state.get_interpolated_transform(1.5), Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(state.get_interpolated_transform(-0.5), Mat4::IDENTITY);
}

#[test]
fn equal_transforms_short_circuit()
{
    let state = PhysicsTransformState::new(Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));
    assert_eq!(state.get_interpolated_transform(0.37), Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
fn translation_interpolates_halfway()
{
    let mut state = PhysicsTransformState::new(Mat4::IDENTITY);
    state.update_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    let halfway = state.get_interpolated_transform(0.5);
    assert!(halfway.abs_diff_eq(Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0)), 1e-5));
}

#[test]
fn rotation_interpolates_spherically()
{
    let mut state = PhysicsTransformState::new(Mat4::IDENTITY);
    state.update_transform(Mat4::from_rotation_y(FRAC_PI_2));
    let halfway = state.get_interpolated_transform(0.5);
    assert!(halfway.abs_diff_eq(Mat4::from_rotation_y(FRAC_PI_4), 1e-5));
}

#[test]
fn clock_trades_frame_time_for_steps()
{
    let mut clock = FixedStepClock::new(0.02);

    assert_eq!(clock.advance(0.05), 2);
    assert!((clock.alpha() - 0.5).abs() < 1e-3);

    assert_eq!(clock.advance(0.015), 1);
    assert!((clock.alpha() - 0.25).abs() < 1e-3);
}

#[test]
fn clock_caps_catch_up_work()
{
    let mut clock = FixedStepClock::new(0.02);
    //a one second hitch is worth 50 steps, far past the per frame cap
    assert_eq!(clock.advance(1.0), 5);
    assert!(clock.alpha() <= 1.0 + 1e-6);
    //the dropped debt does not leak into the next frame
    assert_eq!(clock.advance(0.0), 1);
    assert!(clock.alpha() < 1.0);
}
