#![cfg(test)]

use std::collections::HashMap;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec3, Vec4};

use super::animator::{Animator, BlendTreeEntry, MAX_BONES};
use super::clip::{AnimationClip, AnimationSet, BoneInfo, BoneTrack, Channel, Keyframe, Skeleton, SkeletonBuilder, SkeletonNode};

fn constant_track(location: Vec3) -> BoneTrack
{
    return BoneTrack::new
    (
        vec![Keyframe { value: location, timestamp: 0.0 }],
        vec![Keyframe { value: Quat::IDENTITY, timestamp: 0.0 }],
        vec![Keyframe { value: Vec3::ONE, timestamp: 0.0 }],
    );
}

fn moving_track(from: Vec3, to: Vec3, duration: f32) -> BoneTrack
{
    return BoneTrack::new
    (
        vec!
        [
            Keyframe { value: from, timestamp: 0.0 },
            Keyframe { value: to, timestamp: duration },
        ],
        vec![Keyframe { value: Quat::IDENTITY, timestamp: 0.0 }],
        vec![Keyframe { value: Vec3::ONE, timestamp: 0.0 }],
    );
}

//idle holds the hips at (1,0,0), run slides them from the origin to (2,0,0)
//over two ticks, jump holds them at (0,2,0)
fn test_set() -> Rc<AnimationSet>
{
    let mut builder = SkeletonBuilder::new();
    let root = builder.add_root("Armature", Mat4::IDENTITY);
    let hips = builder.add_child(root, "Hips", Mat4::IDENTITY);
    builder.add_child(hips, "Spine", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
    let skeleton = builder.build();

    let mut bone_info = HashMap::new();
    bone_info.insert("Hips".to_string(), BoneInfo { id: 0, offset: Mat4::IDENTITY });
    bone_info.insert("Spine".to_string(), BoneInfo { id: 1, offset: Mat4::IDENTITY });

    let idle = AnimationClip::new("idle", 1.0, 1.0, Mat4::IDENTITY, vec!
    [
        ("Hips".to_string(), constant_track(Vec3::new(1.0, 0.0, 0.0))),
    ]);
    let run = AnimationClip::new("run", 2.0, 1.0, Mat4::IDENTITY, vec!
    [
        ("Hips".to_string(), moving_track(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 2.0)),
    ]);
    let jump = AnimationClip::new("jump", 1.0, 1.0, Mat4::IDENTITY, vec!
    [
        ("Hips".to_string(), constant_track(Vec3::new(0.0, 2.0, 0.0))),
    ]);

    return Rc::new(AnimationSet::new(skeleton, bone_info, vec![idle, run, jump]));
}

fn bone_translation(animator: &Animator, bone_id: usize) -> Vec4
{
    return animator.final_bone_matrices()[bone_id].w_axis;
}

#[test]
fn single_key_channel_is_constant()
{
    let track = constant_track(Vec3::new(1.0, 0.0, 0.0));
    for time in [0.0, 0.25, 0.4, 0.99]
    {
        let pose = track.sample(time);
        assert!(pose.location.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(pose.orientation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!(pose.scale.abs_diff_eq(Vec3::ONE, 1e-6));
    }
}

#[test]
fn channel_interpolates_between_keys()
{
    let track = moving_track(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 2.0);
    assert!(track.sample(0.5).location.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    assert!(track.sample(1.0).location.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    //sampling right on the last key lands on its value
    assert!(track.sample(2.0).location.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
}

#[test]
#[should_panic]
fn empty_channel_is_rejected()
{
    Channel::<Vec3>::new(vec![]);
}

#[test]
#[should_panic]
fn child_before_parent_is_rejected()
{
    Skeleton::new(vec!
    [
        SkeletonNode { name: "Child".to_string(), local_transform: Mat4::IDENTITY, parent: Some(1) },
        SkeletonNode { name: "Root".to_string(), local_transform: Mat4::IDENTITY, parent: None },
    ]);
}

#[test]
fn looping_playback_wraps_to_start()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 0.0, true, true);
    for _ in 0..8
    {
        animator.update_animation(0.25);
    }
    //eight quarter steps add up to exactly one run cycle
    assert!(animator.current_time().abs() < 1e-4);
}

#[test]
fn non_looping_playback_clamps_to_duration()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 0.0, false, true);
    animator.update_animation(5.0);
    assert!((animator.current_time() - 2.0).abs() < 1e-6);
    animator.update_animation(5.0);
    assert!((animator.current_time() - 2.0).abs() < 1e-6);
}

#[test]
fn playback_speed_scales_the_clock()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 0.0, true, true);
    animator.animation_speed = 2.0;
    animator.update_animation(0.25);
    assert!((animator.current_time() - 0.5).abs() < 1e-6);
    //the lookahead runs on the sped up clock as well
    assert!(animator.is_animation_finished(1, 0.75));
    assert!(!animator.is_animation_finished(1, 0.7));
}

#[test]
fn finish_test_looks_one_step_ahead()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 0.0, true, true);
    assert!(animator.is_animation_finished(1, 2.0));
    assert!(!animator.is_animation_finished(1, 1.9));
    //a clip that is not the current one never reports finished
    assert!(!animator.is_animation_finished(0, 100.0));
}

#[test]
fn crossfade_promotes_target_when_mix_runs_out()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 0.5, true, false);
    assert!(animator.is_crossfading());
    assert_eq!(animator.current_clip_index(), Some(0));
    assert_eq!(animator.next_clip_index(), Some(1));

    animator.update_animation(0.5);
    assert!(!animator.is_crossfading());
    assert_eq!(animator.current_clip_index(), Some(1));
    assert_eq!(animator.next_clip_index(), None);
    //the target keeps the playback time it accumulated while fading in
    assert!((animator.current_time() - 0.5).abs() < 1e-6);
}

#[test]
fn crossfade_mixes_poses_halfway()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(1, 1.0, true, false);
    animator.update_animation(0.5);
    //idle pins the hips at (1,0,0), run has them at (0.5,0,0) half a second
    //in, and the fade is half done
    assert!(bone_translation(&animator, 0).abs_diff_eq(Vec4::new(0.75, 0.0, 0.0, 1.0), 1e-5));
}

#[test]
fn pending_crossfade_blocks_other_requests()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_animation(0, 0.5, true, false);
    assert!(!animator.is_crossfading());

    animator.play_animation(1, 0.5, true, false);
    assert_eq!(animator.next_clip_index(), Some(1));
    animator.play_animation(2, 0.5, true, false);
    assert_eq!(animator.next_clip_index(), Some(1));

    //a forced immediate play discards the pending fade outright
    animator.play_animation(2, 0.0, true, true);
    assert_eq!(animator.current_clip_index(), Some(2));
    assert!(!animator.is_crossfading());
}

#[test]
fn skinning_matrices_follow_the_hierarchy()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.update_animation(0.0);
    assert!(animator.final_bone_matrices()[0].abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)), 1e-5));
    //the spine has no idle track so it rides its bind transform under the hips
    assert!(animator.final_bone_matrices()[1].abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0)), 1e-5));
}

#[test]
fn kept_bones_record_and_override()
{
    let mut animator = Animator::new(test_set(), &["Hips", "Tail"]);
    animator.update_animation(0.0);

    let hips = animator.get_bone_transformation("Hips").expect("hips should be tracked");
    assert_eq!(hips.bone_id, 0);
    assert!(hips.global_transform.abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)), 1e-5));
    assert!(hips.parent_transform.abs_diff_eq(Mat4::IDENTITY, 1e-5));

    //a registered name that never shows up in the skeleton silently stays empty
    assert!(animator.get_bone_transformation("Tail").is_none());
    assert!(animator.get_bone_transformation("Nope").is_none());

    let posed = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
    animator.set_bone_transformation("Hips", posed);
    assert!(animator.final_bone_matrices()[0].abs_diff_eq(posed, 1e-5));
    animator.set_bone_transformation("Tail", posed);
    animator.set_bone_transformation("Nope", posed);
}

#[test]
fn blend_tree_follows_the_driver_value()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.play_blend_tree
    (
        [
            BlendTreeEntry { clip_index: 0, threshold: 0.0 },
            BlendTreeEntry { clip_index: 1, threshold: 6.0 },
        ],
        0.0,
        true,
    );
    assert_eq!(animator.current_clip_index(), None);

    animator.set_blend_tree_value(3.0);
    animator.update_animation(0.5);
    assert!(bone_translation(&animator, 0).abs_diff_eq(Vec4::new(0.75, 0.0, 0.0, 1.0), 1e-5));

    //all the way at the first threshold only the first clip contributes
    animator.set_blend_tree_value(0.0);
    animator.update_animation(0.0);
    assert!(bone_translation(&animator, 0).abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-5));

    assert!(!animator.is_animation_finished(0, 100.0));
}

#[test]
fn bone_matrix_store_mirrors_the_palette()
{
    let mut animator = Animator::new(test_set(), &[]);
    animator.update_animation(0.0);
    let store = animator.bone_matrix_store();
    assert_eq!(store.matrices[0], animator.final_bone_matrices()[0].to_cols_array());
    assert_eq!(store.as_bytes().len(), MAX_BONES * 16 * std::mem::size_of::<f32>());
}
