use std::collections::HashMap;
use std::rc::Rc;

use glam::Mat4;

use super::clip::{AnimationSet, BoneInfo, LocalPose};
use super::common::NormalizedFloat;

pub const MAX_BONES : usize = 100;

//world transform record for a bone the owner asked to keep track of, for
//attachment sockets and procedural posing
#[derive(Clone, Copy)]
pub struct KeptBone
{
    pub global_transform: Mat4,
    pub bone_id: usize,
    pub offset: Mat4,
    pub parent_transform: Mat4,
}

#[derive(Clone, Copy)]
pub struct BlendTreeEntry
{
    pub clip_index: usize,
    pub threshold: f32,
}

#[derive(Clone, Copy)]
struct SinglePlayback
{
    clip: usize,
    time: f32,
}

#[derive(Clone, Copy)]
struct BlendNode
{
    clip: usize,
    threshold: f32,
    time: f32,
}

#[derive(Clone, Copy)]
struct BlendTreePlayback
{
    nodes: [BlendNode; 2],
    mix: NormalizedFloat,
}

#[derive(Clone, Copy)]
enum Playback
{
    Single(SinglePlayback),
    BlendTree(BlendTreePlayback),
}

//per-node lookups resolved once per clip switch. Track indices are only valid
//for the playback they were built against, which is why every play call and
//crossfade promotion rebuilds the table
#[derive(Clone, Copy)]
struct NodeCache
{
    current_tracks: [Option<usize>; 2],
    next_tracks: [Option<usize>; 2],
    bone: Option<BoneInfo>,
    kept: Option<usize>,
}

pub struct Animator
{
    animations: Rc<AnimationSet>,
    current: Playback,
    next: Option<Playback>,
    looping_current: bool,
    looping_next: bool,
    mix_time: f32,
    total_mix_time: f32,
    pub animation_speed: f32,
    final_bone_matrices: Vec<Mat4>,
    kept_bone_indices: HashMap<String, usize>,
    kept_bones: Vec<Option<KeptBone>>,
    node_cache: Vec<NodeCache>,
}

impl Animator
{
    pub fn new(animations: Rc<AnimationSet>, kept_bone_names: &[&str]) -> Animator
    {
        assert!(animations.num_clips() > 0, "An animator needs at least one clip to play.");

        let mut kept_bone_indices = HashMap::new();
        let mut kept_bones = vec![];
        for name in kept_bone_names
        {
            kept_bone_indices.insert(name.to_string(), kept_bones.len());
            kept_bones.push(None);
        }

        let mut animator = Animator
        {
            animations: animations,
            current: Playback::Single(SinglePlayback { clip: 0, time: 0.0 }),
            next: None,
            looping_current: true,
            looping_next: true,
            mix_time: -1.0,
            total_mix_time: -1.0,
            animation_speed: 1.0,
            final_bone_matrices: vec![Mat4::IDENTITY; MAX_BONES],
            kept_bone_indices: kept_bone_indices,
            kept_bones: kept_bones,
            node_cache: vec![],
        };
        animator.play_animation(0, 0.0, true, true);
        return animator;
    }

    pub fn animation_set(&self) -> &AnimationSet
    {
        return self.animations.as_ref();
    }

    pub fn final_bone_matrices(&self) -> &[Mat4]
    {
        return &self.final_bone_matrices;
    }

    pub fn current_clip_index(&self) -> Option<usize>
    {
        return match &self.current
        {
            Playback::Single(single) => Some(single.clip),
            Playback::BlendTree(_) => None,
        };
    }

    pub fn next_clip_index(&self) -> Option<usize>
    {
        return match &self.next
        {
            Some(Playback::Single(single)) => Some(single.clip),
            _ => None,
        };
    }

    pub fn is_crossfading(&self) -> bool
    {
        return self.next.is_some();
    }

    pub fn current_time(&self) -> f32
    {
        return match &self.current
        {
            Playback::Single(single) => single.time,
            Playback::BlendTree(blend) => blend.nodes[0].time,
        };
    }

    pub fn play_animation(&mut self, animation_index: usize, mix_time: f32, looping: bool, force: bool)
    {
        if !force &&
            (self.current_clip_index() == Some(animation_index) ||
                self.next_clip_index() == Some(animation_index))
        {
            return;
        }
        //while a crossfade is in flight no other animation may come in and blend as well
        if !force && self.next.is_some()
        {
            return;
        }

        assert!(animation_index < self.animations.num_clips(), "Animation index {} is out of range.", animation_index);

        let playback = Playback::Single(SinglePlayback { clip: animation_index, time: 0.0 });
        if mix_time > 0.0
        {
            self.next = Some(playback);
            self.looping_next = looping;
        }
        else
        {
            self.current = playback;
            self.looping_current = looping;
            self.next = None;
        }
        self.mix_time = mix_time;
        self.total_mix_time = mix_time;

        self.rebuild_node_cache();
    }

    pub fn play_blend_tree(&mut self, entries: [BlendTreeEntry; 2], mix_time: f32, looping: bool)
    {
        for entry in &entries
        {
            assert!(entry.clip_index < self.animations.num_clips(), "Animation index {} is out of range.", entry.clip_index);
        }

        let playback = Playback::BlendTree(BlendTreePlayback
        {
            nodes:
            [
                BlendNode { clip: entries[0].clip_index, threshold: entries[0].threshold, time: 0.0 },
                BlendNode { clip: entries[1].clip_index, threshold: entries[1].threshold, time: 0.0 },
            ],
            mix: NormalizedFloat::zero(),
        });
        if mix_time > 0.0
        {
            self.next = Some(playback);
            self.looping_next = looping;
        }
        else
        {
            self.current = playback;
            self.looping_current = looping;
            self.next = None;
        }
        self.mix_time = mix_time;
        self.total_mix_time = mix_time;

        self.rebuild_node_cache();
    }

    //feeds the raw driver value of the active blend tree. The value is
    //normalized against the two entry thresholds before it is used as a mix
    pub fn set_blend_tree_value(&mut self, value: f32)
    {
        if let Playback::BlendTree(blend) = &mut self.current
        {
            blend.mix = blend_mix(value, blend.nodes[0].threshold, blend.nodes[1].threshold);
        }
        if let Some(Playback::BlendTree(blend)) = &mut self.next
        {
            blend.mix = blend_mix(value, blend.nodes[0].threshold, blend.nodes[1].threshold);
        }
    }

    //lookahead test: does the current clip run past its end within delta_time?
    //Callers use this to transition on the frame a clip completes instead of a
    //frame late. Always false for a clip that is not the current one, and for
    //blend trees
    pub fn is_animation_finished(&self, animation_index: usize, delta_time: f32) -> bool
    {
        if let Playback::Single(single) = &self.current
        {
            if single.clip != animation_index
            {
                return false;
            }
            let clip = self.animations.clip(single.clip);
            let time = single.time + clip.ticks_per_second() * delta_time * self.animation_speed;
            return time >= clip.duration();
        }
        return false;
    }

    pub fn update_animation(&mut self, delta_time: f32)
    {
        let delta_time = delta_time * self.animation_speed;
        let animations = self.animations.clone();

        advance_playback(&mut self.current, self.looping_current, delta_time, animations.as_ref());

        if let Some(next) = &mut self.next
        {
            advance_playback(next, self.looping_next, delta_time, animations.as_ref());
            self.mix_time -= delta_time;
        }
        if self.next.is_some() && self.mix_time <= 0.0
        {
            //the crossfade ran its course, the target becomes the steady animation
            self.current = self.next.take().unwrap();
            self.looping_current = self.looping_next;
            self.mix_time = -1.0;
            self.total_mix_time = -1.0;
            self.rebuild_node_cache();
        }

        self.evaluate_pose();
    }

    pub fn get_bone_transformation(&self, bone_name: &str) -> Option<KeptBone>
    {
        return match self.kept_bone_indices.get(bone_name)
        {
            Some(index) => self.kept_bones[*index],
            None => None,
        };
    }

    //overrides a kept bone's world transform after evaluation, rewriting its
    //palette entry so the externally posed bone shows up in the next draw.
    //Unknown or never-resolved names are ignored
    pub fn set_bone_transformation(&mut self, bone_name: &str, transformation: Mat4)
    {
        let slot = match self.kept_bone_indices.get(bone_name)
        {
            Some(index) => *index,
            None => return,
        };
        if let Some(kept) = &mut self.kept_bones[slot]
        {
            kept.global_transform = transformation;
            let root_inverse = self.animations.clip(primary_clip(&self.current)).root_inverse();
            self.final_bone_matrices[kept.bone_id] = root_inverse * transformation * kept.offset;
        }
    }

    fn rebuild_node_cache(&mut self)
    {
        let animations = self.animations.clone();
        self.node_cache.clear();
        for node in animations.skeleton().nodes()
        {
            let bone = animations.bone_info(&node.name).copied();
            let kept = match bone
            {
                Some(_) => self.kept_bone_indices.get(&node.name).copied(),
                None => None,
            };
            self.node_cache.push(NodeCache
            {
                current_tracks: playback_tracks(&self.current, animations.as_ref(), &node.name),
                next_tracks: match &self.next
                {
                    Some(next) => playback_tracks(next, animations.as_ref(), &node.name),
                    None => [None, None],
                },
                bone: bone,
                kept: kept,
            });
        }
    }

    fn evaluate_pose(&mut self)
    {
        let animations = self.animations.clone();
        let skeleton = animations.skeleton();
        let root_inverse = animations.clip(primary_clip(&self.current)).root_inverse();
        let crossfade = match &self.next
        {
            Some(_) => NormalizedFloat::clamped(1.0 - self.mix_time / self.total_mix_time),
            None => NormalizedFloat::zero(),
        };

        let mut global_transforms: Vec<Mat4> = Vec::with_capacity(skeleton.num_nodes());
        for (node_index, node) in skeleton.nodes().iter().enumerate()
        {
            let parent_transform = match node.parent
            {
                Some(parent) => global_transforms[parent],
                None => Mat4::IDENTITY,
            };

            let cache = self.node_cache[node_index];
            let mut node_transform = node.local_transform;
            if let Some(pose) = sample_playback(&self.current, &cache.current_tracks, animations.as_ref())
            {
                let mut mixed = pose;
                if crossfade.get_val() > 0.0
                {
                    if let Some(next) = &self.next
                    {
                        if let Some(next_pose) = sample_playback(next, &cache.next_tracks, animations.as_ref())
                        {
                            mixed = pose.mix(&next_pose, crossfade.get_val());
                        }
                    }
                }
                node_transform = mixed.to_matrix();
            }

            let global_transform = parent_transform * node_transform;
            global_transforms.push(global_transform);

            if let Some(bone) = cache.bone
            {
                self.final_bone_matrices[bone.id] = root_inverse * global_transform * bone.offset;
                if let Some(kept_slot) = cache.kept
                {
                    self.kept_bones[kept_slot] = Some(KeptBone
                    {
                        global_transform: global_transform,
                        bone_id: bone.id,
                        offset: bone.offset,
                        parent_transform: parent_transform,
                    });
                }
            }
        }
    }

    pub fn bone_matrix_store(&self) -> BoneMatrixStore
    {
        let mut store = BoneMatrixStore { matrices: [[0.0; 16]; MAX_BONES] };
        for (index, matrix) in self.final_bone_matrices.iter().enumerate()
        {
            store.matrices[index] = matrix.to_cols_array();
        }
        return store;
    }
}

//upload-ready copy of the skinning palette
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoneMatrixStore
{
    pub matrices: [[f32; 16]; MAX_BONES],
}

impl BoneMatrixStore
{
    pub fn as_bytes(&self) -> &[u8]
    {
        return bytemuck::bytes_of(self);
    }
}

fn primary_clip(playback: &Playback) -> usize
{
    return match playback
    {
        Playback::Single(single) => single.clip,
        Playback::BlendTree(blend) => blend.nodes[0].clip,
    };
}

fn playback_tracks(playback: &Playback, animations: &AnimationSet, node_name: &str) -> [Option<usize>; 2]
{
    return match playback
    {
        Playback::Single(single) =>
        [
            animations.clip(single.clip).find_track(node_name),
            None,
        ],
        Playback::BlendTree(blend) =>
        [
            animations.clip(blend.nodes[0].clip).find_track(node_name),
            animations.clip(blend.nodes[1].clip).find_track(node_name),
        ],
    };
}

fn advance_playback(playback: &mut Playback, looping: bool, delta_time: f32, animations: &AnimationSet)
{
    match playback
    {
        Playback::Single(single) =>
        {
            let clip = animations.clip(single.clip);
            single.time = step_time(single.time, clip.ticks_per_second() * delta_time, clip.duration(), looping);
        },
        Playback::BlendTree(blend) =>
        {
            for node in &mut blend.nodes
            {
                let clip = animations.clip(node.clip);
                node.time = step_time(node.time, clip.ticks_per_second() * delta_time, clip.duration(), looping);
            }
        },
    }
}

fn step_time(time: f32, step: f32, duration: f32, looping: bool) -> f32
{
    let advanced = time + step;
    if looping
    {
        return advanced % duration;
    }
    return advanced.clamp(0.0, duration);
}

fn sample_playback(playback: &Playback, tracks: &[Option<usize>; 2], animations: &AnimationSet) -> Option<LocalPose>
{
    match playback
    {
        Playback::Single(single) =>
        {
            let track = match tracks[0]
            {
                Some(track) => track,
                None => return None,
            };
            return Some(animations.clip(single.clip).track(track).sample(single.time));
        },
        Playback::BlendTree(blend) =>
        {
            let track = match tracks[0]
            {
                Some(track) => track,
                None => return None,
            };
            let mut pose = animations.clip(blend.nodes[0].clip).track(track).sample(blend.nodes[0].time);
            if blend.mix.get_val() > 0.0
            {
                if let Some(other) = tracks[1]
                {
                    let other_pose = animations.clip(blend.nodes[1].clip).track(other).sample(blend.nodes[1].time);
                    pose = pose.mix(&other_pose, blend.mix.get_val());
                }
            }
            return Some(pose);
        },
    }
}

fn blend_mix(value: f32, border_0: f32, border_1: f32) -> NormalizedFloat
{
    let span = border_1 - border_0;
    if span.abs() <= f32::EPSILON
    {
        return NormalizedFloat::zero();
    }
    return NormalizedFloat::clamped((value - border_0) / span);
}
