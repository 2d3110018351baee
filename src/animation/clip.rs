use std::collections::HashMap;

use glam::{Vec3, Quat, Mat4};

use super::animator::MAX_BONES;

pub trait Interpolate : Copy
{
    fn interpolate(&self, rhs: &Self, t: f32) -> Self;
}

impl Interpolate for Vec3
{
    fn interpolate(&self, rhs: &Self, t: f32) -> Self
    {
        return self.lerp(rhs.clone(), t);
    }
}

impl Interpolate for Quat
{
    fn interpolate(&self, rhs: &Self, t: f32) -> Self
    {
        return self.slerp(rhs.clone(), t);
    }
}

#[derive(Clone, Copy)]
pub struct Keyframe<T : Interpolate>
{
    pub value : T,
    pub timestamp : f32,
}

//one keyed curve of an animated bone. Timestamps are in clip ticks and non-decreasing
pub struct Channel<T : Interpolate>
{
    keys : Vec<Keyframe<T>>,
}

impl<T : Interpolate> Channel<T>
{
    pub fn new(keys : Vec<Keyframe<T>>) -> Channel<T>
    {
        if keys.is_empty()
        {
            panic!("Attempted to create an animation channel with no keyframes. A bone with no data for this channel should be excluded from the track instead.");
        }
        return Channel { keys: keys };
    }

    pub fn sample(&self, time: f32) -> T
    {
        //constant channels skip the segment search
        if self.keys.len() == 1
        {
            return self.keys[0].value;
        }
        let segment = self.segment_index(time);
        let start = self.keys[segment];
        let end = self.keys[segment + 1];
        let span = end.timestamp - start.timestamp;
        if span <= 0.0
        {
            return start.value;
        }
        //times outside the keyed range land on the nearest key instead of extrapolating
        let factor = ((time - start.timestamp) / span).clamp(0.0, 1.0);
        return start.value.interpolate(&end.value, factor);
    }

    fn segment_index(&self, time: f32) -> usize
    {
        for i in 0..self.keys.len() - 1
        {
            if time < self.keys[i + 1].timestamp
            {
                return i;
            }
        }
        return self.keys.len() - 2;
    }
}

#[derive(Clone, Copy)]
pub struct LocalPose
{
    pub location: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl LocalPose
{
    pub fn mix(&self, other: &LocalPose, t: f32) -> LocalPose
    {
        return LocalPose
        {
            location: self.location.lerp(other.location, t),
            orientation: self.orientation.slerp(other.orientation, t),
            scale: self.scale.lerp(other.scale, t),
        };
    }

    pub fn to_matrix(&self) -> Mat4
    {
        return Mat4::from_scale_rotation_translation(self.scale, self.orientation.normalize(), self.location);
    }
}

//the keyframed position/rotation/scale curves of one bone within one clip
pub struct BoneTrack
{
    positions: Channel<Vec3>,
    rotations: Channel<Quat>,
    scales: Channel<Vec3>,
}

impl BoneTrack
{
    pub fn new(positions: Vec<Keyframe<Vec3>>, rotations: Vec<Keyframe<Quat>>, scales: Vec<Keyframe<Vec3>>) -> BoneTrack
    {
        return BoneTrack
        {
            positions: Channel::new(positions),
            rotations: Channel::new(rotations),
            scales: Channel::new(scales),
        };
    }

    pub fn sample(&self, time: f32) -> LocalPose
    {
        return LocalPose
        {
            location: self.positions.sample(time),
            orientation: self.rotations.sample(time),
            scale: self.scales.sample(time),
        };
    }
}

//skinning binding of a node: stable palette index plus the inverse bind matrix
#[derive(Clone, Copy)]
pub struct BoneInfo
{
    pub id: usize,
    pub offset: Mat4,
}

pub struct SkeletonNode
{
    pub name: String,
    pub local_transform: Mat4,
    pub parent: Option<usize>,
}

//the imported node tree flattened so that every parent precedes its children.
//Not every node is a skinned bone - unbound nodes still contribute their bind
//transform to the hierarchy walk
pub struct Skeleton
{
    nodes: Vec<SkeletonNode>,
}

impl Skeleton
{
    pub fn new(nodes: Vec<SkeletonNode>) -> Skeleton
    {
        for (index, node) in nodes.iter().enumerate()
        {
            if let Some(parent) = node.parent
            {
                if parent >= index
                {
                    panic!("Skeleton nodes must be ordered parent-first. Node \"{}\" at {} points at parent {}.", node.name, index, parent);
                }
            }
        }
        return Skeleton { nodes: nodes };
    }

    pub fn nodes(&self) -> &Vec<SkeletonNode>
    {
        return &self.nodes;
    }

    pub fn num_nodes(&self) -> usize
    {
        return self.nodes.len();
    }
}

pub struct SkeletonBuilder
{
    nodes: Vec<SkeletonNode>,
}

impl SkeletonBuilder
{
    pub fn new() -> Self
    {
        return SkeletonBuilder { nodes: vec![] };
    }

    pub fn add_root(&mut self, name: &str, local_transform: Mat4) -> usize
    {
        self.nodes.push(SkeletonNode { name: name.to_string(), local_transform: local_transform, parent: None });
        return self.nodes.len() - 1;
    }

    pub fn add_child(&mut self, parent: usize, name: &str, local_transform: Mat4) -> usize
    {
        if parent >= self.nodes.len()
        {
            panic!("Attempted to parent skeleton node \"{}\" to missing node {}.", name, parent);
        }
        self.nodes.push(SkeletonNode { name: name.to_string(), local_transform: local_transform, parent: Some(parent) });
        return self.nodes.len() - 1;
    }

    pub fn build(self) -> Skeleton
    {
        return Skeleton::new(self.nodes);
    }
}

//one named animation: duration and rate in ticks, the root-inverse matrix that
//cancels the scene root transform, and a track per animated bone
pub struct AnimationClip
{
    name: String,
    duration: f32,
    ticks_per_second: f32,
    root_inverse: Mat4,
    tracks: Vec<BoneTrack>,
    track_indices: HashMap<String, usize>,
}

impl AnimationClip
{
    pub fn new(name: &str, duration: f32, ticks_per_second: f32, root_inverse: Mat4, tracks: Vec<(String, BoneTrack)>) -> AnimationClip
    {
        if duration <= 0.0 || ticks_per_second <= 0.0
        {
            panic!("Animation clip \"{}\" must have a positive duration and tick rate.", name);
        }
        let mut track_list = vec![];
        let mut track_indices = HashMap::new();
        for (bone_name, track) in tracks
        {
            track_indices.insert(bone_name, track_list.len());
            track_list.push(track);
        }
        return AnimationClip
        {
            name: name.to_string(),
            duration: duration,
            ticks_per_second: ticks_per_second,
            root_inverse: root_inverse,
            tracks: track_list,
            track_indices: track_indices,
        };
    }

    pub fn name(&self) -> &str
    {
        return &self.name;
    }

    pub fn duration(&self) -> f32
    {
        return self.duration;
    }

    pub fn ticks_per_second(&self) -> f32
    {
        return self.ticks_per_second;
    }

    pub fn root_inverse(&self) -> Mat4
    {
        return self.root_inverse;
    }

    pub fn find_track(&self, bone_name: &str) -> Option<usize>
    {
        return self.track_indices.get(bone_name).copied();
    }

    pub fn track(&self, index: usize) -> &BoneTrack
    {
        return &self.tracks[index];
    }
}

//everything the animator needs for one model: the shared skeleton, the shared
//bone bindings and the clip list. Clips are referred to by index from here on
pub struct AnimationSet
{
    skeleton: Skeleton,
    bone_info: HashMap<String, BoneInfo>,
    clips: Vec<AnimationClip>,
}

impl AnimationSet
{
    pub fn new(skeleton: Skeleton, bone_info: HashMap<String, BoneInfo>, clips: Vec<AnimationClip>) -> AnimationSet
    {
        for (name, info) in &bone_info
        {
            if info.id >= MAX_BONES
            {
                panic!("Bone \"{}\" has id {} past the palette limit of {}.", name, info.id, MAX_BONES);
            }
        }
        return AnimationSet
        {
            skeleton: skeleton,
            bone_info: bone_info,
            clips: clips,
        };
    }

    pub fn skeleton(&self) -> &Skeleton
    {
        return &self.skeleton;
    }

    pub fn bone_info(&self, bone_name: &str) -> Option<&BoneInfo>
    {
        return self.bone_info.get(bone_name);
    }

    pub fn clip(&self, index: usize) -> &AnimationClip
    {
        return &self.clips[index];
    }

    pub fn clip_index(&self, name: &str) -> Option<usize>
    {
        return self.clips.iter().position(|clip| clip.name() == name);
    }

    pub fn num_clips(&self) -> usize
    {
        return self.clips.len();
    }
}
