pub mod config;
pub mod parser;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::animation::animator::{Animator, BlendTreeEntry};
use crate::logger::Logger;

use self::config::{CompiledStateMachine, ConfigError, StateMachineConfig};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComparisonOperator
{
    Equal,
    NotEqual,
    Lesser,
    Greater,
    LesserEqual,
    GreaterEqual,
}

impl ComparisonOperator
{
    fn passes(&self, value: f32, compare_to: f32) -> bool
    {
        return match self
        {
            ComparisonOperator::Equal => value == compare_to,
            ComparisonOperator::NotEqual => value != compare_to,
            ComparisonOperator::Lesser => value < compare_to,
            ComparisonOperator::Greater => value > compare_to,
            ComparisonOperator::LesserEqual => value <= compare_to,
            ComparisonOperator::GreaterEqual => value >= compare_to,
        };
    }
}

#[derive(Clone, Copy)]
pub struct TransitionCondition
{
    pub variable_index: usize,
    pub comparison_operator: ComparisonOperator,
    pub compare_to_value: f32,
}

//conditions within a group are ANDed, groups on a transition are ORed
#[derive(Clone)]
pub struct TransitionConditionGroup
{
    pub conditions: Vec<TransitionCondition>,
}

#[derive(Clone)]
pub struct Transition
{
    pub to_node_index: usize,
    pub condition_groups: Vec<TransitionConditionGroup>,
}

#[derive(Clone, Copy)]
pub struct BlendAnimation
{
    pub animation_index: usize,
    pub variable_index: usize,
    pub blend_boundary_1: f32,
    pub blend_boundary_2: f32,
}

#[derive(Clone)]
pub struct StateMachineNode
{
    pub name: String,
    pub animation_index: usize,
    pub blend: Option<BlendAnimation>,
    pub loop_animation: bool,
    pub wait_for_animation_finish: bool,
    pub transition_time: f32,
    pub transitions: Vec<Transition>,
}

#[derive(Debug)]
pub enum StateMachineError
{
    UnknownVariable(String),
}

impl std::error::Error for StateMachineError {}

impl fmt::Display for StateMachineError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            StateMachineError::UnknownVariable(name) => write!(f, "No state machine variable named \"{}\"", name),
        }
    }
}

//drives an animator from a compiled node graph and a pool of float variables
//that gameplay code writes into every frame
pub struct AnimatorStateMachine
{
    animator: Animator,
    variable_indices: HashMap<String, usize>,
    variable_values: Vec<f32>,
    current_node: usize,
    nodes: Vec<StateMachineNode>,
}

impl AnimatorStateMachine
{
    pub fn compile(config: &StateMachineConfig, animator: Animator) -> Result<AnimatorStateMachine, ConfigError>
    {
        let compiled = config.compile(animator.animation_set())?;
        return Ok(AnimatorStateMachine::from_compiled(compiled, animator));
    }

    //parses and compiles the given source. A rejected config is logged and
    //leaves the machine inert: no nodes, no variables, updates still tick the
    //animator so whatever was playing keeps playing
    pub fn load(source: &str, animator: Animator, logger: &dyn Logger) -> AnimatorStateMachine
    {
        let compiled = parser::parse_state_machine(source)
            .and_then(|config| config.compile(animator.animation_set()));
        return match compiled
        {
            Ok(compiled) => AnimatorStateMachine::from_compiled(compiled, animator),
            Err(err) =>
            {
                logger.log_error(&format!("Animator state machine config rejected: {}", err));
                AnimatorStateMachine
                {
                    animator: animator,
                    variable_indices: HashMap::new(),
                    variable_values: vec![],
                    current_node: 0,
                    nodes: vec![],
                }
            },
        };
    }

    pub fn load_file(path: &Path, animator: Animator, logger: &dyn Logger) -> anyhow::Result<AnimatorStateMachine>
    {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state machine file {}", path.display()))?;
        return Ok(AnimatorStateMachine::load(&source, animator, logger));
    }

    fn from_compiled(compiled: CompiledStateMachine, animator: Animator) -> AnimatorStateMachine
    {
        let start_node = compiled.start_node;
        let mut machine = AnimatorStateMachine
        {
            animator: animator,
            variable_indices: compiled.variable_indices,
            variable_values: compiled.variable_values,
            current_node: start_node,
            nodes: compiled.nodes,
        };
        machine.move_to_node(start_node);
        return machine;
    }

    pub fn update_state_machine(&mut self, delta_time: f32)
    {
        if !self.nodes.is_empty()
        {
            let node = &self.nodes[self.current_node];
            if !node.wait_for_animation_finish ||
                self.animator.is_animation_finished(node.animation_index, delta_time)
            {
                let mut target: Option<usize> = None;
                'transitions: for transition in &node.transitions
                {
                    for group in &transition.condition_groups
                    {
                        let mut group_passes = true;
                        for condition in &group.conditions
                        {
                            group_passes &= condition.comparison_operator.passes(
                                self.variable_values[condition.variable_index],
                                condition.compare_to_value);
                        }
                        if group_passes
                        {
                            target = Some(transition.to_node_index);
                            break 'transitions;
                        }
                    }
                }
                if let Some(target) = target
                {
                    self.move_to_node(target);
                }
            }

            let node = &self.nodes[self.current_node];
            if let Some(blend) = node.blend
            {
                self.animator.set_blend_tree_value(self.variable_values[blend.variable_index]);
            }
        }

        self.animator.update_animation(delta_time);
    }

    pub fn set_variable(&mut self, variable_name: &str, value: f32) -> Result<(), StateMachineError>
    {
        return match self.variable_indices.get(variable_name)
        {
            Some(index) =>
            {
                self.variable_values[*index] = value;
                Ok(())
            },
            None => Err(StateMachineError::UnknownVariable(variable_name.to_string())),
        };
    }

    pub fn get_variable(&self, variable_name: &str) -> Option<f32>
    {
        return self.variable_indices.get(variable_name).map(|index| self.variable_values[*index]);
    }

    pub fn current_node_index(&self) -> Option<usize>
    {
        if self.nodes.is_empty()
        {
            return None;
        }
        return Some(self.current_node);
    }

    pub fn current_node_name(&self) -> Option<&str>
    {
        return self.nodes.get(self.current_node).map(|node| node.name.as_str());
    }

    pub fn animator(&self) -> &Animator
    {
        return &self.animator;
    }

    pub fn animator_mut(&mut self) -> &mut Animator
    {
        return &mut self.animator;
    }

    fn move_to_node(&mut self, node_index: usize)
    {
        self.current_node = node_index;

        let node = &self.nodes[node_index];
        match node.blend
        {
            Some(blend) =>
            {
                self.animator.play_blend_tree
                (
                    [
                        BlendTreeEntry { clip_index: node.animation_index, threshold: blend.blend_boundary_1 },
                        BlendTreeEntry { clip_index: blend.animation_index, threshold: blend.blend_boundary_2 },
                    ],
                    node.transition_time,
                    node.loop_animation,
                );
            },
            None =>
            {
                self.animator.play_animation(node.animation_index, node.transition_time, node.loop_animation, false);
            },
        }
    }
}
