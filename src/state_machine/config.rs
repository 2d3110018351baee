use std::collections::HashMap;
use std::fmt;

use crate::animation::clip::AnimationSet;

use super::{BlendAnimation, ComparisonOperator, StateMachineNode, Transition, TransitionCondition, TransitionConditionGroup};

#[derive(Debug)]
pub enum ConfigError
{
    Parse(String),
    MissingSection(&'static str),
    UnknownAnimation(String),
    UnknownVariable(String),
    UnknownNode(String),
    DuplicateVariable(String),
    DuplicateNode(String),
    InvalidStartNode(usize),
    InvalidNodeReference(String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            ConfigError::Parse(desc) => write!(f, "Could not parse state machine source: {}", desc),
            ConfigError::MissingSection(section) => write!(f, "Required section \"{}\" is missing", section),
            ConfigError::UnknownAnimation(name) => write!(f, "Animation \"{}\" is not part of the animation set", name),
            ConfigError::UnknownVariable(name) => write!(f, "Variable \"{}\" was never declared", name),
            ConfigError::UnknownNode(name) => write!(f, "Node \"{}\" was never declared", name),
            ConfigError::DuplicateVariable(name) => write!(f, "Variable \"{}\" is declared twice", name),
            ConfigError::DuplicateNode(name) => write!(f, "Node \"{}\" is declared twice", name),
            ConfigError::InvalidStartNode(index) => write!(f, "Start node index {} is out of range", index),
            ConfigError::InvalidNodeReference(name) => write!(f, "Node reference condition on \"{}\" only supports == and !=", name),
        }
    }
}

pub struct VariableConfig
{
    pub name: String,
    pub initial_value: f32,
}

pub struct BlendConfig
{
    pub animation: String,
    pub variable: String,
    pub boundary_1: f32,
    pub boundary_2: f32,
}

pub enum ConditionConfig
{
    Compare { variable: String, operator: ComparisonOperator, value: f32 },
    //matches against the node the machine is currently in rather than a
    //variable. Compiles into the set of nodes the enclosing group applies to
    CurrentNode { operator: ComparisonOperator, node: String },
}

pub struct ConditionGroupConfig
{
    pub conditions: Vec<ConditionConfig>,
}

pub struct NodeConfig
{
    pub name: String,
    pub animation: String,
    pub blend: Option<BlendConfig>,
    pub loop_animation: bool,
    pub wait_for_animation_finish: bool,
    pub transition_time: f32,
    //groups guarding entry INTO this node, authored here and attached to the
    //other nodes' outgoing transition lists at compile time
    pub condition_groups: Vec<ConditionGroupConfig>,
}

pub struct StateMachineConfig
{
    pub included_animations: Vec<String>,
    pub variables: Vec<VariableConfig>,
    pub nodes: Vec<NodeConfig>,
    pub start_node_index: usize,
}

pub struct CompiledStateMachine
{
    pub variable_indices: HashMap<String, usize>,
    pub variable_values: Vec<f32>,
    pub nodes: Vec<StateMachineNode>,
    pub start_node: usize,
}

impl StateMachineConfig
{
    //resolves every clip, variable and node name to an index and expands each
    //authored condition group into concrete transitions on the nodes it can
    //fire from
    pub fn compile(&self, animations: &AnimationSet) -> Result<CompiledStateMachine, ConfigError>
    {
        let mut variable_indices: HashMap<String, usize> = HashMap::new();
        let mut variable_values: Vec<f32> = vec![];
        for variable in &self.variables
        {
            if variable_indices.insert(variable.name.clone(), variable_values.len()).is_some()
            {
                return Err(ConfigError::DuplicateVariable(variable.name.clone()));
            }
            variable_values.push(variable.initial_value);
        }

        let mut animation_indices: HashMap<String, usize> = HashMap::new();
        for name in &self.included_animations
        {
            match animations.clip_index(name)
            {
                Some(index) =>
                {
                    animation_indices.insert(name.clone(), index);
                },
                None => return Err(ConfigError::UnknownAnimation(name.clone())),
            }
        }

        let mut node_indices: HashMap<String, usize> = HashMap::new();
        let mut nodes: Vec<StateMachineNode> = vec![];
        for node_config in &self.nodes
        {
            if node_indices.insert(node_config.name.clone(), nodes.len()).is_some()
            {
                return Err(ConfigError::DuplicateNode(node_config.name.clone()));
            }

            let animation_index = match animation_indices.get(&node_config.animation)
            {
                Some(index) => *index,
                None => return Err(ConfigError::UnknownAnimation(node_config.animation.clone())),
            };

            let blend = match &node_config.blend
            {
                Some(blend_config) =>
                {
                    let blend_animation_index = match animation_indices.get(&blend_config.animation)
                    {
                        Some(index) => *index,
                        None => return Err(ConfigError::UnknownAnimation(blend_config.animation.clone())),
                    };
                    let variable_index = match variable_indices.get(&blend_config.variable)
                    {
                        Some(index) => *index,
                        None => return Err(ConfigError::UnknownVariable(blend_config.variable.clone())),
                    };
                    Some(BlendAnimation
                    {
                        animation_index: blend_animation_index,
                        variable_index: variable_index,
                        blend_boundary_1: blend_config.boundary_1,
                        blend_boundary_2: blend_config.boundary_2,
                    })
                },
                None => None,
            };

            nodes.push(StateMachineNode
            {
                name: node_config.name.clone(),
                animation_index: animation_index,
                blend: blend,
                loop_animation: node_config.loop_animation,
                wait_for_animation_finish: node_config.wait_for_animation_finish,
                transition_time: node_config.transition_time,
                transitions: vec![],
            });
        }

        if nodes.is_empty()
        {
            return Err(ConfigError::MissingSection("node"));
        }
        if self.start_node_index >= nodes.len()
        {
            return Err(ConfigError::InvalidStartNode(self.start_node_index));
        }

        //expansion pass. A group declared on node N guards entry into N, so it
        //becomes a transition towards N on every node the group's node
        //reference conditions leave in play (never on N itself)
        for (node_index, node_config) in self.nodes.iter().enumerate()
        {
            for group_config in &node_config.condition_groups
            {
                let mut relevant: Vec<usize> = (0..nodes.len()).filter(|dex| *dex != node_index).collect();
                let mut conditions: Vec<TransitionCondition> = vec![];
                for condition_config in &group_config.conditions
                {
                    match condition_config
                    {
                        ConditionConfig::CurrentNode { operator, node } =>
                        {
                            let reference = match node_indices.get(node)
                            {
                                Some(dex) => *dex,
                                None => return Err(ConfigError::UnknownNode(node.clone())),
                            };
                            match operator
                            {
                                ComparisonOperator::Equal => relevant.retain(|dex| *dex == reference),
                                ComparisonOperator::NotEqual => relevant.retain(|dex| *dex != reference),
                                _ => return Err(ConfigError::InvalidNodeReference(node.clone())),
                            }
                        },
                        ConditionConfig::Compare { variable, operator, value } =>
                        {
                            let variable_index = match variable_indices.get(variable)
                            {
                                Some(index) => *index,
                                None => return Err(ConfigError::UnknownVariable(variable.clone())),
                            };
                            conditions.push(TransitionCondition
                            {
                                variable_index: variable_index,
                                comparison_operator: *operator,
                                compare_to_value: *value,
                            });
                        },
                    }
                }

                let group = TransitionConditionGroup { conditions: conditions };
                for dex in relevant
                {
                    let from_node = &mut nodes[dex];
                    match from_node.transitions.iter_mut().find(|transition| transition.to_node_index == node_index)
                    {
                        Some(transition) => transition.condition_groups.push(group.clone()),
                        None => from_node.transitions.push(Transition
                        {
                            to_node_index: node_index,
                            condition_groups: vec![group.clone()],
                        }),
                    }
                }
            }
        }

        return Ok(CompiledStateMachine
        {
            variable_indices: variable_indices,
            variable_values: variable_values,
            nodes: nodes,
            start_node: self.start_node_index,
        });
    }
}
