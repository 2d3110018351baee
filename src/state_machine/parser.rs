use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::ComparisonOperator;
use super::config::{BlendConfig, ConditionConfig, ConditionGroupConfig, ConfigError, NodeConfig, StateMachineConfig, VariableConfig};

#[derive(Parser)]
#[grammar = "statemachine.pest"]
struct StateMachineParser;

pub fn parse_state_machine(source: &str) -> Result<StateMachineConfig, ConfigError>
{
    let mut parsed = match StateMachineParser::parse(Rule::state_machine, source)
    {
        Ok(parsed) => parsed,
        Err(err) => return Err(ConfigError::Parse(err.to_string())),
    };

    let mut included_animations: Vec<String> = vec![];
    let mut variables: Vec<VariableConfig> = vec![];
    let mut nodes: Vec<NodeConfig> = vec![];
    let mut start_node_name: Option<String> = None;
    let mut has_anims_section = false;
    let mut has_vars_section = false;

    for pair in parsed.next().unwrap().into_inner()
    {
        match pair.as_rule()
        {
            Rule::anims_section =>
            {
                has_anims_section = true;
                for name in pair.into_inner()
                {
                    included_animations.push(parse_string(name));
                }
            },
            Rule::vars_section =>
            {
                has_vars_section = true;
                for var in pair.into_inner()
                {
                    variables.push(parse_variable(var));
                }
            },
            Rule::node_decl =>
            {
                nodes.push(parse_node(pair));
            },
            Rule::start_decl =>
            {
                start_node_name = Some(parse_string(pair.into_inner().next().unwrap()));
            },
            _ => (),
        }
    }

    if !has_anims_section
    {
        return Err(ConfigError::MissingSection("anims"));
    }
    if !has_vars_section
    {
        return Err(ConfigError::MissingSection("vars"));
    }
    if nodes.is_empty()
    {
        return Err(ConfigError::MissingSection("node"));
    }

    //a missing start declaration falls back to the first declared node
    let start_node_index = match &start_node_name
    {
        Some(name) => match nodes.iter().position(|node| &node.name == name)
        {
            Some(index) => index,
            None => return Err(ConfigError::UnknownNode(name.clone())),
        },
        None => 0,
    };

    return Ok(StateMachineConfig
    {
        included_animations: included_animations,
        variables: variables,
        nodes: nodes,
        start_node_index: start_node_index,
    });
}

fn parse_node(pair: Pair<Rule>) -> NodeConfig
{
    let mut parts = pair.into_inner();
    let name = parse_string(parts.next().unwrap());

    let mut animation = String::new();
    let mut blend: Option<BlendConfig> = None;
    let mut loop_animation = true;
    let mut wait_for_animation_finish = false;
    let mut transition_time = 0.0;
    let mut condition_groups: Vec<ConditionGroupConfig> = vec![];

    for field in parts
    {
        match field.as_rule()
        {
            Rule::anim_field =>
            {
                animation = parse_string(field.into_inner().next().unwrap());
            },
            Rule::blend_field =>
            {
                let mut blend_parts = field.into_inner();
                blend = Some(BlendConfig
                {
                    animation: parse_string(blend_parts.next().unwrap()),
                    variable: blend_parts.next().unwrap().as_str().to_string(),
                    boundary_1: parse_number(blend_parts.next().unwrap()),
                    boundary_2: parse_number(blend_parts.next().unwrap()),
                });
            },
            Rule::loop_field =>
            {
                loop_animation = field.into_inner().next().unwrap().as_str() == "true";
            },
            Rule::hold_field =>
            {
                wait_for_animation_finish = field.into_inner().next().unwrap().as_str() == "true";
            },
            Rule::time_field =>
            {
                transition_time = parse_number(field.into_inner().next().unwrap());
            },
            Rule::group_field =>
            {
                condition_groups.push(parse_condition_group(field));
            },
            _ => (),
        }
    }

    return NodeConfig
    {
        name: name,
        animation: animation,
        blend: blend,
        loop_animation: loop_animation,
        wait_for_animation_finish: wait_for_animation_finish,
        transition_time: transition_time,
        condition_groups: condition_groups,
    };
}

fn parse_condition_group(pair: Pair<Rule>) -> ConditionGroupConfig
{
    let mut conditions: Vec<ConditionConfig> = vec![];
    for condition in pair.into_inner()
    {
        match condition.as_rule()
        {
            Rule::node_ref_condition =>
            {
                let mut parts = condition.into_inner();
                let operator = parse_comparison(parts.next().unwrap());
                let node = parse_string(parts.next().unwrap());
                conditions.push(ConditionConfig::CurrentNode { operator: operator, node: node });
            },
            Rule::compare_condition =>
            {
                let mut parts = condition.into_inner();
                let variable = parts.next().unwrap().as_str().to_string();
                let operator = parse_comparison(parts.next().unwrap());
                let value = parse_number(parts.next().unwrap());
                conditions.push(ConditionConfig::Compare { variable: variable, operator: operator, value: value });
            },
            _ => (),
        }
    }
    return ConditionGroupConfig { conditions: conditions };
}

fn parse_variable(pair: Pair<Rule>) -> VariableConfig
{
    let mut parts = pair.into_inner();
    let name = parts.next().unwrap().as_str().to_string();
    let initial_value = parse_number(parts.next().unwrap());
    return VariableConfig { name: name, initial_value: initial_value };
}

fn parse_comparison(pair: Pair<Rule>) -> ComparisonOperator
{
    return match pair.as_str()
    {
        "==" => ComparisonOperator::Equal,
        "!=" => ComparisonOperator::NotEqual,
        "<" => ComparisonOperator::Lesser,
        ">" => ComparisonOperator::Greater,
        "<=" => ComparisonOperator::LesserEqual,
        ">=" => ComparisonOperator::GreaterEqual,
        //should never happen
        _ => ComparisonOperator::Equal,
    };
}

fn parse_number(pair: Pair<Rule>) -> f32
{
    return pair.as_str().trim().parse::<f32>().unwrap();
}

fn parse_string(pair: Pair<Rule>) -> String
{
    return pair.into_inner().next().unwrap().as_str().to_string();
}
