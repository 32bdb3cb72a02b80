//! One-shot assignment commands
//!
//! Values are plain strings on the command line. Results are printed to stdout as
//! JSON; logs go to stderr.

use clap::Subcommand;
use serde_json::json;

use crate::cli::CliOptions;
use crate::domain::experiment::{
    Variables, WeightedSet, DEFAULT_INCLUSION_PROBABILITY,
};
use crate::AssignmentEngine;

#[derive(Subcommand)]
pub enum ResolveCommand {
    /// Weighted split; conditions are `value` or `value=weight`
    Split {
        name: String,
        #[arg(value_parser = parse_weight)]
        conditions: Vec<(String, f64)>,
    },

    /// A/B test between two values
    Binary { name: String, a: String, b: String },

    /// Multivariate test; variables are `value` or `value=probability`
    Multivariate {
        name: String,
        #[arg(value_parser = parse_probability)]
        variables: Vec<(String, f64)>,
    },
}

/// Resolve an experiment and print the outcome
pub async fn resolve(options: CliOptions, command: ResolveCommand) -> anyhow::Result<()> {
    let engine = open_engine(&options).await?;
    let output = run_resolve(&engine, command).await?;

    print_json(&output)
}

/// Print the stored assignment for `name`
pub async fn show(options: CliOptions, name: &str) -> anyhow::Result<()> {
    let engine = open_engine(&options).await?;

    match engine.assignment(name).await? {
        Some(record) => print_json(&serde_json::to_value(record)?),
        None => anyhow::bail!("No assignment for experiment '{}'", name),
    }
}

/// Print every stored assignment, ordered by name
pub async fn list(options: CliOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;
    let assignments = crate::open_assignments(&config.storage).await?;

    let mut records = assignments.list().await?;
    records.sort_by(|a, b| a.name().cmp(b.name()));

    print_json(&serde_json::to_value(records)?)
}

/// Reset `name` and report whether an assignment existed
pub async fn reset(options: CliOptions, name: &str) -> anyhow::Result<()> {
    let engine = open_engine(&options).await?;
    let reset = engine.reset(name).await?;

    print_json(&json!({ "name": name, "reset": reset }))
}

async fn open_engine(options: &CliOptions) -> anyhow::Result<AssignmentEngine> {
    let config = options.load_config()?;
    let assignments = crate::open_assignments(&config.storage).await?;

    Ok(crate::create_engine(assignments))
}

async fn run_resolve(
    engine: &AssignmentEngine,
    command: ResolveCommand,
) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        ResolveCommand::Split { name, conditions } => {
            let conditions: WeightedSet<String> = conditions.into_iter().collect();
            let condition = engine.resolve_split(&name, &conditions).await?;
            json!({ "name": name, "kind": "weighted_split", "condition": condition })
        }
        ResolveCommand::Binary { name, a, b } => {
            let condition = engine.resolve_binary(&name, a, b).await?;
            json!({ "name": name, "kind": "binary", "condition": condition })
        }
        ResolveCommand::Multivariate { name, variables } => {
            let variables: Variables<String> = variables.into_iter().collect();
            let included = engine.resolve_multivariate(&name, &variables).await?;
            json!({ "name": name, "kind": "multivariate", "variables": included.into_vec() })
        }
    };

    Ok(output)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_weight(arg: &str) -> Result<(String, f64), String> {
    Ok(split_number(arg).unwrap_or_else(|| (arg.to_string(), 1.0)))
}

fn parse_probability(arg: &str) -> Result<(String, f64), String> {
    Ok(split_number(arg).unwrap_or_else(|| (arg.to_string(), DEFAULT_INCLUSION_PROBABILITY)))
}

/// `value=number`, split at the last `=`; None when the suffix is not a number
fn split_number(arg: &str) -> Option<(String, f64)> {
    let (value, number) = arg.rsplit_once('=')?;
    let number = number.trim().parse::<f64>().ok()?;

    Some((value.to_string(), number))
}
