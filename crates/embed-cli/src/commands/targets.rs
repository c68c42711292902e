//! Targets command - list the named tasks with their descriptions

use super::pipeline;
use crate::config::ProjectArgs;
use anyhow::Result;

pub fn run(args: &ProjectArgs, json: bool) -> Result<()> {
    let pipeline = pipeline(args)?;
    let tasks = pipeline.graph().task_descriptions();

    if json {
        let entries: Vec<_> = tasks
            .iter()
            .map(|(name, description)| {
                serde_json::json!({ "name": name, "description": description })
            })
            .collect();
        println!("{}", serde_json::Value::Array(entries));
        return Ok(());
    }

    let width = tasks.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, description) in tasks {
        match description {
            Some(description) => println!("embed {:<width$}  # {}", name, description),
            None => println!("embed {}", name),
        }
    }
    Ok(())
}
