//! Model catalog commands

use anyhow::{Context, Result};
use benchmaker_application::InferenceGateway;
use benchmaker_domain::ModelInfo;

use crate::commands::CommandContext;
use crate::output::{colors, format_per_million, JsonFormatter, TableFormatter};
use crate::progress::spinner;

/// List models offered by the gateway, optionally filtered by substring
pub async fn list(ctx: &CommandContext, filter: Option<String>) -> Result<()> {
    let gateway = ctx.gateway()?;

    let sp = spinner("Fetching models...");
    let models = gateway.fetch_models().await;
    sp.finish_and_clear();
    let models = filter_models(models.context("Failed to fetch models")?, filter.as_deref());

    if ctx.format.is_json() {
        println!("{}", JsonFormatter::format(&models)?);
        return Ok(());
    }

    if models.is_empty() {
        println!("{}", colors::warning("No models found."));
        return Ok(());
    }

    let headers = vec!["ID", "Name", "Context", "Prompt $/M", "Completion $/M"];
    let rows: Vec<Vec<String>> = models
        .iter()
        .map(|m| {
            vec![
                m.id.clone(),
                m.name.clone(),
                m.context_length.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                format_per_million(m.pricing.prompt),
                format_per_million(m.pricing.completion),
            ]
        })
        .collect();

    println!("{}", TableFormatter::simple(headers, rows));
    println!("{}", colors::dim(&format!("{} models", models.len())));

    Ok(())
}

/// Case-insensitive substring match on id or name
fn filter_models(models: Vec<ModelInfo>, filter: Option<&str>) -> Vec<ModelInfo> {
    let Some(needle) = filter.map(str::to_lowercase) else {
        return models;
    };
    models
        .into_iter()
        .filter(|m| m.id.to_lowercase().contains(&needle) || m.name.to_lowercase().contains(&needle))
        .collect()
}
