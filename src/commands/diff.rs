//! pgpatch diff - show how the database differs from the configured objects

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::patch::{AutoCreate, Delta, Difference, SchemaPatch};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffFormat {
    /// One line per object
    #[default]
    Text,
    /// Machine-readable report
    Json,
}

#[derive(Debug, Serialize)]
struct DiffReport {
    difference: Difference,
    deltas: Vec<DeltaReport>,
}

#[derive(Debug, Serialize)]
struct DeltaReport {
    object: String,
    difference: Difference,
}

pub async fn cmd_diff(config: &Config, format: DiffFormat) -> Result<()> {
    if config.patch.auto_create == AutoCreate::None {
        eprintln!("auto_create is 'none'; the database is not inspected.");
        return Ok(());
    }

    let pool = super::connect(config).await?;
    let mut patch = super::with_failure_mode(
        SchemaPatch::new(config.rules.clone()),
        config.patch.on_introspection_failure,
    );
    let outcome = super::introspect(config, &pool, &mut patch).await?;
    pool.close().await;

    match format {
        DiffFormat::Text => print_text(&patch),
        DiffFormat::Json => println!("{}", render_json(&patch)?),
    }

    outcome?;
    Ok(())
}

fn print_text(patch: &SchemaPatch) {
    for delta in patch.migrations() {
        println!("{}", format_delta(delta));
    }
    println!(
        "\n{} {}",
        style("Overall:").bold(),
        styled_difference(patch.difference())
    );
}

fn format_delta(delta: &Delta) -> String {
    let marker = match delta.difference() {
        Difference::None => "=",
        Difference::Create => "+",
        Difference::Update => "~",
        Difference::Invalid => "!",
    };
    format!(
        "  {} {:<40} {}",
        marker,
        delta.identifier().to_string(),
        styled_difference(delta.difference())
    )
}

fn styled_difference(difference: Difference) -> console::StyledObject<String> {
    let label = difference.to_string();
    match difference {
        Difference::None => style(label).dim(),
        Difference::Create => style(label).green(),
        Difference::Update => style(label).yellow(),
        Difference::Invalid => style(label).red().bold(),
    }
}

fn render_json(patch: &SchemaPatch) -> Result<String> {
    let report = DiffReport {
        difference: patch.difference(),
        deltas: patch
            .migrations()
            .iter()
            .map(|d| DeltaReport {
                object: d.identifier().to_string(),
                difference: d.difference(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
