// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tessel::{
    CoordinationController, ErrorReporter, Point, SvgScene, TesselConfig, TesselError, ViewEvent,
    ViewSink,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// List the selectable tax categories.
    Attributes,
    /// Join the data and print the join report, class breaks and ranking.
    Report {
        #[arg(long)]
        attribute: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Draw the map, legend and ranked chart to an SVG file.
    Render {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long)]
        attribute: Option<String>,
        /// Highlight the state with this postal code.
        #[arg(long)]
        hover: Option<String>,
        /// Pointer position as X,Y in map pixels.
        #[arg(long, value_parser = parse_point)]
        pointer: Option<Point>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tessel-map-demo")]
#[command(about = "Coordinated choropleth and ranked bar chart of state tax revenue")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    records: Option<PathBuf>,
    #[arg(long, global = true)]
    features: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

fn parse_point(raw: &str) -> Result<Point> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected X,Y but got '{raw}'"))?;
    let x: f64 = x.trim().parse().with_context(|| format!("invalid x in '{raw}'"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("invalid y in '{raw}'"))?;
    Ok(Point::new(x, y))
}

fn load_config(cli: &Cli) -> Result<TesselConfig> {
    let mut config = match &cli.config {
        Some(path) => TesselConfig::from_yaml_file(path).map_err(TesselError::from)?,
        None => TesselConfig::default(),
    };
    config.apply_env_overrides().map_err(TesselError::from)?;
    if let Some(records) = &cli.records {
        config.data.records = records.clone();
    }
    if let Some(features) = &cli.features {
        config.data.features = features.clone();
    }
    debug!(
        records = %config.data.records.display(),
        features = %config.data.features.display(),
        "Resolved configuration"
    );
    Ok(config)
}

async fn open_controller(
    config: &TesselConfig,
    attribute: Option<&str>,
) -> Result<CoordinationController> {
    let mut controller = tessel::open(config).await?;
    if let Some(name) = attribute {
        controller.change_attribute(name).map_err(TesselError::from)?;
    }
    Ok(controller)
}

fn print_report(
    controller: &CoordinationController,
    config: &TesselConfig,
    as_json: bool,
) -> Result<()> {
    let report = controller.join_report();
    let breaks = controller.breaks();
    let ranking = &controller.chart().sorted;
    if as_json {
        let body = json!({
            "attribute": controller.expressed(),
            "join": report,
            "breaks": breaks,
            "ranking": ranking,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Join: {}", report.summary());
    if !report.unmatched_records.is_empty() {
        println!("Unmatched records: {}", report.unmatched_records.join(", "));
    }
    if !report.unmatched_features.is_empty() {
        println!("Unmatched features: {}", report.unmatched_features.join(", "));
    }
    println!("Attribute: {} ({})", controller.expressed(), controller.expressed().label());
    println!("Classes:");
    for row in &controller.legend_snapshot().rows {
        println!("  {}  {}", row.color, row.label);
    }
    println!("Ranking:");
    for (rank, entry) in ranking.iter().enumerate() {
        println!(
            "  {:>2}. {:<3} {:<20} {}",
            rank + 1,
            entry.code,
            entry.name,
            config.format.format_opt(entry.value)
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match &cli.command {
        Commands::Attributes => {
            let catalog = config.build_catalog().map_err(TesselError::from)?;
            for option in catalog.selector_options() {
                let marker = if &option.name == catalog.default_attribute() { "*" } else { " " };
                println!("{marker} {}\t{}", option.name, option.label);
            }
        }
        Commands::Report { attribute, json } => {
            let controller = open_controller(&config, attribute.as_deref()).await?;
            print_report(&controller, &config, *json)?;
        }
        Commands::Render {
            output,
            attribute,
            hover,
            pointer,
        } => {
            let mut controller = open_controller(&config, None).await?;
            let mut scene = SvgScene::new(&config, controller.features());
            scene.apply_all(&controller.initial_render());
            let mut events = Vec::new();
            if let Some(name) = attribute {
                events.push(ViewEvent::AttributeChanged(name.clone()));
            }
            if let Some(code) = hover {
                events.push(ViewEvent::Hover(code.clone()));
            }
            if let Some(point) = pointer {
                events.push(ViewEvent::PointerMoved(*point));
            }
            for event in events {
                controller
                    .dispatch_to(event, &mut scene)
                    .map_err(TesselError::from)?;
            }
            scene.write_to(output).map_err(TesselError::from)?;
            info!(instructions = scene.applied(), "Rendered scene");
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,tessel=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(cli).await {
        match error.downcast_ref::<TesselError>() {
            Some(tessel_error) => {
                let reporter = ErrorReporter {
                    show_suggestions: true,
                    colored_output: std::io::stderr().is_terminal(),
                };
                eprint!("{}", reporter.report(tessel_error));
            }
            None => eprintln!("Error: {error:#}"),
        }
        std::process::exit(1);
    }
    Ok(())
}
