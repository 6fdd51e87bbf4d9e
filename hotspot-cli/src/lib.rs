//! Command-line interface for the dining hotspot engine.
//!
//! Three subcommands share the layered configuration model (flags, config
//! files, `HOTSPOTS_*` environment variables):
//! - `pipeline` runs the batch stages and writes `final_hotspots.geojson` and
//!   `intersection_analysis.json`;
//! - `recommend` ranks hotspots reachable from an origin;
//! - `stats` summarises a hotspot collection.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use hotspot_core::HotspotCollection;
use log::info;
use serde::Serialize;

mod error;
mod fs;
mod pipeline;
mod recommend;
mod stats;

pub use error::CliError;

use pipeline::PipelineArgs;
use recommend::RecommendArgs;
use stats::StatsArgs;

pub(crate) const ARG_PLACES: &str = "places";
pub(crate) const ARG_EVENTS: &str = "events";
pub(crate) const ARG_ENGINE_CONFIG: &str = "engine-config";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_HOTSPOTS: &str = "hotspots";
pub(crate) const ARG_NETWORK: &str = "network";
pub(crate) const ARG_SETTINGS: &str = "settings";
pub(crate) const ARG_MODE: &str = "mode";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_BUDGET: &str = "budget";
pub(crate) const ARG_ALPHA: &str = "alpha";
pub(crate) const ARG_BETA: &str = "beta";
pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ENV_PLACES: &str = "HOTSPOTS_CMDS_PIPELINE_PLACES";
pub(crate) const ENV_EVENTS: &str = "HOTSPOTS_CMDS_PIPELINE_EVENTS";
pub(crate) const ENV_RECOMMEND_HOTSPOTS: &str = "HOTSPOTS_CMDS_RECOMMEND_HOTSPOTS";
pub(crate) const ENV_NETWORK: &str = "HOTSPOTS_CMDS_RECOMMEND_NETWORK";
pub(crate) const ENV_MODE: &str = "HOTSPOTS_CMDS_RECOMMEND_MODE";
pub(crate) const ENV_LAT: &str = "HOTSPOTS_CMDS_RECOMMEND_LAT";
pub(crate) const ENV_LON: &str = "HOTSPOTS_CMDS_RECOMMEND_LON";
pub(crate) const ENV_STATS_HOTSPOTS: &str = "HOTSPOTS_CMDS_STATS_HOTSPOTS";

/// File name of the hotspot collection artefact.
pub const FINAL_HOTSPOTS_FILE: &str = "final_hotspots.geojson";
/// File name of the run report artefact.
pub const ANALYSIS_FILE: &str = "intersection_analysis.json";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration, inputs or the
/// requested computation fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Pipeline(args) => {
            let artefacts = pipeline::run_pipeline(args)?;
            info!(
                "{} hotspots written to {}; report at {}",
                artefacts.hotspot_count, artefacts.hotspots, artefacts.analysis
            );
            Ok(())
        }
        Command::Recommend(args) => recommend::run_recommend(args, &mut stdout),
        Command::Stats(args) => stats::run_stats(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "hotspots",
    about = "Find and recommend dining hotspots from places and drop-offs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cluster places and drop-offs and write hotspot artefacts.
    Pipeline(PipelineArgs),
    /// Rank hotspots reachable from an origin.
    Recommend(RecommendArgs),
    /// Summarise a hotspot collection.
    Stats(StatsArgs),
}

/// Parse a hotspot collection written by the `pipeline` command.
pub(crate) fn load_hotspots(path: &Utf8Path) -> Result<HotspotCollection, CliError> {
    let text = fs::read_utf8_file(path).map_err(|source| CliError::ReadInput {
        field: ARG_HOTSPOTS,
        path: path.to_path_buf(),
        source,
    })?;
    HotspotCollection::from_geojson_str(&text).map_err(|source| CliError::ParseHotspots {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
