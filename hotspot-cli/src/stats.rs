//! `stats` subcommand: summarise a hotspot collection.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use hotspot_core::HotspotStats;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::require_existing;
use crate::{ARG_HOTSPOTS, CliError, ENV_STATS_HOTSPOTS, load_hotspots, write_json};

/// CLI arguments for the `stats` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Print aggregate figures for a hotspot collection")]
#[ortho_config(prefix = "HOTSPOTS")]
pub(crate) struct StatsArgs {
    /// Path to a hotspot collection written by `pipeline`.
    #[arg(long = ARG_HOTSPOTS, value_name = "path")]
    #[serde(default)]
    pub(crate) hotspots: Option<Utf8PathBuf>,
}

pub(crate) fn run_stats(args: StatsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let path = merged.hotspots.ok_or(CliError::MissingArgument {
        field: ARG_HOTSPOTS,
        env: ENV_STATS_HOTSPOTS,
    })?;
    require_existing(&path, ARG_HOTSPOTS)?;
    let stats = hotspot_stats(&path)?;
    write_json(writer, &stats)
}

pub(crate) fn hotspot_stats(path: &Utf8Path) -> Result<HotspotStats, CliError> {
    let collection = load_hotspots(path)?;
    Ok(HotspotStats::from_hotspots(&collection.hotspots))
}
