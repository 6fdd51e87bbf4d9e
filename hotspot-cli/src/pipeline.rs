//! `pipeline` subcommand: run the batch stages and write both artefacts.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use hotspot_core::{
    AnalysisReport, HotspotPipeline, PipelineConfig, PipelineOutput, PlaceRecord,
    RawMobilityEvent,
};
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{self, load_json, require_existing};
use crate::{
    ANALYSIS_FILE, ARG_ENGINE_CONFIG, ARG_EVENTS, ARG_OUTPUT_DIR, ARG_PLACES, CliError,
    ENV_EVENTS, ENV_PLACES, FINAL_HOTSPOTS_FILE,
};

/// CLI arguments for the `pipeline` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Cluster restaurants and meal-time drop-offs, intersect the \
                 resulting zones and write final_hotspots.geojson and \
                 intersection_analysis.json. Places and events are JSON \
                 arrays of records; the engine configuration is optional.",
    about = "Identify dining hotspots"
)]
#[ortho_config(prefix = "HOTSPOTS")]
pub(crate) struct PipelineArgs {
    /// Path to a JSON array of place records.
    #[arg(long = ARG_PLACES, value_name = "path")]
    #[serde(default)]
    pub(crate) places: Option<Utf8PathBuf>,
    /// Path to a JSON array of timestamped drop-off events.
    #[arg(long = ARG_EVENTS, value_name = "path")]
    #[serde(default)]
    pub(crate) events: Option<Utf8PathBuf>,
    /// Path to a JSON engine configuration; defaults apply when absent.
    #[arg(long = ARG_ENGINE_CONFIG, value_name = "path")]
    #[serde(default)]
    pub(crate) engine_config: Option<Utf8PathBuf>,
    /// Directory receiving the artefacts (defaults to the working directory).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
}

impl PipelineArgs {
    fn into_config(self) -> Result<PipelineRunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PipelineRunConfig::try_from(merged)
    }
}

/// Resolved `pipeline` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PipelineRunConfig {
    pub(crate) places: Utf8PathBuf,
    pub(crate) events: Utf8PathBuf,
    pub(crate) engine_config: Option<Utf8PathBuf>,
    pub(crate) output_dir: Utf8PathBuf,
}

impl PipelineRunConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.places, ARG_PLACES)?;
        require_existing(&self.events, ARG_EVENTS)?;
        if let Some(path) = &self.engine_config {
            require_existing(path, ARG_ENGINE_CONFIG)?;
        }
        Ok(())
    }
}

impl TryFrom<PipelineArgs> for PipelineRunConfig {
    type Error = CliError;

    fn try_from(args: PipelineArgs) -> Result<Self, Self::Error> {
        let places = args.places.ok_or(CliError::MissingArgument {
            field: ARG_PLACES,
            env: ENV_PLACES,
        })?;
        let events = args.events.ok_or(CliError::MissingArgument {
            field: ARG_EVENTS,
            env: ENV_EVENTS,
        })?;
        Ok(Self {
            places,
            events,
            engine_config: args.engine_config,
            output_dir: args.output_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
        })
    }
}

/// Paths written by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PipelineArtefacts {
    pub(crate) hotspots: Utf8PathBuf,
    pub(crate) analysis: Utf8PathBuf,
    pub(crate) hotspot_count: usize,
}

pub(crate) fn run_pipeline(args: PipelineArgs) -> Result<PipelineArtefacts, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_pipeline(&config)
}

pub(crate) fn execute_pipeline(config: &PipelineRunConfig) -> Result<PipelineArtefacts, CliError> {
    let engine_config = load_engine_config(config.engine_config.as_deref())?;
    let places: Vec<PlaceRecord> = load_json(&config.places, ARG_PLACES)?;
    let events: Vec<RawMobilityEvent> = load_json(&config.events, ARG_EVENTS)?;
    info!("loaded {} places and {} events", places.len(), events.len());

    let pipeline = HotspotPipeline::new(engine_config)?;
    let output = pipeline.run(&places, &events);
    log_diagnostics(&output);
    write_artefacts(&config.output_dir, &output)
}

fn load_engine_config(path: Option<&Utf8Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = fs::read_utf8_file(path).map_err(|source| CliError::ReadInput {
        field: ARG_ENGINE_CONFIG,
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PipelineConfig::from_json_str(&text)?)
}

fn log_diagnostics(output: &PipelineOutput) {
    let diagnostics = &output.diagnostics;
    if diagnostics.skipped_places > 0 || diagnostics.skipped_events > 0 {
        warn!(
            "skipped {} places and {} events with invalid coordinates",
            diagnostics.skipped_places, diagnostics.skipped_events
        );
    }
    let intersections = &diagnostics.intersections;
    info!(
        "intersections: {} pairs, {} parts, {} rejected on area, {} rejected on overlap, {} accepted",
        intersections.pairs_evaluated,
        intersections.parts_evaluated,
        intersections.rejected_area,
        intersections.rejected_overlap,
        intersections.accepted
    );
    if output.hotspots.is_empty() {
        warn!("no hotspots passed the intersection thresholds");
    }
}

fn write_artefacts(
    output_dir: &Utf8Path,
    output: &PipelineOutput,
) -> Result<PipelineArtefacts, CliError> {
    ensure_output_dir(output_dir)?;

    let hotspots = output_dir.join(FINAL_HOTSPOTS_FILE);
    let geojson = output
        .collection()
        .to_geojson_string()
        .map_err(CliError::EncodeHotspots)?;
    write_artefact(&hotspots, geojson.as_bytes())?;

    let analysis = output_dir.join(ANALYSIS_FILE);
    let report = serde_json::to_string_pretty(&AnalysisReport::from_output(output))
        .map_err(CliError::SerialiseOutput)?;
    write_artefact(&analysis, report.as_bytes())?;

    Ok(PipelineArtefacts {
        hotspots,
        analysis,
        hotspot_count: output.hotspots.len(),
    })
}

fn ensure_output_dir(path: &Utf8Path) -> Result<(), CliError> {
    if fs::file_is_file(path).unwrap_or(false) {
        return Err(CliError::OutputDirectoryNotDirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| CliError::WriteArtefact {
        path: path.to_path_buf(),
        source,
    })
}

fn write_artefact(path: &Utf8Path, contents: &[u8]) -> Result<(), CliError> {
    fs::write_utf8_file(path, contents).map_err(|source| CliError::WriteArtefact {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<PipelineRunConfig, CliError> {
    let merged = PipelineArgs::merge_from_layers(layers).map_err(CliError::from)?;
    PipelineRunConfig::try_from(merged)
}
