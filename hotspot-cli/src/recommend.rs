//! `recommend` subcommand: rank hotspots reachable from an origin.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geo::Coord;
use hotspot_core::{Recommendation, TravelMode, UserQuery};
use hotspot_network::{NetworkDefinition, NetworkSet, TransportGraph};
use hotspot_scorer::{RecommendationConfig, Recommender};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{load_json, require_existing};
use crate::{
    ARG_ALPHA, ARG_BETA, ARG_BUDGET, ARG_HOTSPOTS, ARG_LAT, ARG_LIMIT, ARG_LON, ARG_MODE,
    ARG_NETWORK, ARG_SETTINGS, CliError, ENV_LAT, ENV_LON, ENV_MODE, ENV_NETWORK,
    ENV_RECOMMEND_HOTSPOTS, load_hotspots, write_json,
};

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the hotspots in a final_hotspots.geojson collection for \
                 an origin, travel mode and time budget. Travel times come \
                 from a street network definition; the popularity and \
                 accessibility weights default to the recommendation \
                 settings.",
    about = "Recommend dining hotspots near a location"
)]
#[ortho_config(prefix = "HOTSPOTS")]
pub(crate) struct RecommendArgs {
    /// Path to a hotspot collection written by `pipeline`.
    #[arg(long = ARG_HOTSPOTS, value_name = "path")]
    #[serde(default)]
    pub(crate) hotspots: Option<Utf8PathBuf>,
    /// Path to a JSON street network definition.
    #[arg(long = ARG_NETWORK, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Travel mode: walk, bike or drive.
    #[arg(long = ARG_MODE, value_name = "mode")]
    #[serde(default)]
    pub(crate) mode: Option<TravelMode>,
    /// Origin latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Origin longitude in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Time budget in minutes; the mode's default when absent.
    #[arg(long = ARG_BUDGET, value_name = "minutes")]
    #[serde(default)]
    pub(crate) budget: Option<f64>,
    /// Popularity weight.
    #[arg(long = ARG_ALPHA, value_name = "weight")]
    #[serde(default)]
    pub(crate) alpha: Option<f64>,
    /// Accessibility weight.
    #[arg(long = ARG_BETA, value_name = "weight")]
    #[serde(default)]
    pub(crate) beta: Option<f64>,
    /// Maximum number of recommendations.
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Path to JSON recommendation settings (speeds, default budgets, weights).
    #[arg(long = ARG_SETTINGS, value_name = "path")]
    #[serde(default)]
    pub(crate) settings: Option<Utf8PathBuf>,
}

impl RecommendArgs {
    fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecommendConfig {
    pub(crate) hotspots: Utf8PathBuf,
    pub(crate) network: Utf8PathBuf,
    pub(crate) settings: Option<Utf8PathBuf>,
    pub(crate) mode: TravelMode,
    /// WGS84 origin as `(lon, lat)`.
    pub(crate) origin: Coord<f64>,
    pub(crate) budget: Option<f64>,
    pub(crate) alpha: Option<f64>,
    pub(crate) beta: Option<f64>,
    pub(crate) limit: Option<usize>,
}

impl RecommendConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.hotspots, ARG_HOTSPOTS)?;
        require_existing(&self.network, ARG_NETWORK)?;
        if let Some(path) = &self.settings {
            require_existing(path, ARG_SETTINGS)?;
        }
        Ok(())
    }
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let hotspots = args.hotspots.ok_or(CliError::MissingArgument {
            field: ARG_HOTSPOTS,
            env: ENV_RECOMMEND_HOTSPOTS,
        })?;
        let network = args.network.ok_or(CliError::MissingArgument {
            field: ARG_NETWORK,
            env: ENV_NETWORK,
        })?;
        let mode = args.mode.ok_or(CliError::MissingArgument {
            field: ARG_MODE,
            env: ENV_MODE,
        })?;
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_LON,
        })?;
        Ok(Self {
            hotspots,
            network,
            settings: args.settings,
            mode,
            origin: Coord { x: lon, y: lat },
            budget: args.budget,
            alpha: args.alpha,
            beta: args.beta,
            limit: args.limit,
        })
    }
}

/// JSON document printed by `recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecommendResponse {
    pub(crate) mode: TravelMode,
    pub(crate) time_budget_minutes: f64,
    pub(crate) recommendations: Vec<Recommendation>,
}

pub(crate) fn run_recommend(args: RecommendArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let response = execute_recommend(&config)?;
    write_json(writer, &response)
}

pub(crate) fn execute_recommend(config: &RecommendConfig) -> Result<RecommendResponse, CliError> {
    let settings = load_settings(config.settings.as_deref())?;
    settings.validate()?;
    let profile = settings.profile(config.mode);

    let collection = load_hotspots(&config.hotspots)?;
    let definition: NetworkDefinition = load_json(&config.network, ARG_NETWORK)?;
    let graph = TransportGraph::from_definition(&definition, config.mode, profile.speed_kmh)?;
    info!(
        "{} network: {} nodes; {} hotspots loaded",
        config.mode,
        graph.node_count(),
        collection.hotspots.len()
    );

    let networks: NetworkSet = [graph].into_iter().collect();
    let recommender = Recommender::new(collection, networks, settings)?;
    let query = UserQuery {
        origin: config.origin,
        mode: config.mode,
        time_budget_minutes: config.budget.unwrap_or(profile.default_budget_minutes),
        alpha: config.alpha,
        beta: config.beta,
        limit: config.limit,
    };
    let recommendations = recommender.recommend(&query)?;
    Ok(RecommendResponse {
        mode: query.mode,
        time_budget_minutes: query.time_budget_minutes,
        recommendations,
    })
}

fn load_settings(path: Option<&Utf8Path>) -> Result<RecommendationConfig, CliError> {
    path.map_or_else(
        || Ok(RecommendationConfig::default()),
        |path| load_json(path, ARG_SETTINGS),
    )
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RecommendConfig, CliError> {
    let merged = RecommendArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RecommendConfig::try_from(merged)
}
