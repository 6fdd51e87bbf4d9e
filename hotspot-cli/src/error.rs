//! Error types emitted by the `hotspots` CLI.
//!
//! Keep variants small: every command helper returns `Result<_, CliError>` and
//! the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use hotspot_core::{HotspotGeoJsonError, PipelineConfigError};
use hotspot_network::NetworkBuildError;
use hotspot_scorer::{QueryError, RecommendationConfigError};
use thiserror::Error;

/// Errors emitted by the `hotspots` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable consulted.
        env: &'static str,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Reading an input file failed.
    #[error("failed to read {field} from {path:?}: {source}")]
    ReadInput {
        /// Flag name.
        field: &'static str,
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An input file was not valid JSON for its record type.
    #[error("failed to parse {field} JSON at {path:?}: {source}")]
    ParseInput {
        /// Flag name.
        field: &'static str,
        /// Input path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The engine configuration was rejected.
    #[error("invalid engine configuration: {0}")]
    EngineConfig(#[from] PipelineConfigError),
    /// The recommendation settings were rejected.
    #[error("invalid recommendation settings: {0}")]
    RecommendationConfig(#[from] RecommendationConfigError),
    /// The hotspot collection could not be parsed.
    #[error("failed to read hotspots from {path:?}: {source}")]
    ParseHotspots {
        /// Input path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: HotspotGeoJsonError,
    },
    /// The hotspot collection could not be encoded.
    #[error("failed to encode hotspots: {0}")]
    EncodeHotspots(#[source] HotspotGeoJsonError),
    /// The street network could not be built.
    #[error("invalid street network: {0}")]
    BuildNetwork(#[from] NetworkBuildError),
    /// The recommendation query was rejected.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Writing an artefact failed.
    #[error("failed to write {path:?}: {source}")]
    WriteArtefact {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
