//! Mirror aggregation engine for the FCL/ZL download sites: a declarative
//! source registry, defensive file-tree normalization, and concurrent
//! latency racing to auto-select the fastest mirror.
//!
//! The engine exposes no UI. Rendering layers consume the streamed
//! `(source_id, latency_ms)` samples and the resolved version/arch/link
//! structure, and every network call goes through the pluggable
//! [`services::Fetch`] boundary so a diagnostics layer can wrap or
//! short-circuit it.

pub mod errors;
pub mod logging;
pub mod models;
pub mod registry;
pub mod services;

pub use errors::{MirrorError, Result};
pub use models::{
    FileTree, LatencySample, NodeKind, ResolvedSource, TreeNode, VersionEntry, UNREACHABLE,
};
pub use registry::{SourceCategory, SourceDescriptor, SourceFilter, SourceRegistry};
pub use services::{
    AutoSelectService, DownloadResolver, FastestSelector, Fetch, HttpFetcher, InterceptFetcher,
    LatencyProber, LatencyRace, TreeNormalizer,
};
