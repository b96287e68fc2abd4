//! Training Digest - Compact LLM-ready digests of training platform exports
//!
//! Digest turns one intervals.icu export download into a single JSON file
//! through a deterministic pipeline: record flattening → stream analytics
//! → period summary → digest encoding.
//!
//! ## Modules
//!
//! - **Analytics**: Per-kilometre splits, peak sustained efforts and heart
//!   rate zone distributions from raw activity streams
//! - **Pipeline**: Export folder discovery, loading and digest output

pub mod adapters;
pub mod analytics;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod rounding;
pub mod summary;
pub mod types;

pub use analytics::{
    ActivityAnalyzer, ActivityMetrics, PeakEffortFinder, SplitCalculator, StreamIndex,
    ZoneDistributor,
};
pub use config::DigestConfig;
pub use error::DigestError;
pub use export::ExportBundle;
pub use pipeline::{DigestProcessor, DigestReport};

/// Crate version, reported by the CLI
pub const DIGEST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI reports
pub const PRODUCER_NAME: &str = "training-digest";
