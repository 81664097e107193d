//! Sanctions Screen - In-memory Sanctions List Screening Engine
//!
//! Screens a name (plus optional email and address) against government
//! sanctions and denial lists and returns ranked fuzzy matches. All list
//! data is precomputed into an immutable snapshot that searches read
//! concurrently; a background refresh builds the next snapshot off to the
//! side and swaps it in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Consumers: batch CLI, embedding services                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Response Builder                               │
//! │           (all lists, top score, content hash)                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Searcher                                    │
//! │    Arc<Snapshot> + worker gate + Jaro-Winkler + top-K            │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ install
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Refresh Pipeline                                │
//! │        (download -> parse -> precompute -> install)              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use sanctions_screen::{EngineConfig, RefreshPipeline, Searcher, SourcesConfig};
//!
//! let config = EngineConfig::from_env()?;
//! let sources = SourcesConfig::from_file("config/sources.yaml")?;
//!
//! let searcher = Arc::new(Searcher::from_config(&config));
//! let pipeline = RefreshPipeline::with_defaults(sources.sources, config.name_pipeline());
//! pipeline.refresh(&searcher, config.initial_data_dir.as_deref()).await?;
//!
//! let hits = searcher.top_entities(config.search_limit, config.min_match, "Nicolas Maduro").await;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod lists;
pub mod normalize;
pub mod refresh;
pub mod remarks;
pub mod response;
pub mod scoring;
pub mod searcher;
pub mod snapshot;
pub mod store;
pub mod top_k;

pub use config::{EngineConfig, ListSource, ScoringConfig, SourcesConfig};
pub use error::{ConfigError, PipelineError, RefreshError, StoreError};
pub use lists::{ListKind, RawLists};
pub use normalize::{precompute, NamePipeline};
pub use refresh::{run_refresh_loop, RefreshPhase, RefreshPipeline};
pub use response::{build_search_response, SearchRequest, SearchResponse};
pub use scoring::Scorer;
pub use searcher::{AddressComparator, AddressQuery, Match, Searcher};
pub use snapshot::{Snapshot, SnapshotStats};
pub use store::{
    CustomerBlockStatus, CustomerStatus, CustomerStatusStore, DownloadStats, DownloadStatsStore,
    InMemoryCustomerStatusStore, InMemoryDownloadStatsStore,
};
pub use top_k::{Scored, TopK};
