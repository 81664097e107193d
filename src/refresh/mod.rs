//! Data refresh: fetch → parse → precompute → install
//!
//! A cycle builds a complete [`Snapshot`] off to the side and hands it to
//! [`Searcher::install`]. Searches keep running against the old snapshot the
//! whole time; nothing is published until the new one is fully built.
//!
//! ```text
//! Idle ─▶ Fetching ─▶ Parsing ─▶ Precomputing ─▶ Installing ─▶ Idle
//!            │           │            │
//!            └───────────┴────────────┴──── error ─▶ Idle (old snapshot kept)
//! ```

mod download;
mod parse;

pub use download::{Downloader, FileDownloader};
pub use parse::{JsonLinesParser, ListParser};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::config::ListSource;
use crate::error::RefreshError;
use crate::lists::RawLists;
use crate::normalize::NamePipeline;
use crate::searcher::Searcher;
use crate::snapshot::Snapshot;
use crate::store::{DownloadStats, DownloadStatsStore};

/// Where a refresh cycle currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Parsing,
    Precomputing,
    Installing,
}

pub struct RefreshPipeline {
    sources: Vec<ListSource>,
    downloader: Arc<dyn Downloader>,
    parser: Arc<dyn ListParser>,
    names: NamePipeline,
    phase: watch::Sender<RefreshPhase>,
}

impl RefreshPipeline {
    pub fn new(
        sources: Vec<ListSource>,
        downloader: Arc<dyn Downloader>,
        parser: Arc<dyn ListParser>,
        names: NamePipeline,
    ) -> Self {
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Self {
            sources,
            downloader,
            parser,
            names,
            phase,
        }
    }

    /// HTTP downloads parsed as JSON Lines
    pub fn with_defaults(sources: Vec<ListSource>, names: NamePipeline) -> Self {
        Self::new(
            sources,
            Arc::new(FileDownloader::new()),
            Arc::new(JsonLinesParser),
            names,
        )
    }

    pub fn sources(&self) -> &[ListSource] {
        &self.sources
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions
    pub fn subscribe(&self) -> watch::Receiver<RefreshPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: RefreshPhase) {
        tracing::trace!(?phase, "refresh phase");
        self.phase.send_replace(phase);
    }

    /// Run one cycle and install the result.
    ///
    /// Files are read from `initial_dir` when given (downloading any that
    /// are missing), otherwise from a fresh temporary directory. On error
    /// the searcher keeps serving its previous snapshot.
    pub async fn refresh(
        &self,
        searcher: &Searcher,
        initial_dir: Option<&Path>,
    ) -> Result<DownloadStats, RefreshError> {
        let result = self.run_cycle(searcher, initial_dir).await;
        self.set_phase(RefreshPhase::Idle);
        result
    }

    async fn run_cycle(
        &self,
        searcher: &Searcher,
        initial_dir: Option<&Path>,
    ) -> Result<DownloadStats, RefreshError> {
        let started = Instant::now();

        let scratch;
        let dir = match initial_dir {
            Some(dir) => dir,
            None => {
                scratch = tempfile::tempdir()?;
                scratch.path()
            }
        };

        self.set_phase(RefreshPhase::Fetching);
        let paths = self.downloader.fetch(dir, &self.sources).await?;

        let mut files = Vec::with_capacity(self.sources.len());
        for (i, source) in self.sources.iter().enumerate() {
            match paths.get(i) {
                Some(path) => files.push((source.kind, path.clone())),
                None => return Err(RefreshError::MissingFile(source.file_name.clone())),
            }
        }

        self.set_phase(RefreshPhase::Parsing);
        let parser = Arc::clone(&self.parser);
        let lists = tokio::task::spawn_blocking(move || -> Result<RawLists, RefreshError> {
            let mut lists = RawLists::default();
            for (kind, path) in files {
                lists.merge(parser.parse(kind, &path)?);
            }
            Ok(lists)
        })
        .await??;

        if lists.is_empty() {
            return Err(RefreshError::Empty);
        }

        self.set_phase(RefreshPhase::Precomputing);
        let names = self.names.clone();
        let snapshot = tokio::task::spawn_blocking(move || Snapshot::build(lists, &names)).await?;

        let built = snapshot.stats().clone();
        let stats = DownloadStats {
            entities: built.entities,
            alt_names: built.alt_names,
            addresses: built.addresses,
            denied_persons: built.denied_persons,
            screening_list: built.screening_list,
            refreshed_at: snapshot.refreshed_at(),
        };

        self.set_phase(RefreshPhase::Installing);
        searcher.install(snapshot).await;

        tracing::info!(
            skipped = built.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "data refresh complete"
        );
        Ok(stats)
    }
}

/// Refresh on a fixed interval until shutdown.
///
/// Cycles run strictly one after another: sleep, refresh, sleep. A failed
/// cycle is logged and retried at the next interval. `None` disables the
/// loop entirely.
pub async fn run_refresh_loop(
    pipeline: Arc<RefreshPipeline>,
    searcher: Arc<Searcher>,
    interval: Option<Duration>,
    stats_store: Arc<dyn DownloadStatsStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    let Some(interval) = interval else {
        tracing::info!("periodic data refresh disabled");
        return;
    };

    tracing::info!(?interval, "data refresh loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                tracing::info!("data refresh loop shutting down (during sleep)");
                break;
            }
        }

        match pipeline.refresh(&searcher, None).await {
            Ok(stats) => {
                tracing::info!(
                    sdns = stats.entities,
                    alt_names = stats.alt_names,
                    addresses = stats.addresses,
                    denied_persons = stats.denied_persons,
                    screening_list = stats.screening_list,
                    "data refreshed"
                );
                if let Err(e) = stats_store.record(stats).await {
                    tracing::warn!(error = %e, "failed to record download stats");
                }
            }
            Err(e) => tracing::warn!(error = %e, "data refresh failed, keeping current snapshot"),
        }
    }

    tracing::info!("data refresh loop stopped");
}
