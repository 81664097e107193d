//! Searcher - the in-memory matching engine
//!
//! The searcher owns the live [`Snapshot`] and answers ranked and exact
//! queries against it.
//!
//! # Concurrency
//!
//! ```text
//!  search call ──read lock──▶ Arc<Snapshot> (cloned, lock released)
//!       │
//!       ├── gate permit ──▶ score record 0 ──┐
//!       ├── gate permit ──▶ score record 1 ──┼──▶ TopK (call-local)
//!       └── gate permit ──▶ score record n ──┘
//!       │
//!       ▼  wait for every task, then build the output view
//!
//!  refresh ──write lock──▶ swap Arc<Snapshot>
//! ```
//!
//! The gate is a semaphore shared by every concurrent search, bounding the
//! total number of in-flight scoring tasks for the process. A search holds
//! one `Arc<Snapshot>` for its whole duration, so it sees either the old or
//! the new snapshot, never a mix.

mod address;

pub use address::{AddressComparator, AddressQuery};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

use crate::config::EngineConfig;
use crate::lists::{AlternateName, DeniedPerson, ScreeningListEntry, SdnAddress, SdnEntity};
use crate::normalize::precompute;
use crate::scoring::Scorer;
use crate::snapshot::{
    IndexedAddress, IndexedAlt, IndexedDeniedPerson, IndexedEntity, IndexedScreeningEntry, Snapshot,
    SnapshotStats,
};
use crate::top_k::{Scored, TopK};

/// A list record annotated with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(rename = "match")]
    pub score: f64,
}

/// Concurrent searcher over the current snapshot
pub struct Searcher {
    /// Current snapshot, replaced wholesale on refresh
    snapshot: RwLock<Arc<Snapshot>>,
    /// Bounds in-flight scoring tasks across all searches
    gate: Arc<Semaphore>,
    scorer: Scorer,
}

impl Searcher {
    /// Create a searcher serving an empty snapshot until the first install
    pub fn new(scorer: Scorer, workers: usize) -> Self {
        let workers = workers.max(1);
        tracing::info!(workers, "allowing only {} workers for search", workers);
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            gate: Arc::new(Semaphore::new(workers)),
            scorer,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Scorer::new(config.scoring), config.workers)
    }

    pub fn scorer(&self) -> Scorer {
        self.scorer
    }

    /// The snapshot currently being served
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Publish a new snapshot. The write lock is held only for the swap.
    pub async fn install(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let stats = snapshot.stats().clone();
        {
            let mut current = self.snapshot.write().await;
            *current = snapshot;
        }
        tracing::info!(
            entities = stats.entities,
            addresses = stats.addresses,
            alt_names = stats.alt_names,
            denied_persons = stats.denied_persons,
            screening_list = stats.screening_list,
            "installed new snapshot"
        );
    }

    pub async fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().await.refreshed_at()
    }

    pub async fn stats(&self) -> SnapshotStats {
        self.snapshot().await.stats().clone()
    }

    // -----------------------------------------------------------------------
    // Ranked search
    // -----------------------------------------------------------------------
    //
    // Each public method takes one snapshot and delegates to its `*_in`
    // variant. Callers combining several searches (the response builder)
    // take the snapshot once and pass it to every `*_in` call.

    /// Individuals whose name best matches `name`
    pub async fn top_entities(
        &self,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<SdnEntity>> {
        let snapshot = self.snapshot().await;
        self.top_entities_in(snapshot, limit, min_match, name).await
    }

    pub(crate) async fn top_entities_in(
        &self,
        snapshot: Arc<Snapshot>,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<SdnEntity>> {
        let query = precompute(name);
        if query.is_empty() {
            return Vec::new();
        }
        let scorer = self.scorer;

        let ranked = self
            .rank(
                Arc::clone(&snapshot),
                Snapshot::entities,
                limit,
                min_match,
                move |e: &IndexedEntity| scorer.score(e.name(), &query),
            )
            .await;

        ranked
            .into_iter()
            .filter_map(|s| {
                let entity = &snapshot.entities()[s.value];
                entity.record.is_individual().then(|| Match {
                    record: entity.record.clone(),
                    score: s.weight,
                })
            })
            .collect()
    }

    /// Addresses whose free-text address best matches `address`
    pub async fn top_addresses(
        &self,
        limit: usize,
        min_match: f64,
        address: &str,
    ) -> Vec<Match<SdnAddress>> {
        let compare = AddressComparator::address(self.scorer, address);
        self.top_addresses_by(limit, min_match, compare).await
    }

    /// Addresses ranked by an arbitrary comparator
    pub async fn top_addresses_by(
        &self,
        limit: usize,
        min_match: f64,
        compare: AddressComparator,
    ) -> Vec<Match<SdnAddress>> {
        let snapshot = self.snapshot().await;
        self.top_addresses_in(snapshot, limit, min_match, compare)
            .await
    }

    pub(crate) async fn top_addresses_in(
        &self,
        snapshot: Arc<Snapshot>,
        limit: usize,
        min_match: f64,
        compare: AddressComparator,
    ) -> Vec<Match<SdnAddress>> {
        let ranked = self
            .rank(
                Arc::clone(&snapshot),
                Snapshot::addresses,
                limit,
                min_match,
                move |a: &IndexedAddress| compare.compare(a),
            )
            .await;

        to_matches(&ranked, snapshot.addresses(), |a| a.record.clone())
    }

    pub async fn top_alt_names(
        &self,
        limit: usize,
        min_match: f64,
        alt: &str,
    ) -> Vec<Match<AlternateName>> {
        let snapshot = self.snapshot().await;
        self.top_alt_names_in(snapshot, limit, min_match, alt).await
    }

    pub(crate) async fn top_alt_names_in(
        &self,
        snapshot: Arc<Snapshot>,
        limit: usize,
        min_match: f64,
        alt: &str,
    ) -> Vec<Match<AlternateName>> {
        let query = precompute(alt);
        if query.is_empty() {
            return Vec::new();
        }
        let scorer = self.scorer;

        let ranked = self
            .rank(
                Arc::clone(&snapshot),
                Snapshot::alt_names,
                limit,
                min_match,
                move |a: &IndexedAlt| scorer.score(a.name(), &query),
            )
            .await;

        to_matches(&ranked, snapshot.alt_names(), |a| a.record.clone())
    }

    pub async fn top_denied_persons(
        &self,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<DeniedPerson>> {
        let snapshot = self.snapshot().await;
        self.top_denied_persons_in(snapshot, limit, min_match, name)
            .await
    }

    pub(crate) async fn top_denied_persons_in(
        &self,
        snapshot: Arc<Snapshot>,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<DeniedPerson>> {
        let query = precompute(name);
        if query.is_empty() {
            return Vec::new();
        }
        let scorer = self.scorer;

        let ranked = self
            .rank(
                Arc::clone(&snapshot),
                Snapshot::denied_persons,
                limit,
                min_match,
                move |dp: &IndexedDeniedPerson| scorer.score(dp.name(), &query),
            )
            .await;

        to_matches(&ranked, snapshot.denied_persons(), |dp| dp.record.clone())
    }

    /// Screening list entries, scored on the best of their primary and alternate names
    pub async fn top_screening_list(
        &self,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<ScreeningListEntry>> {
        let snapshot = self.snapshot().await;
        self.top_screening_list_in(snapshot, limit, min_match, name)
            .await
    }

    pub(crate) async fn top_screening_list_in(
        &self,
        snapshot: Arc<Snapshot>,
        limit: usize,
        min_match: f64,
        name: &str,
    ) -> Vec<Match<ScreeningListEntry>> {
        let query = precompute(name);
        if query.is_empty() {
            return Vec::new();
        }
        let scorer = self.scorer;

        let ranked = self
            .rank(
                Arc::clone(&snapshot),
                Snapshot::screening_list,
                limit,
                min_match,
                move |entry: &IndexedScreeningEntry| {
                    entry
                        .alt_names()
                        .iter()
                        .map(|alt| scorer.score(alt, &query))
                        .fold(scorer.score(entry.name(), &query), f64::max)
                },
            )
            .await;

        to_matches(&ranked, snapshot.screening_list(), |e| e.record.clone())
    }

    /// Fan out one gated scoring task per record and keep the best `limit`.
    ///
    /// Returns positions into `collection(&snapshot)`, heaviest first.
    async fn rank<T, F>(
        &self,
        snapshot: Arc<Snapshot>,
        collection: fn(&Snapshot) -> &[T],
        limit: usize,
        min_match: f64,
        score: F,
    ) -> Vec<Scored<usize>>
    where
        T: 'static,
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        let len = collection(&snapshot).len();
        if len == 0 || limit == 0 {
            return Vec::new();
        }

        let top = Arc::new(TopK::new(limit, min_match));
        let score = Arc::new(score);
        let mut tasks = JoinSet::new();

        for i in 0..len {
            let permit = match Arc::clone(&self.gate).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "search gate closed");
                    break;
                }
            };

            let snapshot = Arc::clone(&snapshot);
            let top = Arc::clone(&top);
            let score = Arc::clone(&score);
            tasks.spawn(async move {
                let _permit = permit;
                let weight = score(&collection(&snapshot)[i]);
                top.add(i, weight);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "scoring task failed");
            }
        }

        top.items()
    }

    // -----------------------------------------------------------------------
    // Exact lookups
    // -----------------------------------------------------------------------

    /// Entities whose remarks carry the given government ID.
    ///
    /// Bypasses fuzzy scoring: hits get a weight of exactly 1.0 and come back
    /// in snapshot order, stopping at `limit`.
    pub async fn find_by_remarks_id(&self, limit: usize, id: &str) -> Vec<Match<SdnEntity>> {
        let id = id.trim();
        if id.is_empty() || limit == 0 {
            return Vec::new();
        }

        let query_parts: Vec<&str> = id.split_whitespace().collect();
        let snapshot = self.snapshot().await;

        let mut out = Vec::new();
        for entity in snapshot.entities() {
            if !remarks_id_matches(entity.remarks_id(), id, &query_parts) {
                continue;
            }
            out.push(Match {
                record: entity.record.clone(),
                score: 1.0,
            });
            if out.len() >= limit {
                break;
            }
        }
        out
    }

    /// Addresses in the given country, ignoring case. A blank name returns every address.
    pub async fn filter_by_country(&self, name: &str) -> Vec<SdnAddress> {
        let snapshot = self.snapshot().await;
        let country = precompute(name);

        snapshot
            .addresses()
            .iter()
            .filter(|a| country.is_empty() || a.country() == country)
            .map(|a| a.record.clone())
            .collect()
    }

    /// Entity by its source identifier
    pub async fn find_exact(&self, entity_id: &str) -> Option<SdnEntity> {
        self.snapshot()
            .await
            .entity(entity_id)
            .map(|e| e.record.clone())
    }

    /// Up to `limit` addresses belonging to an entity
    pub async fn find_addresses(&self, limit: usize, entity_id: &str) -> Vec<SdnAddress> {
        self.snapshot()
            .await
            .addresses()
            .iter()
            .filter(|a| a.record.entity_id == entity_id)
            .take(limit)
            .map(|a| a.record.clone())
            .collect()
    }

    /// Up to `limit` alternate names belonging to an entity
    pub async fn find_alts(&self, limit: usize, entity_id: &str) -> Vec<AlternateName> {
        self.snapshot()
            .await
            .alt_names()
            .iter()
            .filter(|a| a.record.entity_id == entity_id)
            .take(limit)
            .map(|a| a.record.clone())
            .collect()
    }
}

fn to_matches<T, R>(ranked: &[Scored<usize>], items: &[T], view: impl Fn(&T) -> R) -> Vec<Match<R>> {
    ranked
        .iter()
        .map(|s| Match {
            record: view(&items[s.value]),
            score: s.weight,
        })
        .collect()
}

/// Whether a stored remarks ID matches the query.
///
/// A multi-part ID with numeric parts matches when the query holds exactly
/// those numeric parts, in any order. Anything else compares verbatim.
fn remarks_id_matches(stored: &str, query: &str, query_parts: &[&str]) -> bool {
    if stored.is_empty() {
        return false;
    }

    if stored.contains(char::is_whitespace) {
        let expected: Vec<&str> = stored
            .split_whitespace()
            .filter(|p| is_positive_integer(p))
            .collect();

        if !expected.is_empty() {
            let query_numeric = query_parts.iter().filter(|p| is_positive_integer(p)).count();
            let matched = expected
                .iter()
                .filter(|part| query_parts.contains(part))
                .count();
            return matched == expected.len() && query_numeric == expected.len();
        }
    }

    stored == query
}

fn is_positive_integer(s: &str) -> bool {
    s.parse::<i64>().map_or(false, |n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::RawLists;
    use crate::normalize::NamePipeline;

    fn entity(id: &str, name: &str, sdn_type: &str, remarks: &str) -> SdnEntity {
        SdnEntity {
            entity_id: id.to_string(),
            sdn_name: name.to_string(),
            sdn_type: sdn_type.to_string(),
            remarks: remarks.to_string(),
            ..Default::default()
        }
    }

    fn address(entity_id: &str, id: &str, street: &str, city: &str, country: &str) -> SdnAddress {
        SdnAddress {
            entity_id: entity_id.to_string(),
            address_id: id.to_string(),
            address: street.to_string(),
            city_state_province_postal_code: city.to_string(),
            country: country.to_string(),
        }
    }

    async fn test_searcher() -> Searcher {
        let lists = RawLists {
            entities: vec![
                entity("306", "BANCO NACIONAL DE CUBA", "individual", "a.k.a. 'BNC'."),
                entity("2681", "HAWATMA, Nayif", "individual", "DOB 1933; RFC No. 123 456 (Jordan)"),
                entity("2682", "AEROCARIBBEAN AIRLINES", "", "National ID No. 0714322."),
                entity("7001", "MADURO MOROS, Nicolas", "individual", "Cedula No. 5892464 (Venezuela)."),
            ],
            addresses: vec![
                address("306", "201", "Dai-Ichi Bldg. 6th Floor, 10-2 Nihombashi", "Tokyo 103", "Japan"),
                address("2682", "202", "Calle 23", "Havana", "Cuba"),
                address("306", "203", "Zweigniederlassung", "Hamburg", "Germany"),
            ],
            alt_names: vec![AlternateName {
                entity_id: "306".to_string(),
                alternate_id: "220".to_string(),
                alternate_type: "aka".to_string(),
                alternate_name: "NATIONAL BANK OF CUBA".to_string(),
                ..Default::default()
            }],
            denied_persons: vec![DeniedPerson {
                name: "AL NASER AIRLINES".to_string(),
                country: "IQ".to_string(),
                ..Default::default()
            }],
            screening_list: vec![ScreeningListEntry {
                id: "csl-1".to_string(),
                name: "MOHAMMAD JAFFAR".to_string(),
                alt_names: vec!["MOHAMMED JAFAR".to_string()],
                ..Default::default()
            }],
        };

        let searcher = Searcher::new(Scorer::default(), 4);
        searcher
            .install(Snapshot::build(lists, &NamePipeline::new()))
            .await;
        searcher
    }

    #[tokio::test]
    async fn test_top_entities_ranks_individuals() {
        let searcher = test_searcher().await;

        let found = searcher.top_entities(5, 0.9, "Banco Nacional de Cuba").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.entity_id, "306");
        assert!(found[0].score >= 0.9);

        let reordered = searcher.top_entities(1, 0.0, "Nicolas Maduro").await;
        assert_eq!(reordered[0].record.entity_id, "7001");
    }

    #[tokio::test]
    async fn test_top_entities_drops_organizations() {
        let searcher = test_searcher().await;
        let found = searcher.top_entities(10, 0.0, "Aerocaribbean Airlines").await;
        assert!(found.iter().all(|m| m.record.entity_id != "2682"));
    }

    #[tokio::test]
    async fn test_top_entities_sorted_and_limited() {
        let searcher = test_searcher().await;
        let found = searcher.top_entities(2, 0.0, "nayif hawatma").await;
        assert!(found.len() <= 2);
        assert_eq!(found[0].record.entity_id, "2681");
        assert!(found.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let searcher = test_searcher().await;
        assert!(searcher.top_entities(5, 0.99, "zzzz qqqq").await.is_empty());
        assert!(searcher.top_entities(0, 0.0, "banco").await.is_empty());
        assert!(searcher.top_entities(5, 0.0, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_snapshot_searches() {
        let searcher = Searcher::new(Scorer::default(), 1);
        assert!(searcher.top_alt_names(5, 0.0, "cuba").await.is_empty());
        assert!(searcher.filter_by_country("").await.is_empty());
        assert!(searcher.find_exact("306").await.is_none());
        assert!(searcher.last_refreshed_at().await.is_none());
    }

    #[tokio::test]
    async fn test_top_alt_names() {
        let searcher = test_searcher().await;
        let found = searcher.top_alt_names(5, 0.9, "National Bank of Cuba").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.alternate_id, "220");
        assert!(found[0].score >= 0.9);
    }

    #[tokio::test]
    async fn test_top_denied_persons_and_screening_list() {
        let searcher = test_searcher().await;

        let dps = searcher.top_denied_persons(5, 0.9, "Al Naser Airlines").await;
        assert_eq!(dps.len(), 1);
        assert_eq!(dps[0].record.country, "IQ");

        // Alternate spelling matches through the entry's alt names
        let csl = searcher.top_screening_list(5, 0.99, "Mohammed Jafar").await;
        assert_eq!(csl.len(), 1);
        assert_eq!(csl[0].record.id, "csl-1");
    }

    #[tokio::test]
    async fn test_top_addresses_free_text() {
        let searcher = test_searcher().await;
        let found = searcher
            .top_addresses(1, 0.0, "Dai Ichi Bldg 6th Floor 10-2 Nihombashi")
            .await;
        assert_eq!(found[0].record.address_id, "201");
    }

    #[tokio::test]
    async fn test_top_addresses_composite_comparator() {
        let searcher = test_searcher().await;
        let scorer = searcher.scorer();
        let compare = AddressComparator::average(vec![
            AddressComparator::city_state(scorer, "Havana"),
            AddressComparator::country(scorer, "Cuba"),
        ]);

        let found = searcher.top_addresses_by(3, 0.9, compare).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.address_id, "202");
    }

    #[tokio::test]
    async fn test_find_by_remarks_id() {
        let searcher = test_searcher().await;

        let found = searcher.find_by_remarks_id(10, "123 456").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.entity_id, "2681");
        assert_eq!(found[0].score, 1.0);

        // Parts may come in any order
        assert_eq!(searcher.find_by_remarks_id(10, "456 123").await.len(), 1);

        // A subset of the numeric parts is not enough
        assert!(searcher.find_by_remarks_id(10, "123").await.is_empty());

        // Single-token IDs compare verbatim
        assert_eq!(searcher.find_by_remarks_id(10, "0714322").await.len(), 1);
        assert!(searcher.find_by_remarks_id(10, "714322").await.is_empty());

        assert!(searcher.find_by_remarks_id(10, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_remarks_id_respects_limit() {
        let lists = RawLists {
            entities: (0..5)
                .map(|i| entity(&i.to_string(), "JOHN DOE", "individual", "Passport No. 42."))
                .collect(),
            ..Default::default()
        };
        let searcher = Searcher::new(Scorer::default(), 2);
        searcher
            .install(Snapshot::build(lists, &NamePipeline::new()))
            .await;

        let found = searcher.find_by_remarks_id(3, "42").await;
        let ids: Vec<_> = found.iter().map(|m| m.record.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_filter_by_country() {
        let searcher = test_searcher().await;

        let japan = searcher.filter_by_country("JAPAN").await;
        assert_eq!(japan.len(), 1);
        assert_eq!(japan[0].address_id, "201");

        assert_eq!(searcher.filter_by_country("japan").await.len(), 1);
        assert!(searcher.filter_by_country("France").await.is_empty());
        assert_eq!(searcher.filter_by_country("").await.len(), 3);
    }

    #[tokio::test]
    async fn test_find_exact_and_related() {
        let searcher = test_searcher().await;

        let sdn = searcher.find_exact("306").await.unwrap();
        assert_eq!(sdn.sdn_name, "BANCO NACIONAL DE CUBA");
        assert!(searcher.find_exact("nope").await.is_none());

        assert_eq!(searcher.find_addresses(10, "306").await.len(), 2);
        assert_eq!(searcher.find_addresses(1, "306").await.len(), 1);
        assert_eq!(searcher.find_alts(10, "306").await.len(), 1);
        assert!(searcher.find_alts(10, "2682").await.is_empty());
    }

    #[test]
    fn test_remarks_id_matching_rules() {
        assert!(remarks_id_matches("123 456", "123 456", &["123", "456"]));
        assert!(!remarks_id_matches("123 456", "123", &["123"]));
        assert!(!remarks_id_matches("123 456", "123 456 789", &["123", "456", "789"]));
        // Non-numeric multi-part IDs fall back to verbatim comparison
        assert!(remarks_id_matches("AB CD", "AB CD", &["AB", "CD"]));
        assert!(!remarks_id_matches("AB CD", "AB", &["AB"]));
        assert!(!remarks_id_matches("", "", &[]));
    }

    #[test]
    fn test_match_serializes_flat() {
        let m = Match {
            record: entity("306", "BANCO NACIONAL DE CUBA", "individual", ""),
            score: 0.95,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["entityID"], "306");
        assert_eq!(json["match"], 0.95);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_bounds_scoring_across_searches() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let addresses = (0..40)
            .map(|i| SdnAddress {
                entity_id: i.to_string(),
                address_id: i.to_string(),
                country: "Cuba".to_string(),
                ..Default::default()
            })
            .collect();
        let searcher = Arc::new(Searcher::new(Scorer::default(), 2));
        searcher
            .install(Snapshot::build(
                RawLists {
                    addresses,
                    ..Default::default()
                },
                &NamePipeline::new(),
            ))
            .await;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut searches = Vec::new();
        for _ in 0..4 {
            let searcher = Arc::clone(&searcher);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let compare = AddressComparator::new(move |_| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(1));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                0.5
            });
            searches.push(tokio::spawn(async move {
                searcher.top_addresses_by(5, 0.0, compare).await
            }));
        }

        for search in searches {
            assert_eq!(search.await.unwrap().len(), 5);
        }
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak >= 1);
        assert!(peak <= 2, "{peak} scoring tasks ran at once with 2 workers");
    }
}
