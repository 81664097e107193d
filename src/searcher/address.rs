//! Pluggable address comparison
//!
//! An [`AddressComparator`] extracts one precomputed field of an address and
//! scores it against a captured query. [`AddressComparator::average`] folds
//! several comparators into one, so callers can rank on a combination of
//! free-text address, city/state/postal code and country.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::normalize::precompute;
use crate::scoring::Scorer;
use crate::snapshot::IndexedAddress;

type CompareFn = dyn Fn(&IndexedAddress) -> f64 + Send + Sync;

/// Scores an address against a captured query
#[derive(Clone)]
pub struct AddressComparator {
    compare: Arc<CompareFn>,
}

impl std::fmt::Debug for AddressComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressComparator").finish_non_exhaustive()
    }
}

impl AddressComparator {
    /// Comparator from an arbitrary scoring function
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&IndexedAddress) -> f64 + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(compare),
        }
    }

    /// Rank on the free-text street address
    pub fn address(scorer: Scorer, query: &str) -> Self {
        let query = precompute(query);
        Self::new(move |a| scorer.score(a.address(), &query))
    }

    /// Rank on the city, state, province and postal code composite
    pub fn city_state(scorer: Scorer, query: &str) -> Self {
        let query = precompute(query);
        Self::new(move |a| scorer.score(a.city_state(), &query))
    }

    /// Rank on the country
    pub fn country(scorer: Scorer, query: &str) -> Self {
        let query = precompute(query);
        Self::new(move |a| scorer.score(a.country(), &query))
    }

    /// Average of several comparators. An empty set scores everything 0.0.
    pub fn average(comparators: Vec<AddressComparator>) -> Self {
        Self::new(move |a| {
            if comparators.is_empty() {
                return 0.0;
            }
            let total: f64 = comparators.iter().map(|c| c.compare(a)).sum();
            total / comparators.len() as f64
        })
    }

    pub fn compare(&self, address: &IndexedAddress) -> f64 {
        (self.compare)(address)
    }
}

/// Address criteria of a search request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressQuery {
    pub address: Option<String>,
    pub city_state: Option<String>,
    pub country: Option<String>,
}

impl AddressQuery {
    /// Average comparator over the non-blank criteria, `None` when all are blank
    pub fn comparator(&self, scorer: Scorer) -> Option<AddressComparator> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut comparators = Vec::new();
        if let Some(q) = non_blank(&self.address) {
            comparators.push(AddressComparator::address(scorer, &q));
        }
        if let Some(q) = non_blank(&self.city_state) {
            comparators.push(AddressComparator::city_state(scorer, &q));
        }
        if let Some(q) = non_blank(&self.country) {
            comparators.push(AddressComparator::country(scorer, &q));
        }

        match comparators.len() {
            0 => None,
            1 => comparators.pop(),
            _ => Some(AddressComparator::average(comparators)),
        }
    }
}
