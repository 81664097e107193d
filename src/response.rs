//! Search response assembly
//!
//! The response is built once, after ranking completes: every list is
//! searched, the top score is taken across them, and a content hash is
//! computed over everything except the refresh timestamp so identical
//! results hash identically across refreshes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::lists::{AlternateName, DeniedPerson, ScreeningListEntry, SdnAddress, SdnEntity};
use crate::searcher::{AddressQuery, Match, Searcher};

/// One screening request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub name: String,
    pub email: String,
    pub address: Option<AddressQuery>,
    pub limit: usize,
    pub min_match: f64,
}

/// Ranked matches for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(rename = "SDNs")]
    pub entities: Vec<Match<SdnEntity>>,
    pub addresses: Vec<Match<SdnAddress>>,
    pub alt_names: Vec<Match<AlternateName>>,
    pub denied_persons: Vec<Match<DeniedPerson>>,
    pub screening_list: Vec<Match<ScreeningListEntry>>,
    pub email: String,
    pub full_name: String,
    /// Highest score across every list, 0.0 when nothing matched
    #[serde(rename = "match")]
    pub top_match: f64,
    pub hash: String,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl SearchResponse {
    /// SHA-256 over the response with `refreshed_at` and `hash` cleared.
    ///
    /// `None` when the response cannot be encoded.
    pub fn content_hash(&self) -> Option<String> {
        let mut canonical = self.clone();
        canonical.refreshed_at = None;
        canonical.hash = String::new();

        match serde_json::to_vec(&canonical) {
            Ok(bytes) => Some(hex::encode(Sha256::digest(&bytes))),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode search response for hashing");
                None
            }
        }
    }

    fn top_score(&self) -> f64 {
        let scores = self
            .entities
            .iter()
            .map(|m| m.score)
            .chain(self.addresses.iter().map(|m| m.score))
            .chain(self.alt_names.iter().map(|m| m.score))
            .chain(self.denied_persons.iter().map(|m| m.score))
            .chain(self.screening_list.iter().map(|m| m.score));
        scores.fold(0.0, f64::max)
    }
}

/// Run every list search for `request` against the searcher's current data
pub async fn build_search_response(searcher: &Searcher, request: &SearchRequest) -> SearchResponse {
    let SearchRequest {
        name,
        email,
        address,
        limit,
        min_match,
    } = request;
    let (limit, min_match) = (*limit, *min_match);

    // Every list and the timestamp come from the same generation
    let snapshot = searcher.snapshot().await;

    let (entities, alt_names, denied_persons, screening_list) = tokio::join!(
        searcher.top_entities_in(Arc::clone(&snapshot), limit, min_match, name),
        searcher.top_alt_names_in(Arc::clone(&snapshot), limit, min_match, name),
        searcher.top_denied_persons_in(Arc::clone(&snapshot), limit, min_match, name),
        searcher.top_screening_list_in(Arc::clone(&snapshot), limit, min_match, name),
    );

    let addresses = match address
        .as_ref()
        .and_then(|q| q.comparator(searcher.scorer()))
    {
        Some(compare) => {
            searcher
                .top_addresses_in(Arc::clone(&snapshot), limit, min_match, compare)
                .await
        }
        None => Vec::new(),
    };

    let mut response = SearchResponse {
        entities,
        addresses,
        alt_names,
        denied_persons,
        screening_list,
        email: email.clone(),
        full_name: name.clone(),
        top_match: 0.0,
        hash: String::new(),
        refreshed_at: snapshot.refreshed_at(),
    };
    response.top_match = response.top_score();
    response.hash = response.content_hash().unwrap_or_default();
    response
}
