//! Batch screening of a delimited input file
//!
//! Input rows are `id<delim>email<delim>name`, with a header row first.
//! Rows are screened concurrently; each task writes only its own result
//! slot, so the output keeps input order.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::response::{build_search_response, SearchRequest, SearchResponse};
use crate::searcher::Searcher;

/// One row of the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Read input rows, skipping the header and any row without three fields
pub fn parse_input_file(path: impl AsRef<Path>, delimiter: &Regex) -> std::io::Result<Vec<InputRow>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    Ok(parse_rows(&raw, delimiter))
}

fn parse_rows(raw: &str, delimiter: &Regex) -> Vec<InputRow> {
    let mut rows = Vec::new();
    for (n, line) in raw.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = delimiter.splitn(line, 3).map(str::trim).collect();
        match fields.as_slice() {
            [id, email, name] if !name.is_empty() => rows.push(InputRow {
                id: id.to_string(),
                email: email.to_string(),
                name: name.to_string(),
            }),
            _ => tracing::warn!(line = n + 1, "skipping malformed input row"),
        }
    }
    rows
}

/// Screen every row, at most `workers` at a time. Results follow input order.
pub async fn screen_rows(
    searcher: Arc<Searcher>,
    rows: Vec<InputRow>,
    limit: usize,
    min_match: f64,
    workers: usize,
) -> Vec<SearchResponse> {
    let total = rows.len();
    let gate = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (i, row) in rows.into_iter().enumerate() {
        let permit = match Arc::clone(&gate).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(error = %e, "batch gate closed");
                break;
            }
        };

        let searcher = Arc::clone(&searcher);
        tasks.spawn(async move {
            let _permit = permit;
            let request = SearchRequest {
                name: row.name,
                email: row.email,
                address: None,
                limit,
                min_match,
            };
            let response = build_search_response(&searcher, &request).await;
            if response.top_match > 0.0 {
                tracing::debug!(row = %row.id, score = response.top_match, "row matched");
            }
            (i, response)
        });
    }

    let mut slots: Vec<Option<SearchResponse>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((i, response)) => slots[i] = Some(response),
            Err(e) => tracing::warn!(error = %e, "screening task failed"),
        }
    }

    let results: Vec<SearchResponse> = slots.into_iter().flatten().collect();
    tracing::info!(rows = total, screened = results.len(), "batch screening complete");
    results
}
