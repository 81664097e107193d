//! Government ID extraction from SDN remarks
//!
//! Remarks often carry a national ID, passport or license number in the
//! form `... No. NNNNN ...`. The extracted token backs the exact-match
//! lookup in [`crate::searcher::Searcher::find_by_remarks_id`].

/// Extract the ID following `No.` from a remarks string.
///
/// The token right after `No.` is always taken (trailing `.`/`;` trimmed).
/// If it ended the sentence it is returned alone; otherwise following
/// integer tokens are appended until a parenthesised token starts.
pub fn extract_id_from_remarks(remarks: &str) -> String {
    let parts: Vec<&str> = remarks.split_whitespace().collect();
    let mut out = String::new();

    for (i, part) in parts.iter().enumerate() {
        if *part != "No." {
            continue;
        }
        let Some(next) = parts.get(i + 1) else {
            break;
        };

        let trimmed = next.trim_end_matches('.').trim_end_matches(';');
        if next.ends_with('.') || next.ends_with(';') {
            return trimmed.to_string();
        }
        out.push_str(trimmed);

        for extra in &parts[i + 2..] {
            if extra.starts_with('(') {
                return out;
            }
            if extra.parse::<i32>().is_ok() {
                out.push(' ');
                out.push_str(extra);
            }
        }
    }
    out
}
