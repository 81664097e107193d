//! Word-level Jaro-Winkler similarity
//!
//! Names are compared token by token: each candidate token is matched to its
//! closest query token, and the per-token maxima are averaged. This keeps
//! word order from mattering ("CUBA NACIONAL BANCO" still ranks well) while
//! each word comparison tolerates typos and transpositions.

use crate::config::ScoringConfig;

/// Winkler prefix scaling factor
const PREFIX_SCALE: f64 = 0.1;

/// Similarity scorer parameterized by the runtime tunables
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Jaro-Winkler similarity of two single words.
    ///
    /// The prefix boost only applies once the raw Jaro similarity exceeds the
    /// boost threshold, and counts at most `prefix_size` leading characters.
    pub fn word_similarity(&self, a: &str, b: &str) -> f64 {
        let jaro = strsim::jaro(a, b);
        if jaro <= self.config.boost_threshold {
            return jaro;
        }

        let prefix = a
            .chars()
            .zip(b.chars())
            .take(self.config.prefix_size)
            .take_while(|(x, y)| x == y)
            .count();

        jaro + PREFIX_SCALE * prefix as f64 * (1.0 - jaro)
    }

    /// Score a precomputed candidate against a precomputed query.
    ///
    /// Returns 0.0 when either side has no tokens. With a non-zero
    /// exact-match favoritism the result can exceed 1.0.
    pub fn score(&self, candidate: &str, query: &str) -> f64 {
        let candidate_parts: Vec<&str> = candidate.split_whitespace().collect();
        let query_parts: Vec<&str> = query.split_whitespace().collect();
        if candidate_parts.is_empty() || query_parts.is_empty() {
            return 0.0;
        }

        let mut scores: Vec<f64> = candidate_parts
            .iter()
            .map(|word| {
                let max = query_parts
                    .iter()
                    .map(|q| self.word_similarity(word, q))
                    .fold(0.0_f64, f64::max);
                if max >= 1.0 {
                    max + self.config.exact_match_favoritism
                } else {
                    max
                }
            })
            .collect();

        // Long candidate names accumulate weak tokens; only keep as many of
        // the best scores as the query has words.
        scores.sort_by(f64::total_cmp);
        if candidate_parts.len() > query_parts.len() && query_parts.len() > 2 {
            scores.drain(..candidate_parts.len() - query_parts.len());
        }

        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> Scorer {
        Scorer::default()
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let s = scorer();
        assert_eq!(s.score("banco nacional", ""), 0.0);
        assert_eq!(s.score("", "banco nacional"), 0.0);
        assert_eq!(s.score("", ""), 0.0);
        assert_eq!(s.score("   ", "cuba"), 0.0);
    }

    #[test]
    fn test_identical_strings_score_one() {
        let s = scorer();
        assert!((s.score("banco nacional de cuba", "banco nacional de cuba") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_match_beats_unrelated() {
        let s = scorer();
        let name = "nicolas maduro moros";
        let own = s.score(name, name);
        for other in ["aerocaribbean airlines", "john smith", "banco nacional de cuba"] {
            assert!(own >= s.score(name, other), "{other} outranked self-match");
        }
    }

    #[test]
    fn test_word_order_does_not_matter() {
        let s = scorer();
        let forward = s.score("banco nacional de cuba", "banco nacional de cuba");
        let shuffled = s.score("cuba de nacional banco", "banco nacional de cuba");
        assert!((forward - shuffled).abs() < 1e-9);
    }

    #[test]
    fn test_typo_still_scores_high() {
        let s = scorer();
        let score = s.score("nicolas maduro", "nicolas madura");
        assert!(score > 0.9, "score was {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn test_prefix_boost_respects_threshold() {
        let strict = Scorer::new(ScoringConfig {
            boost_threshold: 0.99,
            ..ScoringConfig::default()
        });
        let default = scorer();
        // "martha" / "marhta" has raw Jaro ~0.944; the boost only applies by default
        let raw = strsim::jaro("martha", "marhta");
        assert_eq!(strict.word_similarity("martha", "marhta"), raw);
        assert!(default.word_similarity("martha", "marhta") > raw);
    }

    #[test]
    fn test_prefix_size_caps_boost() {
        let narrow = Scorer::new(ScoringConfig {
            prefix_size: 1,
            ..ScoringConfig::default()
        });
        assert!(narrow.word_similarity("martha", "marhta") < scorer().word_similarity("martha", "marhta"));
    }

    #[test]
    fn test_exact_match_favoritism_is_additive() {
        let favored = Scorer::new(ScoringConfig {
            exact_match_favoritism: 0.1,
            ..ScoringConfig::default()
        });
        let score = favored.score("cuba", "cuba");
        assert!((score - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_long_candidate_trimmed_to_query_length() {
        let s = scorer();
        // Five candidate tokens against a three token query: the two weakest
        // candidate tokens are discarded before averaging.
        let score = s.score("xq zv banco nacional cuba", "banco nacional cuba");
        assert!((score - 1.0).abs() < 1e-9);

        // With a two token query nothing is trimmed
        let untrimmed = s.score("xq banco nacional", "banco nacional");
        assert!(untrimmed < 1.0);
    }
}
