//! Text normalization and the name precomputation pipeline
//!
//! [`precompute`] is the single normalization applied to every query term
//! and every stored field, so both sides of a comparison are folded the same
//! way:
//! - Unicode NFKD decomposition with combining marks dropped (diacritics)
//! - Lowercase conversion
//! - Hyphens, slashes and underscores become spaces, other punctuation is dropped
//! - Whitespace collapsing
//!
//! Names additionally run through a [`NamePipeline`] which reorders
//! "LAST, FIRST" individual names and strips trailing legal-form tokens from
//! organization names before normalizing.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::PipelineError;

/// Trailing legal-form tokens removed from organization names
const COMPANY_TITLES: &[&str] = &[
    "co",
    "company",
    "corp",
    "corporation",
    "gmbh",
    "inc",
    "incorporated",
    "limited",
    "llc",
    "llp",
    "lp",
    "ltd",
    "plc",
    "sa",
];

/// Normalize text for matching.
///
/// ```
/// use sanctions_screen::normalize::precompute;
///
/// assert_eq!(precompute("Banco Nacional de Cuba"), "banco nacional de cuba");
/// assert_eq!(precompute("Société Générale"), "societe generale");
/// assert_eq!(precompute("AL-QAIDA, Inc."), "al qaida inc");
/// ```
pub fn precompute(s: &str) -> String {
    let folded: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter_map(|c| match c {
            '-' | '/' | '_' => Some(' '),
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            _ => None,
        })
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// What kind of record a name came from. Decides which pipeline steps apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Individual,
    Organization,
    AlternateName,
    DeniedPerson,
    ScreeningList,
}

/// A name moving through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub original: String,
    pub processed: String,
    pub kind: NameKind,
}

impl Name {
    pub fn new(original: impl Into<String>, kind: NameKind) -> Self {
        let original = original.into();
        Self {
            processed: original.clone(),
            original,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Reorder,
    CompanyTitles,
    Normalize,
}

impl Step {
    const ALL: [Step; 3] = [Step::Reorder, Step::CompanyTitles, Step::Normalize];

    fn label(self) -> &'static str {
        match self {
            Step::Reorder => "reorder",
            Step::CompanyTitles => "company_titles",
            Step::Normalize => "normalize",
        }
    }

    fn apply(self, name: &mut Name) {
        match self {
            Step::Reorder if name.kind == NameKind::Individual => {
                name.processed = reorder_name(&name.processed);
            }
            Step::CompanyTitles if name.kind == NameKind::Organization => {
                name.processed = remove_company_titles(&name.processed);
            }
            Step::Normalize => {
                name.processed = precompute(&name.processed);
            }
            _ => {}
        }
    }
}

/// Ordered name precomputation steps
#[derive(Debug, Clone, Default)]
pub struct NamePipeline {
    debug: bool,
}

impl NamePipeline {
    pub fn new() -> Self {
        Self { debug: false }
    }

    /// Pipeline that logs each step's output at debug level
    pub fn with_debug(debug: bool) -> Self {
        Self { debug }
    }

    /// Run every step over `name`, leaving the result in `name.processed`.
    ///
    /// Fails when a step leaves nothing to match against. Callers skip the
    /// record rather than abort the build.
    pub fn process(&self, name: &mut Name) -> Result<(), PipelineError> {
        for step in Step::ALL {
            step.apply(name);

            if self.debug {
                tracing::debug!(
                    step = step.label(),
                    original = %name.original,
                    processed = %name.processed,
                    "name pipeline step"
                );
            }

            if name.processed.trim().is_empty() {
                return Err(PipelineError::EmptyName {
                    original: name.original.clone(),
                    step: step.label(),
                });
            }
        }
        Ok(())
    }

    /// Convenience wrapper returning the processed string
    pub fn run(&self, original: &str, kind: NameKind) -> Result<String, PipelineError> {
        let mut name = Name::new(original, kind);
        self.process(&mut name)?;
        Ok(name.processed)
    }
}

/// "MADURO MOROS, Nicolas" becomes "Nicolas MADURO MOROS"
fn reorder_name(s: &str) -> String {
    match s.split_once(',') {
        Some((last, first)) if !last.trim().is_empty() && !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => s.to_string(),
    }
}

/// Strip trailing legal-form tokens, always keeping at least one token
fn remove_company_titles(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1]
            .trim_end_matches(['.', ','])
            .to_lowercase();
        if COMPANY_TITLES.contains(&last.as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens
        .join(" ")
        .trim_end_matches([',', ' '])
        .to_string()
}
