//! Fuzzy search over the synchronized row set.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use strsim::normalized_damerau_levenshtein;

use crate::rows::TrackedUrl;

pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Query words shorter than this only count on an exact word hit; one edit
/// in a three letter word is a different word.
const MIN_TYPO_LEN: usize = 4;

/// Approximate matcher over `url`, status label and formatted `last_updated`.
///
/// Each field gets two scores in `[0, 1]`: skim's subsequence score relative
/// to the query's self-match, and the Damerau-Levenshtein similarity of each
/// query word to the closest word of the field. The better one is the field
/// score; a row's score is its best field.
///
/// `threshold` is the tolerance: a row is kept when its score reaches
/// `1 - threshold`. `0.0` demands an exact hit, `1.0` keeps any row with a
/// nonzero score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchFilter {
    threshold: f64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchFilter {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Blank queries return `rows` untouched; otherwise matches ordered by
    /// relevance, ties kept in input order.
    pub fn apply(&self, rows: &[TrackedUrl], query: &str) -> Vec<TrackedUrl> {
        let query = query.trim();
        if query.is_empty() {
            return rows.to_vec();
        }

        let scorer = Scorer::new(query);
        let floor = 1.0 - self.threshold;

        let mut ranked: Vec<(f64, usize)> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let score = scorer.row_score(row);
                (score > 0.0 && score >= floor).then_some((score, index))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        ranked
            .into_iter()
            .map(|(_, index)| rows[index].clone())
            .collect()
    }
}

/// `SearchFilter::default().apply(rows, query)`.
pub fn filter(rows: &[TrackedUrl], query: &str) -> Vec<TrackedUrl> {
    SearchFilter::default().apply(rows, query)
}

struct Scorer<'q> {
    query: &'q str,
    words: Vec<String>,
    matcher: SkimMatcherV2,
    perfect: Option<i64>,
}

impl<'q> Scorer<'q> {
    fn new(query: &'q str) -> Self {
        let matcher = SkimMatcherV2::default().ignore_case();
        let perfect = matcher.fuzzy_match(query, query).filter(|score| *score > 0);
        Self {
            query,
            words: words(query),
            matcher,
            perfect,
        }
    }

    fn row_score(&self, row: &TrackedUrl) -> f64 {
        let updated = row.last_updated_label();
        [row.url.as_str(), row.status.label(), updated.as_str()]
            .into_iter()
            .map(|field| self.field_score(field))
            .fold(0.0, f64::max)
    }

    fn field_score(&self, field: &str) -> f64 {
        self.subsequence_score(field).max(self.typo_score(field))
    }

    fn subsequence_score(&self, field: &str) -> f64 {
        let (Some(perfect), Some(score)) = (self.perfect, self.matcher.fuzzy_match(field, self.query))
        else {
            return 0.0;
        };
        (score as f64 / perfect as f64).clamp(0.0, 1.0)
    }

    /// Mean over query words of the best similarity to any field word.
    fn typo_score(&self, field: &str) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        let candidates = words(field);
        let total: f64 = self
            .words
            .iter()
            .map(|word| {
                candidates
                    .iter()
                    .map(|candidate| word_similarity(word, candidate))
                    .fold(0.0, f64::max)
            })
            .sum();
        total / self.words.len() as f64
    }
}

fn word_similarity(word: &str, candidate: &str) -> f64 {
    if word == candidate {
        1.0
    } else if word.chars().count() < MIN_TYPO_LEN {
        0.0
    } else {
        normalized_damerau_levenshtein(word, candidate)
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
