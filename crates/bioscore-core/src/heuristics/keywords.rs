//! Keyword sets for text heuristics.
//!
//! Matching is case-insensitive substring containment: a keyword matches when
//! the lowercased text contains it anywhere.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ClinicalTrial;

lazy_static! {
    /// ClinicalTrials.gov identifier: "NCT" followed by eight digits.
    static ref TRIAL_ID_PATTERN: Regex = Regex::new(r"^NCT\d{8}$").unwrap();
}

/// A fixed list of lowercase keywords.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    keywords: &'static [&'static str],
}

/// Therapeutic areas that drive development cost and regulatory complexity.
pub const COMPLEXITY_KEYWORDS: KeywordSet = KeywordSet::new(&[
    "oncology",
    "neurology",
    "rare diseases",
    "gene therapy",
]);

/// Mechanisms without a long regulatory track record.
pub const NOVEL_MODALITY_KEYWORDS: KeywordSet = KeywordSet::new(&[
    "gene therapy",
    "cell therapy",
    "crispr",
    "mrna",
    "car-t",
    "gene editing",
]);

/// Therapeutic areas with strong partnering and investor demand.
pub const HIGH_DEMAND_KEYWORDS: KeywordSet = KeywordSet::new(&[
    "oncology",
    "immunology",
    "neurology",
    "rare diseases",
    "metabolic",
]);

impl KeywordSet {
    pub const fn new(keywords: &'static [&'static str]) -> Self {
        Self { keywords }
    }

    /// First keyword contained in `text`, if any.
    pub fn find(&self, text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .copied()
            .find(|keyword| lower.contains(keyword))
    }

    /// Whether `text` contains any keyword.
    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// First keyword found across several texts, scanning texts in order.
    pub fn find_in<'a, I>(&self, texts: I) -> Option<&'static str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().find_map(|text| self.find(text))
    }
}

/// Whether a trial identifier has the registry format.
pub fn is_valid_trial_id(id: &str) -> bool {
    TRIAL_ID_PATTERN.is_match(id.trim())
}

/// Whether a trial record carries every supporting sub-field.
pub fn trial_is_complete(trial: &ClinicalTrial) -> bool {
    is_valid_trial_id(&trial.id)
        && trial
            .indication
            .as_deref()
            .is_some_and(|indication| !indication.trim().is_empty())
        && trial.enrollment.is_some_and(|enrollment| enrollment > 0)
        && trial
            .primary_endpoint
            .as_deref()
            .is_some_and(|endpoint| !endpoint.trim().is_empty())
        && trial.start_date.is_some()
}
