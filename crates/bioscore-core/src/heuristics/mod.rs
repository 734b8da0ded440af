//! Heuristic lookup data shared by the pillars.
//!
//! Keyword lists and numeric bucket tables are plain data so each mapping can be
//! read, reviewed and tested without walking through control flow.

mod keywords;
mod tables;

pub use keywords::{
    is_valid_trial_id, trial_is_complete, KeywordSet, COMPLEXITY_KEYWORDS, HIGH_DEMAND_KEYWORDS,
    NOVEL_MODALITY_KEYWORDS,
};
pub use tables::{BucketTable, LookupTable};
