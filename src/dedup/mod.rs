//! Duplicate classification: normalization, trivial rules, candidate filtering
//! and aggregation

pub mod aggregate;
pub mod exclusion;
pub mod noise;
pub mod normalize;
pub mod pair_rules;
pub mod trivial;

pub use aggregate::{CandidateAggregator, DropReason, MergedCandidates};
pub use exclusion::{ExclusionFilter, ExclusionRule, ScanrRepublishedBook};
pub use noise::{all_common_titles, identifiers_from_same_source, share_identifier};
pub use normalize::{fold_compact, normalize};
pub use pair_rules::{MissingIdrefNnt, PairExclusionRule, PairExclusions, PairRuleError, MISSING_IDREF_NNT};
pub use trivial::{DuplicateRule, TrivialDuplicateClassifier};
