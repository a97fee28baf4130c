// Purchase Likelihood - Core Library
// Scores a candidate purchase against a buyer's purchase history

pub mod records;
pub mod query;
pub mod config;
pub mod filter;
pub mod scorer;

// Re-export commonly used types
pub use records::{
    PurchaseRecord, RecordStore, LoadReport, SkippedRow, LoadError, RowError,
    load_records, load_records_from_reader, load_or_empty, parse_flag,
};
pub use query::{Query, QueryError};
pub use config::{ScoringConfig, ConfigError};
pub use filter::{
    ExclusionReason, FilterStats,
    filter_relevant, filter_with_stats, knowledge_gate, exclusion_reason, should_be_excluded,
};
pub use scorer::{
    BehaviorProfile, AttributeRatios, Bonus, ScoreBreakdown, Evaluation,
    score, score_breakdown, evaluate,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
