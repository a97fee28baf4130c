// 📈 Likelihood Scorer - Turns the relevant history into a score
//
// score = average of four attribute-match ratios
//       + a flat bonus for each buying preference the query matches
//
// Ratios are smoothed with an N+1 denominator, so a single matching record
// gives 50 rather than 100. The score is a heuristic and is not clamped.

use crate::config::ScoringConfig;
use crate::filter::{filter_with_stats, FilterStats};
use crate::query::Query;
use crate::records::PurchaseRecord;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// BEHAVIORAL AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorProfile {
    pub online_purchases: usize,
    pub on_sale_purchases: usize,
    pub likes_online: bool,
    pub likes_on_sale: bool,
}

impl BehaviorProfile {
    /// Preferences hold when strictly more than half (rounded down) of the
    /// subset shows them
    pub fn from_subset(subset: &[&PurchaseRecord]) -> Self {
        let half = subset.len() / 2;
        let online_purchases = subset.iter().filter(|r| r.ordered_online).count();
        let on_sale_purchases = subset.iter().filter(|r| r.is_on_sale()).count();

        BehaviorProfile {
            online_purchases,
            on_sale_purchases,
            likes_online: online_purchases > half,
            likes_on_sale: on_sale_purchases > half,
        }
    }
}

// ============================================================================
// ATTRIBUTE RATIOS
// ============================================================================

/// Percent of the subset matching each attribute, over `len + 1`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRatios {
    pub brand: f64,
    pub category: f64,
    pub year: f64,
    pub price: f64,
}

impl AttributeRatios {
    pub fn compute(subset: &[&PurchaseRecord], query: &Query, config: &ScoringConfig) -> Self {
        let to_ratio = (subset.len() + 1) as f64;
        let recent_from = i64::from(config.current_year) - i64::from(config.recent_years);
        let percent = |count: usize| count as f64 / to_ratio * 100.0;

        let brand = subset.iter().filter(|r| r.brand == query.brand).count();
        let category = subset.iter().filter(|r| r.category == query.category).count();
        let year = subset.iter().filter(|r| i64::from(r.year_of_purchase) >= recent_from).count();
        let price = subset.iter().filter(|r| r.price >= query.price).count();

        AttributeRatios {
            brand: percent(brand),
            category: percent(category),
            year: percent(year),
            price: percent(price),
        }
    }

    pub fn base_score(&self) -> f64 {
        (self.brand + self.category + self.year + self.price) / 4.0
    }
}

// ============================================================================
// BONUSES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bonus {
    /// Buyer mostly orders online and the query is for delivery
    PrefersOnline,
    /// Buyer mostly shops in store and the query is in store
    PrefersInStore,
    /// Buyer mostly buys on sale and the query is on sale
    PrefersSales,
}

impl Bonus {
    pub fn earned(profile: &BehaviorProfile, query: &Query) -> Vec<Bonus> {
        let mut bonuses = Vec::new();
        if profile.likes_online && query.delivery {
            bonuses.push(Bonus::PrefersOnline);
        }
        if !profile.likes_online && !query.delivery {
            bonuses.push(Bonus::PrefersInStore);
        }
        if profile.likes_on_sale && query.is_on_sale {
            bonuses.push(Bonus::PrefersSales);
        }
        bonuses
    }
}

// ============================================================================
// SCORING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub subset_size: usize,
    pub profile: BehaviorProfile,
    pub ratios: AttributeRatios,
    pub base_score: f64,
    pub bonuses: Vec<Bonus>,
    pub total: f64,
}

/// Score a non-empty relevant subset. Callers handle the empty case.
pub fn score_breakdown(
    subset: &[&PurchaseRecord],
    query: &Query,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let profile = BehaviorProfile::from_subset(subset);
    let ratios = AttributeRatios::compute(subset, query, config);
    let base_score = ratios.base_score();
    let bonuses = Bonus::earned(&profile, query);
    let total = base_score + bonuses.len() as f64 * config.preference_bonus;

    ScoreBreakdown {
        subset_size: subset.len(),
        profile,
        ratios,
        base_score,
        bonuses,
        total,
    }
}

pub fn score(subset: &[&PurchaseRecord], query: &Query, config: &ScoringConfig) -> f64 {
    score_breakdown(subset, query, config).total
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Result of evaluating one query against the whole history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub query: Query,
    pub score: f64,
    /// None when nothing in the history was relevant
    pub breakdown: Option<ScoreBreakdown>,
    pub stats: FilterStats,
}

/// Filter then score. An empty relevant subset scores 0 without invoking
/// the scorer.
pub fn evaluate(records: &[PurchaseRecord], query: &Query, config: &ScoringConfig) -> Evaluation {
    let (subset, stats) = filter_with_stats(records, query, config);

    let breakdown = if subset.is_empty() {
        None
    } else {
        Some(score_breakdown(&subset, query, config))
    };
    let score = breakdown.as_ref().map_or(0.0, |b| b.total);

    debug!(score, relevant = subset.len(), "evaluated query");

    Evaluation {
        query: query.clone(),
        score,
        breakdown,
        stats,
    }
}

// ============================================================================
// TESTS
// ============================================================================
