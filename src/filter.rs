// 🧹 Relevance Filter - Which history counts as evidence for a query
//
// Two phases:
// 1. Knowledge gate: the query's brand AND category must each appear
//    somewhere in the history, otherwise nothing is relevant
// 2. Exclusion pass: drop records that are much pricier than the query
//    or too old

use crate::config::ScoringConfig;
use crate::query::Query;
use crate::records::PurchaseRecord;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// EXCLUSION RULES
// ============================================================================

/// Slack for float rounding when comparing against the price gap, so a
/// record at exactly the gap is kept
const PRICE_GAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExclusionReason {
    /// Record is pricier than the query by `percent` (above the configured gap)
    PriceGap { percent: f64 },
    /// Record is `age` years old (above the configured gap)
    Stale { age: i64 },
}

/// Percent by which `record_price` exceeds `query_price`.
/// None when the query price is zero: the gap is undefined there and the
/// price rule does not apply.
pub fn price_gap_percent(record_price: f64, query_price: f64) -> Option<f64> {
    if query_price == 0.0 {
        return None;
    }
    Some((record_price - query_price) / query_price * 100.0)
}

/// Why `record` should be left out for `query`, if at all.
/// Price is checked before recency.
pub fn exclusion_reason(
    record: &PurchaseRecord,
    query: &Query,
    config: &ScoringConfig,
) -> Option<ExclusionReason> {
    if let Some(percent) = price_gap_percent(record.price, query.price) {
        if percent - config.price_gap_percent > PRICE_GAP_TOLERANCE {
            return Some(ExclusionReason::PriceGap { percent });
        }
    }

    let age = i64::from(config.current_year) - i64::from(record.year_of_purchase);
    if age > i64::from(config.year_gap) {
        return Some(ExclusionReason::Stale { age });
    }

    None
}

pub fn should_be_excluded(record: &PurchaseRecord, query: &Query, config: &ScoringConfig) -> bool {
    exclusion_reason(record, query, config).is_some()
}

// ============================================================================
// KNOWLEDGE GATE
// ============================================================================

/// True when the history has seen both the query's brand and its category.
/// They may come from different records.
pub fn knowledge_gate(records: &[PurchaseRecord], query: &Query) -> bool {
    let mut brand_exists = false;
    let mut category_exists = false;

    for record in records {
        brand_exists |= record.brand == query.brand;
        category_exists |= record.category == query.category;
        if brand_exists && category_exists {
            return true;
        }
    }

    false
}

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterStats {
    pub gate_passed: bool,
    pub considered: usize,
    pub excluded_by_price: usize,
    pub excluded_by_age: usize,
    pub kept: usize,
}

/// Relevant records for `query`, original order preserved
pub fn filter_relevant<'a>(
    records: &'a [PurchaseRecord],
    query: &Query,
    config: &ScoringConfig,
) -> Vec<&'a PurchaseRecord> {
    filter_with_stats(records, query, config).0
}

/// Same as [`filter_relevant`], also counting what each rule removed
pub fn filter_with_stats<'a>(
    records: &'a [PurchaseRecord],
    query: &Query,
    config: &ScoringConfig,
) -> (Vec<&'a PurchaseRecord>, FilterStats) {
    let mut stats = FilterStats {
        considered: records.len(),
        ..FilterStats::default()
    };

    if !knowledge_gate(records, query) {
        debug!(brand = %query.brand, category = %query.category, "query outside known history");
        return (Vec::new(), stats);
    }
    stats.gate_passed = true;

    let kept: Vec<&PurchaseRecord> = records
        .iter()
        .filter(|record| match exclusion_reason(record, query, config) {
            Some(ExclusionReason::PriceGap { .. }) => {
                stats.excluded_by_price += 1;
                false
            }
            Some(ExclusionReason::Stale { .. }) => {
                stats.excluded_by_age += 1;
                false
            }
            None => true,
        })
        .collect();
    stats.kept = kept.len();

    debug!(?stats, "filtered purchase history");
    (kept, stats)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(brand: &str, category: &str, price: f64, year: i32) -> PurchaseRecord {
        PurchaseRecord::new(brand, category, price, true, true, year)
    }

    fn query(price: f64) -> Query {
        Query::new("Acme", "Widget", price, false, true)
    }

    #[test]
    fn test_unknown_brand_or_category_yields_nothing() {
        let config = ScoringConfig::default();
        let records = vec![record("Acme", "Gadget", 10.0, 2023), record("Zeta", "Tool", 10.0, 2023)];

        let q = Query::new("Acme", "Widget", 10.0, false, false);
        assert!(filter_relevant(&records, &q, &config).is_empty());

        let q = Query::new("Nope", "Gadget", 10.0, false, false);
        assert!(filter_relevant(&records, &q, &config).is_empty());
    }

    #[test]
    fn test_gate_accepts_brand_and_category_from_different_records() {
        let config = ScoringConfig::default();
        let records = vec![record("Acme", "Gadget", 10.0, 2023), record("Zeta", "Widget", 10.0, 2023)];

        let kept = filter_relevant(&records, &query(10.0), &config);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_price_gap_boundary_is_strict() {
        let config = ScoringConfig::default();
        let q = query(100.0);

        assert!(!should_be_excluded(&record("Acme", "Widget", 125.0, 2023), &q, &config));
        assert!(should_be_excluded(&record("Acme", "Widget", 125.01, 2023), &q, &config));

        let q = query(95.0);
        assert!(!should_be_excluded(&record("Acme", "Widget", 118.75, 2023), &q, &config));
        assert!(should_be_excluded(&record("Acme", "Widget", 95.0 * 1.2501, 2023), &q, &config));
    }

    #[test]
    fn test_price_gap_boundary_with_inexact_prices() {
        let config = ScoringConfig::default();

        for price in [9.99, 19.99, 0.1, 3.3, 1234.56] {
            let q = query(price);
            let at_gap = record("Acme", "Widget", price * 1.25, 2023);
            let past_gap = record("Acme", "Widget", price * 1.2501, 2023);

            assert_eq!(exclusion_reason(&at_gap, &q, &config), None, "price {}", price);
            assert!(should_be_excluded(&past_gap, &q, &config), "price {}", price);
        }
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let config = ScoringConfig::default();
        let q = query(10.0);

        assert_eq!(
            exclusion_reason(&record("Acme", "Widget", 10.0, i32::MIN), &q, &config),
            Some(ExclusionReason::Stale { age: 2023 - i64::from(i32::MIN) })
        );
        assert!(!should_be_excluded(&record("Acme", "Widget", 10.0, i32::MAX), &q, &config));
    }

    #[test]
    fn test_cheaper_records_never_excluded_on_price() {
        let config = ScoringConfig::default();
        assert!(!should_be_excluded(&record("Acme", "Widget", 1.0, 2023), &query(1000.0), &config));
    }

    #[test]
    fn test_recency_boundary() {
        let config = ScoringConfig::default();
        let q = query(100.0);

        assert!(!should_be_excluded(&record("Acme", "Widget", 100.0, 2020), &q, &config));
        assert_eq!(
            exclusion_reason(&record("Acme", "Widget", 100.0, 2019), &q, &config),
            Some(ExclusionReason::Stale { age: 4 })
        );
    }

    #[test]
    fn test_zero_price_query_skips_price_rule() {
        let config = ScoringConfig::default();
        let q = query(0.0);

        assert_eq!(price_gap_percent(500.0, 0.0), None);
        assert!(!should_be_excluded(&record("Acme", "Widget", 500.0, 2023), &q, &config));
        assert!(should_be_excluded(&record("Acme", "Widget", 500.0, 2010), &q, &config));
    }

    #[test]
    fn test_tuned_config_changes_outcome() {
        let config = ScoringConfig {
            year_gap: 10,
            price_gap_percent: 100.0,
            ..ScoringConfig::default()
        };
        let q = query(100.0);

        assert!(!should_be_excluded(&record("Acme", "Widget", 190.0, 2015), &q, &config));
    }

    #[test]
    fn test_order_preserved_and_stats_counted() {
        let config = ScoringConfig::default();
        let records = vec![
            record("Acme", "Widget", 90.0, 2023),
            record("Acme", "Widget", 500.0, 2023),
            record("Zeta", "Widget", 80.0, 2022),
            record("Acme", "Widget", 90.0, 2001),
            record("Acme", "Gadget", 70.0, 2021),
        ];

        let (kept, stats) = filter_with_stats(&records, &query(100.0), &config);

        let prices: Vec<f64> = kept.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![90.0, 80.0, 70.0]);
        assert_eq!(
            stats,
            FilterStats {
                gate_passed: true,
                considered: 5,
                excluded_by_price: 1,
                excluded_by_age: 1,
                kept: 3,
            }
        );
    }
}
