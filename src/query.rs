// 🔎 Query - Candidate purchase to evaluate
// Parsed from the five whitespace-separated tokens of the query loop

use crate::records::parse_flag;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub is_on_sale: bool,

    /// Would be bought via delivery/online
    pub delivery: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("expected 5 values (brand category price on_sale delivery), got {0}")]
    TokenCount(usize),
    #[error("price '{0}' is not a non-negative number")]
    InvalidPrice(String),
    #[error("{field} must be 1 or 0, got '{value}'")]
    InvalidFlag { field: &'static str, value: String },
}

impl Query {
    pub fn new(
        brand: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        is_on_sale: bool,
        delivery: bool,
    ) -> Self {
        Query {
            brand: brand.into(),
            category: category.into(),
            price,
            is_on_sale,
            delivery,
        }
    }

    /// Build a query from `brand category price on_sale delivery`
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, QueryError> {
        let [brand, category, price, on_sale, delivery] = tokens else {
            return Err(QueryError::TokenCount(tokens.len()));
        };

        let parsed_price: f64 = price
            .parse()
            .map_err(|_| QueryError::InvalidPrice(price.to_string()))?;
        if !parsed_price.is_finite() || parsed_price < 0.0 {
            return Err(QueryError::InvalidPrice(price.to_string()));
        }

        Ok(Query {
            brand: brand.to_string(),
            category: category.to_string(),
            price: parsed_price,
            is_on_sale: query_flag("on_sale", on_sale)?,
            delivery: query_flag("delivery", delivery)?,
        })
    }
}

fn query_flag(field: &'static str, value: &str) -> Result<bool, QueryError> {
    parse_flag(value).ok_or_else(|| QueryError::InvalidFlag {
        field,
        value: value.to_string(),
    })
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        Query::from_tokens(&tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_line() {
        let query: Query = "Acme Widget 95 0 1".parse().unwrap();
        assert_eq!(query, Query::new("Acme", "Widget", 95.0, false, true));
    }

    #[test]
    fn test_extra_whitespace_is_ignored() {
        let query: Query = "  Acme\tWidget   19.99 1  0 ".parse().unwrap();
        assert_eq!(query.price, 19.99);
        assert!(query.is_on_sale);
        assert!(!query.delivery);
    }

    #[test]
    fn test_wrong_token_count() {
        assert_eq!("Acme Widget 95 0".parse::<Query>(), Err(QueryError::TokenCount(4)));
        assert_eq!("".parse::<Query>(), Err(QueryError::TokenCount(0)));
    }

    #[test]
    fn test_invalid_price() {
        assert!(matches!(
            "Acme Widget cheap 0 1".parse::<Query>(),
            Err(QueryError::InvalidPrice(_))
        ));
        assert!(matches!(
            "Acme Widget -3 0 1".parse::<Query>(),
            Err(QueryError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_invalid_flag() {
        let err = "Acme Widget 95 2 1".parse::<Query>().unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidFlag {
                field: "on_sale",
                value: "2".to_string()
            }
        );
    }
}
