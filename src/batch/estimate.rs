// Rough API usage estimate for a loaded work list

use serde::Serialize;

/// Tokens one item costs on average: ~3,000 for the body conversion plus
/// ~500 for title generation.
const TOKENS_PER_ITEM: u64 = 3_500;
/// Blended price per token in USD.
const USD_PER_TOKEN: f64 = 0.00002;

/// Estimated API usage for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEstimate {
    pub items: usize,
    pub tokens: u64,
    pub estimated_usd: f64,
}

/// Estimate tokens and cost for a number of work items.
pub fn estimate_usage(item_count: usize) -> UsageEstimate {
    let tokens = item_count as u64 * TOKENS_PER_ITEM;
    UsageEstimate {
        items: item_count,
        tokens,
        estimated_usd: tokens as f64 * USD_PER_TOKEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_scales_linearly() {
        let estimate = estimate_usage(10);
        assert_eq!(estimate.items, 10);
        assert_eq!(estimate.tokens, 35_000);
        assert!((estimate.estimated_usd - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_items() {
        let estimate = estimate_usage(0);
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.estimated_usd, 0.0);
    }
}
