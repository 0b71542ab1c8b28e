//! Pricing policy for papers and bundles.

/// Price a new paper gets when the uploader does not name one.
pub const DEFAULT_PAPER_PRICE: i64 = 5;

/// Sum of the individual prices of a set of papers.
pub fn bulk_total<I>(prices: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    prices.into_iter().sum()
}

/// Bundle price: 10% off the total, truncated toward zero.
pub fn bulk_discounted(total: i64) -> i64 {
    total * 9 / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_truncates() {
        assert_eq!(bulk_discounted(bulk_total([5, 7])), 10);
    }

    #[test]
    fn discount_on_round_total() {
        assert_eq!(bulk_discounted(100), 90);
    }

    #[test]
    fn zero_total_stays_zero() {
        assert_eq!(bulk_discounted(bulk_total([])), 0);
    }

    #[test]
    fn single_cheap_paper() {
        // 5 * 9 / 10 = 4 with integer truncation.
        assert_eq!(bulk_discounted(5), 4);
    }
}
