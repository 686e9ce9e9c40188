//! Population baseline and good-price classification

use statrs::statistics::Statistics;

/// Mean and sample standard deviation over a set of prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Baseline {
    /// Returns `None` for an empty sample. A single price has no spread,
    /// so its standard deviation is 0 rather than undefined.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let mean = prices.iter().mean();
        let std_dev = if prices.len() > 1 {
            prices.iter().std_dev()
        } else {
            0.0
        };

        Some(Self {
            mean,
            std_dev,
            count: prices.len(),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.mean - self.std_dev
    }
}

/// Comparison applied against the threshold.
///
/// The station store and the aggregate history have always used different
/// comparisons; both are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodPricePolicy {
    /// `price <= threshold`, used for best-station selection
    AtOrBelow,
    /// `price < threshold`, used for history-based classification
    Below,
}

impl GoodPricePolicy {
    pub fn is_good(&self, price: f64, threshold: f64) -> bool {
        match self {
            GoodPricePolicy::AtOrBelow => price <= threshold,
            GoodPricePolicy::Below => price < threshold,
        }
    }
}

/// Analyzes price samples
pub struct PriceAnalyzer;

impl PriceAnalyzer {
    /// mean - stddev over `prices`, NaN when there is nothing to compare against
    pub fn good_price(prices: &[f64]) -> f64 {
        Baseline::from_prices(prices)
            .map(|baseline| baseline.threshold())
            .unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_sample_std_dev() {
        let baseline = Baseline::from_prices(&[0.9, 1.0, 1.1, 1.2, 1.3]).unwrap();
        assert!((baseline.mean - 1.1).abs() < 1e-12);
        assert!((baseline.std_dev - 0.158_113_883).abs() < 1e-6);
        assert_eq!(baseline.count, 5);
        assert!((baseline.threshold() - 0.941_886_117).abs() < 1e-6);
    }

    #[test]
    fn test_baseline_single_price_has_no_spread() {
        let baseline = Baseline::from_prices(&[1.5]).unwrap();
        assert_eq!(baseline.mean, 1.5);
        assert_eq!(baseline.std_dev, 0.0);
        assert_eq!(baseline.threshold(), 1.5);
    }

    #[test]
    fn test_baseline_empty() {
        assert!(Baseline::from_prices(&[]).is_none());
        assert!(PriceAnalyzer::good_price(&[]).is_nan());
    }

    #[test]
    fn test_policies_differ_at_threshold() {
        assert!(GoodPricePolicy::AtOrBelow.is_good(1.0, 1.0));
        assert!(!GoodPricePolicy::Below.is_good(1.0, 1.0));
        assert!(GoodPricePolicy::Below.is_good(0.99, 1.0));
        assert!(!GoodPricePolicy::AtOrBelow.is_good(1.0, f64::NAN));
    }
}
