use crate::core::Listing;

/// Fewer listings than this are never outlier-filtered
pub const MIN_SAMPLE_FOR_IQR: usize = 4;

/// `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]` with Q1 = sorted[n/4], Q3 = sorted[3n/4].
/// `None` below the minimum sample size.
pub fn iqr_bounds(prices: &[f64]) -> Option<(f64, f64)> {
    if prices.len() < MIN_SAMPLE_FOR_IQR {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[(3 * n) / 4];
    let iqr = q3 - q1;

    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

/// Drop listings priced outside the IQR fences. Order is preserved.
pub fn remove_outliers(listings: Vec<Listing>) -> Vec<Listing> {
    let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
    let Some((lower, upper)) = iqr_bounds(&prices) else {
        return listings;
    };

    let before = listings.len();
    let kept: Vec<Listing> = listings
        .into_iter()
        .filter(|l| l.price >= lower && l.price <= upper)
        .collect();

    if kept.len() < before {
        tracing::debug!(
            "Removed {} outliers outside [{:.2}, {:.2}]",
            before - kept.len(),
            lower,
            upper
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn priced(prices: &[f64]) -> Vec<Listing> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| Listing::new(format!("card {}", i), *p, Utc::now(), format!("u{}", i)))
            .collect()
    }

    #[test]
    fn test_small_samples_untouched() {
        for prices in [&[][..], &[1.0][..], &[1.0, 1000.0][..], &[1.0, 2.0, 9999.0][..]] {
            let input = priced(prices);
            assert_eq!(remove_outliers(input.clone()), input);
        }
    }

    #[test]
    fn test_injected_outlier_removed() {
        let kept = remove_outliers(priced(&[10.0, 12.0, 11.0, 13.0, 500.0, 9.0]));
        let prices: Vec<f64> = kept.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![10.0, 12.0, 11.0, 13.0, 9.0]);
    }

    #[test]
    fn test_quartile_index_convention() {
        // n = 6: Q1 = sorted[1] = 10, Q3 = sorted[4] = 13, IQR = 3
        let (lower, upper) = iqr_bounds(&[10.0, 12.0, 11.0, 13.0, 500.0, 9.0]).unwrap();
        assert_eq!(lower, 5.5);
        assert_eq!(upper, 17.5);
    }

    #[test]
    fn test_retained_prices_within_fences() {
        let samples: [&[f64]; 4] = [
            &[1.0, 2.0, 3.0, 4.0],
            &[5.0, 5.0, 5.0, 5.0, 80.0],
            &[0.5, 20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 300.0],
            &[100.0, 3.0, 7.0, 7.5, 8.0, 9.0, 250.0, 8.5, 7.2],
        ];
        for prices in samples {
            let (lower, upper) = iqr_bounds(prices).unwrap();
            for listing in remove_outliers(priced(prices)) {
                assert!(listing.price >= lower && listing.price <= upper);
            }
        }
    }

    #[test]
    fn test_identical_prices_kept() {
        let kept = remove_outliers(priced(&[5.0, 5.0, 5.0, 5.0, 5.0]));
        assert_eq!(kept.len(), 5);
    }
}
