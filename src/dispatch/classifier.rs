//! # Tier Classifier
//!
//! Pure mapping from a result's numeric magnitude to an ordered value tier.
//! Bands come from configuration; values below the lowest floor are not
//! dispatch-worthy and classify to `None`.

use crate::config::TierBand;
use crate::error::{Result, ScoutError};

#[derive(Debug, Clone)]
pub struct TierClassifier {
    /// Bands sorted ascending by floor.
    bands: Vec<TierBand>,
}

impl TierClassifier {
    pub fn new(mut bands: Vec<TierBand>) -> Result<Self> {
        if bands.iter().any(|b| !b.floor.is_finite()) {
            return Err(ScoutError::ConfigurationError(
                "tier band floors must be finite".to_string(),
            ));
        }
        bands.sort_by(|a, b| a.floor.total_cmp(&b.floor));
        if bands.windows(2).any(|pair| pair[0].floor == pair[1].floor) {
            return Err(ScoutError::ConfigurationError(
                "tier band floors must be distinct".to_string(),
            ));
        }
        Ok(Self { bands })
    }

    /// The label of the highest band whose floor is at or below `value`.
    pub fn classify(&self, value: f64) -> Option<&str> {
        self.bands
            .iter()
            .rev()
            .find(|band| value >= band.floor)
            .map(|band| band.label.as_str())
    }

    /// Labels in ascending severity order, for counter registration.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|band| band.label.as_str())
    }

    /// Rank of a label in ascending severity, if known.
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.bands.iter().position(|band| band.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_tier_bands;

    fn classifier() -> TierClassifier {
        TierClassifier::new(default_tier_bands()).unwrap()
    }

    #[test]
    fn test_below_floor_is_none() {
        assert_eq!(classifier().classify(999_999.0), None);
        assert_eq!(classifier().classify(0.0), None);
    }

    #[test]
    fn test_band_boundaries() {
        let c = classifier();
        assert_eq!(c.classify(1_000_000.0), Some("1-10M"));
        assert_eq!(c.classify(75_000_000.0), Some("50-100M"));
        assert_eq!(c.classify(500_000_000.0), Some("500M-1B"));
        assert_eq!(c.classify(2_000_000_000.0), Some("1B+"));
    }

    #[test]
    fn test_classification_is_monotonic() {
        let c = classifier();
        let mut previous_rank = None;
        for value in [5e5, 2e6, 2e7, 7.5e7, 2e8, 7e8, 3e9] {
            let rank = c.classify(value).and_then(|label| c.rank(label));
            assert!(rank >= previous_rank);
            previous_rank = rank;
        }
    }

    #[test]
    fn test_unsorted_bands_accepted() {
        let c = TierClassifier::new(vec![
            TierBand::new(100.0, "high"),
            TierBand::new(10.0, "low"),
        ])
        .unwrap();
        assert_eq!(c.classify(50.0), Some("low"));
        assert_eq!(c.classify(150.0), Some("high"));
    }

    #[test]
    fn test_duplicate_floors_rejected() {
        let result = TierClassifier::new(vec![
            TierBand::new(10.0, "a"),
            TierBand::new(10.0, "b"),
        ]);
        assert!(matches!(result, Err(ScoutError::ConfigurationError(_))));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn classification_rank_never_decreases_with_value(
                a in 0.0f64..2e10,
                b in 0.0f64..2e10,
            ) {
                let c = classifier();
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                let lo_rank = c.classify(lo).and_then(|label| c.rank(label));
                let hi_rank = c.classify(hi).and_then(|label| c.rank(label));
                prop_assert!(lo_rank <= hi_rank);
            }

            #[test]
            fn below_floor_is_never_dispatch_worthy(value in 0.0f64..1_000_000.0) {
                prop_assert!(classifier().classify(value).is_none());
            }

            #[test]
            fn every_classified_label_is_a_configured_band(value in 0.0f64..2e10) {
                let c = classifier();
                if let Some(label) = c.classify(value) {
                    prop_assert!(c.rank(label).is_some());
                }
            }
        }
    }
}
