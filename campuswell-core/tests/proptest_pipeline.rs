//! Property tests for the deterministic preprocessing primitives.

use campuswell_core::pipeline::{OneHotEncoder, StandardScaler};
use proptest::prelude::*;

proptest! {
    /// Applying the learned rescaling twice to the same input produces
    /// identical output.
    #[test]
    fn scaler_transform_is_deterministic(
        values in prop::collection::vec(-1e6f64..1e6, 1..200),
        probe in -1e6f64..1e6,
    ) {
        let scaler = StandardScaler::fit(&values);
        prop_assert_eq!(scaler.transform(probe), scaler.transform(probe));
        prop_assert!(scaler.transform(probe).is_finite());
    }

    /// Zero-variance columns never produce NaN.
    #[test]
    fn scaler_handles_constant_columns(value in -1e6f64..1e6, n in 1usize..100) {
        let values = vec![value; n];
        let scaler = StandardScaler::fit(&values);
        prop_assert!(scaler.transform(value).is_finite());
        prop_assert_eq!(scaler.transform(value), 0.0);
    }

    /// Categories absent from training always encode to the all-zero
    /// vector, never an error.
    #[test]
    fn encoder_maps_unseen_values_to_zero(
        seen in prop::collection::vec("[a-z]{1,8}", 1..20),
        unseen in "[A-Z]{1,8}",
    ) {
        let encoder = OneHotEncoder::fit(&seen);
        let mut out = Vec::new();
        encoder.encode_into(&unseen, &mut out);
        prop_assert_eq!(out.len(), encoder.width());
        prop_assert!(out.iter().all(|&v| v == 0.0));
    }

    /// Known categories encode to exactly one indicator.
    #[test]
    fn encoder_one_hot_property(seen in prop::collection::vec("[a-z]{1,8}", 1..20)) {
        let encoder = OneHotEncoder::fit(&seen);
        for value in &seen {
            let mut out = Vec::new();
            encoder.encode_into(value, &mut out);
            prop_assert_eq!(out.iter().filter(|&&v| v == 1.0).count(), 1);
        }
    }
}
