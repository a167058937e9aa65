//! Property tests for cutoff selection

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use quiz_trading::data::{AssetType, InstrumentMetadata, PricePoint, Series};
use quiz_trading::quiz::{CutoffSelector, SeriesValidator};

fn series_of(len: usize) -> Series {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let points = (0..len)
        .map(|i| PricePoint::close_only(start + Duration::days(i as i64), 10.0 + i as f64))
        .collect();
    Series::new("PROP", AssetType::Stock, points, InstrumentMetadata::default())
}

proptest! {
    #[test]
    fn window_is_contiguous_and_bounded(len in 211usize..1500, seed in any::<u64>()) {
        let series = series_of(len);
        let window = CutoffSelector::default()
            .select_cutoff(&series, &mut StdRng::seed_from_u64(seed))
            .unwrap();

        prop_assert!(window.visible.len() <= 181);
        prop_assert!(!window.hidden.is_empty());
        prop_assert!(window.hidden.len() <= 30);
        prop_assert!(window.cutoff_index >= 180);
        prop_assert!(window.cutoff_index < len - 30);

        // visible ends at the cutoff, hidden starts right after it
        let points = series.points();
        prop_assert_eq!(window.visible.last().unwrap(), &points[window.cutoff_index]);
        prop_assert_eq!(&window.hidden[0], &points[window.cutoff_index + 1]);
        prop_assert_eq!(window.visible.last().unwrap().timestamp, window.cutoff_timestamp);
        prop_assert!(window.visible.last().unwrap().timestamp < window.hidden[0].timestamp);
    }

    #[test]
    fn short_series_rejected_before_selection(len in 0usize..210) {
        prop_assert!(SeriesValidator::default().validate(&series_of(len)).is_err());
    }

    #[test]
    fn selection_is_deterministic_per_seed(len in 211usize..800, seed in any::<u64>()) {
        let series = series_of(len);
        let selector = CutoffSelector::default();
        let a = selector.select_cutoff(&series, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = selector.select_cutoff(&series, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a.cutoff_index, b.cutoff_index);
    }
}
