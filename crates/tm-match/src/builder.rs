use tm_core::error::CoreError;
use tm_core::profile::TrackProfile;

use crate::stats::{diff, median, pstdev};

/// Fuse ensemble estimates and beat times into a [`TrackProfile`].
///
/// - `primary_tempo` is the median of `tempo_estimates`
/// - `tempo_std` is their population standard deviation
/// - `beat_intervals` are the successive deltas of `beat_times`
/// - `beat_consistency` is the population std of those intervals, or `None`
///   with fewer than two beats
///
/// # Errors
/// [`CoreError::EmptyEstimates`] when no estimate is given,
/// [`CoreError::NonFiniteEstimate`] when one of them is NaN or infinite.
///
/// # Example
/// ```
/// use tm_match::builder::build_profile;
/// let p = build_profile(vec![118.0, 120.0, 119.5], &[0.0, 0.5, 1.0, 1.5]).unwrap();
/// assert_eq!(p.primary_tempo, 119.5);
/// assert_eq!(p.beat_intervals, vec![0.5, 0.5, 0.5]);
/// assert_eq!(p.beat_consistency, Some(0.0));
/// ```
pub fn build_profile(tempo_estimates: Vec<f64>, beat_times: &[f64]) -> Result<TrackProfile, CoreError> {
    if let Some((index, &value)) = tempo_estimates.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(CoreError::NonFiniteEstimate { index, value });
    }
    let (Some(primary_tempo), Some(tempo_std)) = (median(&tempo_estimates), pstdev(&tempo_estimates))
    else {
        return Err(CoreError::EmptyEstimates);
    };

    let beat_intervals = diff(beat_times);
    let beat_consistency = pstdev(&beat_intervals);

    Ok(TrackProfile {
        primary_tempo,
        tempo_variations: tempo_estimates,
        tempo_std,
        beat_intervals,
        beat_consistency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile() {
        let p = build_profile(vec![118.0, 120.0, 119.5], &[0.0, 0.5, 1.0, 1.5]).unwrap();
        assert_eq!(p.primary_tempo, 119.5);
        assert!((p.tempo_std - 0.8498).abs() < 1e-3);
        assert_eq!(p.tempo_variations, vec![118.0, 120.0, 119.5]);
        assert_eq!(p.beat_count(), 4);
    }

    #[test]
    fn even_count_median_is_midpoint() {
        let p = build_profile(vec![100.0, 110.0], &[]).unwrap();
        assert_eq!(p.primary_tempo, 105.0);
        assert_eq!(p.tempo_std, 5.0);
    }

    #[test]
    fn beat_count_edges() {
        let none = build_profile(vec![120.0], &[]).unwrap();
        assert!(none.beat_intervals.is_empty());
        assert_eq!(none.beat_consistency, None);

        let one = build_profile(vec![120.0], &[3.0]).unwrap();
        assert!(one.beat_intervals.is_empty());
        assert_eq!(one.beat_consistency, None);

        let two = build_profile(vec![120.0], &[1.0, 1.5]).unwrap();
        assert_eq!(two.beat_intervals, vec![0.5]);
        assert_eq!(two.beat_consistency, Some(0.0));
    }

    #[test]
    fn agreeing_estimates_have_zero_std() {
        for v in [120.1, 0.1, 128.0] {
            let p = build_profile(vec![v; 3], &[]).unwrap();
            assert_eq!(p.tempo_std, 0.0, "estimates at {v}");
            assert_eq!(p.primary_tempo, v);
        }
        let p = build_profile(vec![120.1, 120.1, 120.2], &[]).unwrap();
        assert!(p.tempo_std > 0.0);
    }

    #[test]
    fn estimate_order_does_not_change_the_tempo() {
        let a = build_profile(vec![118.0, 120.0, 119.5], &[]).unwrap();
        let b = build_profile(vec![120.0, 119.5, 118.0], &[]).unwrap();
        assert_eq!(a.primary_tempo, b.primary_tempo);
        assert!((a.tempo_std - b.tempo_std).abs() < 1e-12);
    }

    #[test]
    fn invalid_estimates_are_rejected() {
        assert_eq!(build_profile(Vec::new(), &[0.0, 1.0]), Err(CoreError::EmptyEstimates));
        match build_profile(vec![120.0, f64::NAN], &[]) {
            Err(CoreError::NonFiniteEstimate { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            build_profile(vec![f64::INFINITY], &[]),
            Err(CoreError::NonFiniteEstimate { index: 0, .. })
        ));
    }
}
