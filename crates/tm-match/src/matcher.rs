//! Pairwise tempo matching.
//!
//! Two profiles match when all three criteria hold at once:
//!
//! | criterion | rule |
//! |-----------|------|
//! | tempo | `|ΔBPM| <= tempo_tolerance` |
//! | dispersion | `|Δstd| < max_std_diff` |
//! | beat regularity | `|Δconsistency| < max_beat_diff` |
//!
//! The tempo bound is inclusive, the other two are strict.

use tm_core::config::MatchThresholds;
use tm_core::profile::{MatchDetails, TrackProfile, Verdict};

/// Verdict and per-criterion differences for one pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    pub verdict: Verdict,
    /// `None` when either profile is missing.
    pub details: Option<MatchDetails>,
}

impl Comparison {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.verdict.is_match()
    }
}

/// Compare two profiles against `thresholds`.
///
/// A missing profile is a plain [`Verdict::NoMatch`] without details. When
/// either side has no beat consistency the verdict is
/// [`Verdict::InsufficientData`], whatever the other two criteria say; the
/// details are still filled in. Symmetric in its arguments.
///
/// # Example
/// ```
/// use tm_core::config::MatchThresholds;
/// use tm_core::profile::{TrackProfile, Verdict};
/// use tm_match::matcher::compare;
///
/// let p = TrackProfile {
///     primary_tempo: 120.0,
///     tempo_variations: vec![120.0],
///     tempo_std: 0.0,
///     beat_intervals: vec![0.5, 0.5],
///     beat_consistency: Some(0.0),
/// };
/// let c = compare(Some(&p), Some(&p), &MatchThresholds::default());
/// assert_eq!(c.verdict, Verdict::Match);
/// assert_eq!(compare(Some(&p), None, &MatchThresholds::default()).verdict, Verdict::NoMatch);
/// ```
#[must_use]
pub fn compare(
    a: Option<&TrackProfile>,
    b: Option<&TrackProfile>,
    thresholds: &MatchThresholds,
) -> Comparison {
    let (Some(a), Some(b)) = (a, b) else {
        return Comparison {
            verdict: Verdict::NoMatch,
            details: None,
        };
    };

    let details = MatchDetails {
        tempo_diff: (a.primary_tempo - b.primary_tempo).abs(),
        std_diff: (a.tempo_std - b.tempo_std).abs(),
        beat_diff: a
            .beat_consistency
            .zip(b.beat_consistency)
            .map(|(x, y)| (x - y).abs()),
    };

    let tempo_ok = details.tempo_diff <= thresholds.tempo_tolerance;
    let std_ok = details.std_diff < thresholds.max_std_diff;
    let verdict = match details.beat_diff {
        None => Verdict::InsufficientData,
        Some(d) if tempo_ok && std_ok && d < thresholds.max_beat_diff => Verdict::Match,
        Some(_) => Verdict::NoMatch,
    };

    Comparison {
        verdict,
        details: Some(details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_profile;

    fn profile(tempo: f64, std: f64, consistency: Option<f64>) -> TrackProfile {
        TrackProfile {
            primary_tempo: tempo,
            tempo_variations: vec![tempo],
            tempo_std: std,
            beat_intervals: Vec::new(),
            beat_consistency: consistency,
        }
    }

    fn x() -> TrackProfile {
        build_profile(vec![118.0, 120.0, 119.5], &[0.0, 0.5, 1.0, 1.5]).unwrap()
    }

    fn y() -> TrackProfile {
        build_profile(vec![121.0, 122.0, 120.5], &[0.0, 0.49, 1.0, 1.51]).unwrap()
    }

    fn z() -> TrackProfile {
        build_profile(vec![140.0, 141.0, 139.0], &[0.0, 0.43, 0.86, 1.29]).unwrap()
    }

    #[test]
    fn close_tracks_match() {
        let (x, y) = (x(), y());
        assert!((y.primary_tempo - 121.0).abs() < 1e-12);
        assert!((y.tempo_std - 0.6236).abs() < 1e-3);

        let c = compare(Some(&x), Some(&y), &MatchThresholds::default());
        assert_eq!(c.verdict, Verdict::Match);
        let d = c.details.unwrap();
        assert!((d.tempo_diff - 1.5).abs() < 1e-12);
        assert!((d.std_diff - 0.2262).abs() < 1e-3);
        assert!(d.beat_diff.unwrap() < 0.1);
    }

    #[test]
    fn distant_tempo_does_not_match() {
        let c = compare(Some(&x()), Some(&z()), &MatchThresholds::default());
        assert_eq!(c.verdict, Verdict::NoMatch);
        assert!((c.details.unwrap().tempo_diff - 20.5).abs() < 1e-12);
    }

    #[test]
    fn missing_profile_has_no_details() {
        let x = x();
        for c in [
            compare(Some(&x), None, &MatchThresholds::default()),
            compare(None, Some(&x), &MatchThresholds::default()),
            compare(None, None, &MatchThresholds::default()),
        ] {
            assert_eq!(c.verdict, Verdict::NoMatch);
            assert!(c.details.is_none());
        }
    }

    #[test]
    fn symmetric() {
        let profiles = [x(), y(), z(), profile(121.0, 0.1, None)];
        let t = MatchThresholds::default();
        for a in &profiles {
            for b in &profiles {
                assert_eq!(compare(Some(a), Some(b), &t), compare(Some(b), Some(a), &t));
            }
        }
    }

    #[test]
    fn reflexive_with_beat_data() {
        let t = MatchThresholds::default();
        for p in [x(), y(), z()] {
            assert!(compare(Some(&p), Some(&p), &t).is_match());
        }
    }

    #[test]
    fn tolerance_is_monotonic() {
        let (x, y) = (x(), y());
        let mut matched = false;
        for tol in [0.5, 1.0, 1.5, 2.0, 5.0, 10.0] {
            let m = compare(Some(&x), Some(&y), &MatchThresholds::with_tolerance(tol)).is_match();
            assert!(!matched || m, "lost the match when widening to {tol}");
            matched |= m;
        }
        assert!(matched);
    }

    #[test]
    fn threshold_boundaries() {
        let t = MatchThresholds::default();
        // |ΔBPM| == tolerance matches.
        let c = compare(
            Some(&profile(120.0, 0.5, Some(0.01))),
            Some(&profile(125.0, 0.5, Some(0.01))),
            &t,
        );
        assert_eq!(c.verdict, Verdict::Match);
        // |Δstd| == 2.0 does not.
        let c = compare(
            Some(&profile(120.0, 0.0, Some(0.01))),
            Some(&profile(120.0, 2.0, Some(0.01))),
            &t,
        );
        assert_eq!(c.verdict, Verdict::NoMatch);
        // |Δconsistency| == 0.125 (exact in binary) is above 0.1.
        let c = compare(
            Some(&profile(120.0, 0.0, Some(0.0))),
            Some(&profile(120.0, 0.0, Some(0.125))),
            &t,
        );
        assert_eq!(c.verdict, Verdict::NoMatch);
    }

    #[test]
    fn undefined_consistency_is_insufficient_data() {
        let t = MatchThresholds::default();
        let c = compare(Some(&profile(120.0, 0.0, None)), Some(&profile(121.0, 0.0, Some(0.0))), &t);
        assert_eq!(c.verdict, Verdict::InsufficientData);
        assert!(!c.is_match());
        assert_eq!(c.details.unwrap().beat_diff, None);

        // Reported even when the tempos are far apart.
        let c = compare(Some(&profile(120.0, 0.0, None)), Some(&profile(150.0, 0.0, None)), &t);
        assert_eq!(c.verdict, Verdict::InsufficientData);
        assert!((c.details.unwrap().tempo_diff - 30.0).abs() < 1e-12);
    }
}
