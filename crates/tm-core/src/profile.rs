use serde::{Deserialize, Serialize};

/// Fused tempo description of one analysed track.
///
/// Built once by the profile builder and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackProfile {
    /// Median of the ensemble estimates, in BPM.
    pub primary_tempo: f64,
    /// Raw per-method estimates, in estimator order.
    pub tempo_variations: Vec<f64>,
    /// Population standard deviation of `tempo_variations`.
    pub tempo_std: f64,
    /// Successive inter-beat deltas in seconds.
    pub beat_intervals: Vec<f64>,
    /// Standard deviation of `beat_intervals`. `None` below two beats.
    pub beat_consistency: Option<f64>,
}

impl TrackProfile {
    /// Number of beats the intervals were derived from.
    ///
    /// # Example
    /// ```
    /// use tm_core::profile::TrackProfile;
    /// let p = TrackProfile {
    ///     primary_tempo: 120.0,
    ///     tempo_variations: vec![120.0],
    ///     tempo_std: 0.0,
    ///     beat_intervals: vec![0.5, 0.5],
    ///     beat_consistency: Some(0.0),
    /// };
    /// assert_eq!(p.beat_count(), 3);
    /// ```
    #[must_use]
    pub fn beat_count(&self) -> usize {
        if self.beat_intervals.is_empty() {
            // 0 or 1 beat: indistinguishable once reduced to intervals.
            0
        } else {
            self.beat_intervals.len() + 1
        }
    }
}

/// Outcome of comparing two profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// All three criteria hold.
    Match,
    /// At least one criterion fails, or a profile is missing.
    NoMatch,
    /// Beat consistency is undefined on at least one side.
    InsufficientData,
}

impl Verdict {
    /// Only [`Verdict::Match`] counts as a match.
    #[must_use]
    pub fn is_match(self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Per-criterion differences between two profiles. All values are `>= 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    /// `|A.primary_tempo - B.primary_tempo|`
    pub tempo_diff: f64,
    /// `|A.tempo_std - B.tempo_std|`
    pub std_diff: f64,
    /// `|A.beat_consistency - B.beat_consistency|`, absent when either side
    /// has no beat consistency.
    pub beat_diff: Option<f64>,
}

/// A matching pair found during a corpus scan.
///
/// `file1` always precedes `file2` in scan order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identifier of the earlier track.
    pub file1: String,
    /// Identifier of the later track.
    pub file2: String,
    /// Primary tempo of `file1`.
    pub tempo1: f64,
    /// Primary tempo of `file2`.
    pub tempo2: f64,
    /// Tempo difference in BPM.
    pub tempo_diff: f64,
    /// Tempo-dispersion difference.
    pub std_diff: f64,
    /// Beat-consistency difference in seconds.
    pub beat_diff: f64,
}
