/// Dynamic-programming beat tracker (Ellis, 2007).
///
/// Given an onset envelope and a global tempo, picks the sequence of frames
/// that maximises onset strength while keeping successive beats close to the
/// tempo period. `tightness` weighs the spacing penalty against onset
/// strength.
///
/// # Example
/// ```
/// use tm_audio::beat::BeatTracker;
/// let tracker = BeatTracker::new(43.0, 100.0);
/// assert!(tracker.track(&[0.0; 256], 120.0).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct BeatTracker {
    /// Envelope frames per second.
    frame_rate: f64,
    tightness: f64,
}

impl BeatTracker {
    /// Create a tracker for envelopes sampled at `frame_rate` Hz.
    #[must_use]
    pub fn new(frame_rate: f64, tightness: f64) -> Self {
        Self {
            frame_rate,
            tightness,
        }
    }

    /// Beat positions (frame indices, increasing) for `envelope` at `bpm`.
    ///
    /// Returns an empty vector for a silent envelope or a non-positive tempo.
    #[must_use]
    pub fn track(&self, envelope: &[f32], bpm: f64) -> Vec<usize> {
        if envelope.is_empty() || bpm.is_nan() || bpm <= 0.0 || self.frame_rate <= 0.0 {
            return Vec::new();
        }
        let period = 60.0 * self.frame_rate / bpm;
        if period < 1.0 {
            return Vec::new();
        }

        let Some(local) = local_score(envelope, period) else {
            return Vec::new();
        };
        let (cumulative, backlink) = self.dynamic_program(&local, period);

        let Some(mut tail) = last_beat(&cumulative) else {
            return Vec::new();
        };
        let mut beats = vec![tail];
        while let Some(prev) = backlink[tail] {
            beats.push(prev);
            tail = prev;
        }
        beats.reverse();

        trim_weak_beats(&local, beats)
    }

    /// Forward pass: best cumulative score ending on each frame.
    fn dynamic_program(&self, local: &[f64], period: f64) -> (Vec<f64>, Vec<Option<usize>>) {
        let n = local.len();
        let lo = (period / 2.0).round().max(1.0) as usize;
        let hi = (period * 2.0).round() as usize;

        // Spacing penalty for each candidate predecessor distance.
        let penalty: Vec<f64> = (lo..=hi)
            .map(|d| {
                let r = (d as f64 / period).ln();
                -self.tightness * r * r
            })
            .collect();

        let max_local = local.iter().copied().fold(0.0f64, f64::max);
        let threshold = 0.01 * max_local;

        let mut cumulative = vec![0.0; n];
        let mut backlink = vec![None; n];
        let mut started = false;

        for t in 0..n {
            let mut best: Option<(usize, f64)> = None;
            if t >= lo {
                for (k, d) in (lo..=hi.min(t)).enumerate() {
                    let candidate = cumulative[t - d] + penalty[k];
                    if best.is_none_or(|(_, s)| candidate > s) {
                        best = Some((t - d, candidate));
                    }
                }
            }

            // No beats before the first real onset.
            match best {
                Some((prev, s)) if started => {
                    cumulative[t] = local[t] + s;
                    backlink[t] = Some(prev);
                }
                _ => cumulative[t] = local[t],
            }
            if local[t] >= threshold && max_local > 0.0 {
                started = true;
            }
        }
        (cumulative, backlink)
    }
}

/// Onset envelope normalised by its standard deviation and smoothed with a
/// gaussian one period wide. `None` for a flat envelope.
fn local_score(envelope: &[f32], period: f64) -> Option<Vec<f64>> {
    let n = envelope.len();
    let mean = envelope.iter().map(|v| f64::from(*v)).sum::<f64>() / n as f64;
    let var = envelope
        .iter()
        .map(|v| (f64::from(*v) - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let std = var.sqrt();
    if std < 1e-9 {
        return None;
    }

    let half = period.round() as isize;
    let window: Vec<f64> = (-half..=half)
        .map(|i| (-0.5 * (i as f64 * 32.0 / period).powi(2)).exp())
        .collect();

    let score = (0..n as isize)
        .map(|t| {
            window
                .iter()
                .enumerate()
                .filter_map(|(k, w)| {
                    let j = t + k as isize - half;
                    (j >= 0 && j < n as isize).then(|| w * f64::from(envelope[j as usize]) / std)
                })
                .sum()
        })
        .collect();
    Some(score)
}

/// Last frame worth ending on: the final local maximum of the cumulative
/// score that reaches half the median of all local maxima.
fn last_beat(cumulative: &[f64]) -> Option<usize> {
    let n = cumulative.len();
    let is_peak = |t: usize| {
        let left = t == 0 || cumulative[t] >= cumulative[t - 1];
        let right = t + 1 == n || cumulative[t] > cumulative[t + 1];
        left && right
    };
    let peaks: Vec<usize> = (0..n).filter(|&t| is_peak(t)).collect();
    if peaks.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = peaks.iter().map(|&t| cumulative[t]).collect();
    values.sort_by(f64::total_cmp);
    let median = values[values.len() / 2];
    peaks.into_iter().rev().find(|&t| cumulative[t] >= 0.5 * median)
}

/// Drop leading and trailing beats whose local score is below half the RMS
/// of the local score over all beats.
fn trim_weak_beats(local: &[f64], beats: Vec<usize>) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }
    let rms = (beats.iter().map(|&b| local[b] * local[b]).sum::<f64>() / beats.len() as f64).sqrt();
    let threshold = 0.5 * rms;
    let first = beats.iter().position(|&b| local[b] >= threshold);
    let last = beats.iter().rposition(|&b| local[b] >= threshold);
    match (first, last) {
        (Some(f), Some(l)) => beats[f..=l].to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_RATE: f64 = 22050.0 / 512.0;

    fn pulse_train(len: usize, period: usize, offset: usize) -> Vec<f32> {
        let mut env = vec![0.0f32; len];
        for t in (offset..len).step_by(period) {
            env[t] = 1.0;
        }
        env
    }

    #[test]
    fn follows_a_steady_pulse() {
        let env = pulse_train(600, 20, 7);
        let bpm = 60.0 * FRAME_RATE / 20.0;
        let beats = BeatTracker::new(FRAME_RATE, 100.0).track(&env, bpm);

        assert!(beats.len() >= 25, "only {} beats", beats.len());
        for pair in beats.windows(2) {
            assert_eq!(pair[1] - pair[0], 20);
        }
        assert!(beats.iter().all(|b| (b - 7) % 20 == 0));
    }

    #[test]
    fn silence_has_no_beats() {
        let tracker = BeatTracker::new(FRAME_RATE, 100.0);
        assert!(tracker.track(&[0.0; 500], 120.0).is_empty());
        assert!(tracker.track(&[], 120.0).is_empty());
        assert!(tracker.track(&pulse_train(100, 20, 0), 0.0).is_empty());
        assert!(tracker.track(&pulse_train(100, 20, 0), f64::NAN).is_empty());
    }

    #[test]
    fn beats_are_strictly_increasing() {
        // Slightly irregular pulse, tempo given a little off.
        let mut env = vec![0.0f32; 800];
        let mut t = 5usize;
        let mut toggle = false;
        while t < env.len() {
            env[t] = 1.0;
            t += if toggle { 21 } else { 22 };
            toggle = !toggle;
        }
        let beats = BeatTracker::new(FRAME_RATE, 100.0).track(&env, 118.0);
        assert!(beats.len() > 10);
        assert!(beats.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn trim_drops_weak_edges() {
        let local = vec![0.1, 5.0, 5.0, 5.0, 0.1];
        let trimmed = trim_weak_beats(&local, vec![0, 1, 2, 3, 4]);
        assert_eq!(trimmed, vec![1, 2, 3]);
    }
}
