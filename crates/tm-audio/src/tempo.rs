/// Autocorrelation tempo estimator for onset envelopes.
///
/// The envelope is lightly smoothed and mean-removed, its autocorrelation is
/// weighted by a log-normal prior centred on `start_bpm` (one octave of
/// deviation), and the best lag inside `[min_bpm, max_bpm]` is refined with
/// a parabolic fit.
///
/// # Example
/// ```
/// use tm_audio::tempo::TempoEstimator;
/// let estimator = TempoEstimator::new(43.0, 30.0, 300.0, 120.0);
/// assert!(estimator.estimate(&[0.0; 512]).is_none()); // silence
/// ```
#[derive(Clone, Debug)]
pub struct TempoEstimator {
    /// Envelope frames per second.
    frame_rate: f64,
    min_bpm: f64,
    max_bpm: f64,
    start_bpm: f64,
}

/// Width of the tempo prior, in octaves.
const PRIOR_STD_OCTAVES: f64 = 1.0;

/// Below this envelope variance the signal is treated as rhythmless.
const MIN_VARIANCE: f64 = 1e-12;

impl TempoEstimator {
    /// Create an estimator for envelopes sampled at `frame_rate` Hz.
    #[must_use]
    pub fn new(frame_rate: f64, min_bpm: f64, max_bpm: f64, start_bpm: f64) -> Self {
        Self {
            frame_rate,
            min_bpm,
            max_bpm,
            start_bpm,
        }
    }

    /// BPM corresponding to a lag in frames.
    #[inline]
    fn lag_to_bpm(&self, lag: f64) -> f64 {
        60.0 * self.frame_rate / lag
    }

    /// Log-normal tempo prior.
    #[inline]
    fn prior(&self, bpm: f64) -> f64 {
        let octaves = (bpm / self.start_bpm).log2() / PRIOR_STD_OCTAVES;
        (-0.5 * octaves * octaves).exp()
    }

    /// Most likely tempo of `envelope`, or `None` when the envelope is too
    /// short or carries no periodicity.
    #[must_use]
    pub fn estimate(&self, envelope: &[f32]) -> Option<f64> {
        if self.frame_rate <= 0.0 {
            return None;
        }
        let min_lag = ((60.0 * self.frame_rate / self.max_bpm).floor() as usize).max(1);
        let max_lag = (60.0 * self.frame_rate / self.min_bpm).ceil() as usize;
        let max_lag = max_lag.min(envelope.len().saturating_sub(2));
        if min_lag + 2 > max_lag {
            return None;
        }

        let x = centered(&smooth(envelope));
        let n = x.len();
        let energy = x.iter().map(|v| v * v).sum::<f64>() / n as f64;
        if energy < MIN_VARIANCE {
            return None;
        }

        // Unbiased autocorrelation, normalised by the zero-lag energy.
        let acf: Vec<f64> = (0..=max_lag + 1)
            .map(|lag| {
                let s: f64 = x[..n - lag].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
                s / (n - lag) as f64 / energy
            })
            .collect();

        let score = |lag: usize| acf[lag] * self.prior(self.lag_to_bpm(lag as f64));

        let (best_lag, best_score) = (min_lag..=max_lag)
            .map(|lag| (lag, score(lag)))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if best_score <= 0.0 {
            return None;
        }

        // Parabolic refinement around the peak.
        let mut lag = best_lag as f64;
        if best_lag > min_lag && best_lag < max_lag {
            let (l, c, r) = (score(best_lag - 1), best_score, score(best_lag + 1));
            let denom = l - 2.0 * c + r;
            if denom < 0.0 {
                lag += (0.5 * (l - r) / denom).clamp(-0.5, 0.5);
            }
        }

        Some(self.lag_to_bpm(lag).clamp(self.min_bpm, self.max_bpm))
    }
}

/// Three-tap binomial smoothing applied twice (5-tap kernel).
fn smooth(envelope: &[f32]) -> Vec<f64> {
    const KERNEL: [f64; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];
    let n = envelope.len() as isize;
    (0..n)
        .map(|i| {
            KERNEL
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let j = (i + k as isize - 2).clamp(0, n - 1);
                    w * f64::from(envelope[j as usize])
                })
                .sum()
        })
        .collect()
}

fn centered(x: &[f64]) -> Vec<f64> {
    let mean = x.iter().sum::<f64>() / x.len().max(1) as f64;
    x.iter().map(|v| v - mean).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pulse train with a triangular pulse every `period` frames.
    fn pulses(len: usize, period: f64) -> Vec<f32> {
        let mut env = vec![0.0f32; len];
        let mut t: f64 = 0.0;
        while (t as usize) < len {
            let c = t.round() as usize;
            for (d, w) in [(0usize, 1.0f32), (1, 0.5)] {
                if c + d < len {
                    env[c + d] += w;
                }
                if d > 0 && c >= d {
                    env[c - d] += w;
                }
            }
            t += period;
        }
        env
    }

    const FRAME_RATE: f64 = 22050.0 / 512.0;

    #[test]
    fn integer_period_pulse_train() {
        let estimator = TempoEstimator::new(FRAME_RATE, 30.0, 300.0, 120.0);
        // 20 frames per beat = 129.2 BPM
        let bpm = estimator.estimate(&pulses(1200, 20.0)).unwrap();
        assert!((bpm - 129.2).abs() < 3.0, "got {bpm}");
    }

    #[test]
    fn fractional_period_pulse_train() {
        let estimator = TempoEstimator::new(FRAME_RATE, 30.0, 300.0, 120.0);
        let period = 60.0 * FRAME_RATE / 100.0; // 25.84 frames
        let bpm = estimator.estimate(&pulses(1500, period)).unwrap();
        assert!((bpm - 100.0).abs() < 4.0, "got {bpm}");
    }

    #[test]
    fn respects_bpm_range() {
        let estimator = TempoEstimator::new(FRAME_RATE, 100.0, 160.0, 120.0);
        let bpm = estimator.estimate(&pulses(1200, 20.0)).unwrap();
        assert!((100.0..=160.0).contains(&bpm));
    }

    #[test]
    fn flat_and_short_envelopes_yield_none() {
        let estimator = TempoEstimator::new(FRAME_RATE, 30.0, 300.0, 120.0);
        assert!(estimator.estimate(&[1.0; 400]).is_none());
        assert!(estimator.estimate(&[0.0, 1.0, 0.0]).is_none());
        assert!(estimator.estimate(&[]).is_none());
    }

    #[test]
    fn prior_peaks_at_start_bpm() {
        let estimator = TempoEstimator::new(FRAME_RATE, 30.0, 300.0, 120.0);
        assert!((estimator.prior(120.0) - 1.0).abs() < 1e-12);
        assert!(estimator.prior(60.0) < estimator.prior(100.0));
        assert!((estimator.prior(60.0) - estimator.prior(240.0)).abs() < 1e-12);
    }
}
