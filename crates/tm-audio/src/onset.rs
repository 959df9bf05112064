//! Onset-strength envelopes from a magnitude spectrogram.
//!
//! Both envelopes are log-compressed, half-wave rectified spectral flux.
//! The single-channel variant averages the flux over every bin; the
//! multi-channel variant keeps one envelope per log-spaced frequency band,
//! so a rhythm carried only by the hi-hats or only by the kick still shows up
//! clearly in its own channel.

/// Gain applied before log compression, `ln(1 + LOG_GAIN * |X|)`.
const LOG_GAIN: f32 = 1000.0;

/// Lowest band edge of the multi-channel envelope, in Hz.
const BAND_MIN_HZ: f32 = 30.0;

/// Highest band edge of the multi-channel envelope, in Hz (capped at Nyquist).
const BAND_MAX_HZ: f32 = 16000.0;

/// Log-compress a magnitude spectrogram in place.
pub fn log_compress(spectrogram: &mut [Vec<f32>]) {
    for row in spectrogram.iter_mut() {
        for m in row.iter_mut() {
            *m = (1.0 + LOG_GAIN * *m).ln();
        }
    }
}

/// Half-wave rectified flux between two frames over `bins`.
#[inline]
fn flux(cur: &[f32], prev: &[f32]) -> f32 {
    if cur.is_empty() {
        return 0.0;
    }
    let sum: f32 = cur
        .iter()
        .zip(prev)
        .map(|(&c, &p)| (c - p).max(0.0))
        .sum();
    sum / cur.len() as f32
}

/// Single-channel onset envelope: mean rectified flux over all bins.
///
/// Takes a log-compressed spectrogram and returns one value per frame. The
/// first frame has no predecessor and is 0.
///
/// # Example
/// ```
/// use tm_audio::onset::onset_envelope;
/// let frames = vec![vec![0.0; 4], vec![1.0; 4], vec![0.5; 4]];
/// let env = onset_envelope(&frames);
/// assert_eq!(env, vec![0.0, 1.0, 0.0]);
/// ```
#[must_use]
pub fn onset_envelope(log_spectrogram: &[Vec<f32>]) -> Vec<f32> {
    let mut env = Vec::with_capacity(log_spectrogram.len());
    if log_spectrogram.is_empty() {
        return env;
    }
    env.push(0.0);
    for pair in log_spectrogram.windows(2) {
        env.push(flux(&pair[1], &pair[0]));
    }
    env
}

/// Bin ranges `[lo, hi)` of `n_bands` log-spaced bands.
///
/// Bands that would be empty are widened to one bin; the result never holds
/// an empty range and never exceeds `bins`.
#[must_use]
pub fn band_ranges(n_bands: usize, bins: usize, sample_rate: u32) -> Vec<(usize, usize)> {
    if n_bands == 0 || bins < 2 {
        return Vec::new();
    }
    let bin_hz = sample_rate as f32 / ((bins - 1) * 2) as f32;
    let nyquist = sample_rate as f32 / 2.0;
    let log_min = BAND_MIN_HZ.ln();
    let log_max = BAND_MAX_HZ.min(nyquist).max(BAND_MIN_HZ * 2.0).ln();

    (0..n_bands)
        .map(|i| {
            let f_lo = (log_min + (log_max - log_min) * i as f32 / n_bands as f32).exp();
            let f_hi = (log_min + (log_max - log_min) * (i + 1) as f32 / n_bands as f32).exp();
            let lo = ((f_lo / bin_hz) as usize).min(bins - 1);
            let hi = ((f_hi / bin_hz) as usize).clamp(lo + 1, bins);
            (lo, hi)
        })
        .collect()
}

/// Multi-channel onset envelope: rectified flux per frequency band.
///
/// Returns `n_bands` envelopes, each as long as the spectrogram.
///
/// # Example
/// ```
/// use tm_audio::onset::onset_envelope_multi;
/// let frames = vec![vec![0.0; 513]; 10];
/// let env = onset_envelope_multi(&frames, 22050, 4);
/// assert_eq!(env.len(), 4);
/// assert!(env.iter().all(|band| band.len() == 10));
/// ```
#[must_use]
pub fn onset_envelope_multi(
    log_spectrogram: &[Vec<f32>],
    sample_rate: u32,
    n_bands: usize,
) -> Vec<Vec<f32>> {
    let bins = log_spectrogram.first().map_or(0, Vec::len);
    band_ranges(n_bands, bins, sample_rate)
        .into_iter()
        .map(|(lo, hi)| {
            let mut env = Vec::with_capacity(log_spectrogram.len());
            if !log_spectrogram.is_empty() {
                env.push(0.0);
            }
            for pair in log_spectrogram.windows(2) {
                env.push(flux(&pair[1][lo..hi], &pair[0][lo..hi]));
            }
            env
        })
        .collect()
}
