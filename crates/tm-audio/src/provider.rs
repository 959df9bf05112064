use std::path::Path;

use anyhow::Result;
use tm_core::config::AnalysisParams;
use tm_core::signal::Signal;
use tm_core::traits::FeatureProvider;

use crate::beat::BeatTracker;
use crate::decode::decode_file;
use crate::fft::FftPipeline;
use crate::onset::{log_compress, onset_envelope, onset_envelope_multi};
use crate::tempo::TempoEstimator;

/// Spectral-flux feature provider backed by symphonia and realfft.
///
/// Stateless: every call recomputes its spectrogram, so two calls to
/// [`FeatureProvider::onset_strength`] are independent derivations.
///
/// # Example
/// ```
/// use tm_audio::SpectralProvider;
/// use tm_core::config::AnalysisParams;
/// let provider = SpectralProvider::new(AnalysisParams::default());
/// assert!((provider.frame_rate(22050) - 22050.0 / 512.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct SpectralProvider {
    params: AnalysisParams,
}

impl SpectralProvider {
    /// Create a provider with the given STFT and tempo parameters.
    #[must_use]
    pub fn new(params: AnalysisParams) -> Self {
        Self { params }
    }

    /// Onset-envelope frames per second at `sample_rate`.
    #[must_use]
    pub fn frame_rate(&self, sample_rate: u32) -> f64 {
        f64::from(sample_rate) / self.params.hop_size as f64
    }

    fn log_spectrogram(&self, signal: &Signal) -> Result<Vec<Vec<f32>>> {
        let mut fft = FftPipeline::new(self.params.frame_size);
        let mut spectrogram = fft.spectrogram(signal.samples(), self.params.hop_size)?;
        log_compress(&mut spectrogram);
        Ok(spectrogram)
    }

    fn estimator(&self, sample_rate: u32) -> TempoEstimator {
        TempoEstimator::new(
            self.frame_rate(sample_rate),
            self.params.min_bpm,
            self.params.max_bpm,
            self.params.start_bpm,
        )
    }
}

impl FeatureProvider for SpectralProvider {
    fn decode(&self, path: &Path) -> Result<Signal> {
        decode_file(path)
    }

    fn onset_strength(&self, signal: &Signal) -> Result<Vec<f32>> {
        Ok(onset_envelope(&self.log_spectrogram(signal)?))
    }

    fn onset_strength_multi(&self, signal: &Signal) -> Result<Vec<Vec<f32>>> {
        Ok(onset_envelope_multi(
            &self.log_spectrogram(signal)?,
            signal.sample_rate(),
            self.params.onset_bands,
        ))
    }

    fn estimate_tempo(&self, envelope: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
        Ok(self.estimator(sample_rate).estimate(envelope).into_iter().collect())
    }

    fn detect_beats(&self, signal: &Signal) -> Result<Vec<usize>> {
        let envelope = self.onset_strength(signal)?;
        let Some(bpm) = self.estimator(signal.sample_rate()).estimate(&envelope) else {
            log::debug!("Pas de tempo global : aucun battement suivi");
            return Ok(Vec::new());
        };
        let tracker = BeatTracker::new(self.frame_rate(signal.sample_rate()), self.params.beat_tightness);
        Ok(tracker.track(&envelope, bpm))
    }

    fn frames_to_time(&self, frames: &[usize], sample_rate: u32) -> Vec<f64> {
        let seconds_per_frame = self.params.hop_size as f64 / f64::from(sample_rate.max(1));
        frames.iter().map(|&f| f as f64 * seconds_per_frame).collect()
    }
}
