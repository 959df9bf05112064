use std::path::Path;

use anyhow::Result;

use crate::signal::Signal;

/// Signal-processing backend the tempo ensemble is built on.
///
/// Implémenté par : `SpectralProvider` (tm-audio). Les tests utilisent des
/// implémentations synthétiques qui renvoient des enveloppes construites à la main.
///
/// # Example
/// ```
/// use anyhow::Result;
/// use std::path::Path;
/// use tm_core::signal::Signal;
/// use tm_core::traits::FeatureProvider;
///
/// struct Fixed;
/// impl FeatureProvider for Fixed {
///     fn decode(&self, _path: &Path) -> Result<Signal> { Ok(Signal::new(vec![0.0; 8], 8)?) }
///     fn onset_strength(&self, _s: &Signal) -> Result<Vec<f32>> { Ok(vec![0.0; 4]) }
///     fn onset_strength_multi(&self, _s: &Signal) -> Result<Vec<Vec<f32>>> { Ok(vec![vec![0.0; 4]]) }
///     fn estimate_tempo(&self, _env: &[f32], _sr: u32) -> Result<Vec<f64>> { Ok(vec![120.0]) }
///     fn detect_beats(&self, _s: &Signal) -> Result<Vec<usize>> { Ok(vec![]) }
///     fn frames_to_time(&self, frames: &[usize], _sr: u32) -> Vec<f64> {
///         frames.iter().map(|&f| f as f64).collect()
///     }
/// }
/// ```
pub trait FeatureProvider: Send + Sync {
    /// Load a file as a mono signal.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or decoded.
    fn decode(&self, path: &Path) -> Result<Signal>;

    /// Single-channel onset-strength envelope, one value per analysis frame.
    ///
    /// # Errors
    /// Returns an error if the envelope cannot be computed.
    fn onset_strength(&self, signal: &Signal) -> Result<Vec<f32>>;

    /// Multi-channel (frequency band) onset-strength envelopes.
    ///
    /// # Errors
    /// Returns an error if the envelopes cannot be computed.
    fn onset_strength_multi(&self, signal: &Signal) -> Result<Vec<Vec<f32>>>;

    /// Tempo candidates in BPM for one envelope. May be empty.
    ///
    /// # Errors
    /// Returns an error if the estimator fails on this envelope.
    fn estimate_tempo(&self, envelope: &[f32], sample_rate: u32) -> Result<Vec<f64>>;

    /// Tempo candidates for a multi-channel envelope, one batch per channel.
    ///
    /// # Errors
    /// Returns an error if any channel fails.
    fn estimate_tempo_multi(&self, envelopes: &[Vec<f32>], sample_rate: u32) -> Result<Vec<f64>> {
        let mut candidates = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            candidates.extend(self.estimate_tempo(envelope, sample_rate)?);
        }
        Ok(candidates)
    }

    /// Beat positions as analysis-frame indices, in increasing order.
    ///
    /// # Errors
    /// Returns an error if beat tracking fails.
    fn detect_beats(&self, signal: &Signal) -> Result<Vec<usize>>;

    /// Convert analysis-frame indices to seconds.
    fn frames_to_time(&self, frames: &[usize], sample_rate: u32) -> Vec<f64>;
}
