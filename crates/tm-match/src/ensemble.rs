use anyhow::{Result, bail};
use tm_core::signal::Signal;
use tm_core::traits::FeatureProvider;

use crate::stats::mean;

/// One way of turning a signal into a single BPM estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Mean of the candidates estimated from the single-channel envelope.
    Primary,
    /// Same derivation as [`Strategy::Primary`], from a fresh envelope.
    OnsetMean,
    /// Mean of the per-band candidates of the multi-channel envelope.
    SpectralFluxMean,
}

impl Strategy {
    /// Every strategy, in the fixed ensemble order.
    pub const ALL: [Self; 3] = [Self::Primary, Self::OnsetMean, Self::SpectralFluxMean];

    /// Short name used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::OnsetMean => "onset-mean",
            Self::SpectralFluxMean => "spectral-flux-mean",
        }
    }

    fn candidates(self, provider: &dyn FeatureProvider, signal: &Signal) -> Result<Vec<f64>> {
        let sr = signal.sample_rate();
        match self {
            Self::Primary | Self::OnsetMean => {
                let envelope = provider.onset_strength(signal)?;
                provider.estimate_tempo(&envelope, sr)
            }
            Self::SpectralFluxMean => {
                let envelopes = provider.onset_strength_multi(signal)?;
                provider.estimate_tempo_multi(&envelopes, sr)
            }
        }
    }
}

/// Fixed-order set of tempo strategies applied to one signal.
///
/// # Example
/// ```
/// use tm_match::ensemble::{Strategy, TempoEnsemble};
/// let ensemble = TempoEnsemble::default();
/// assert_eq!(ensemble.strategies(), &Strategy::ALL);
/// ```
#[derive(Clone, Debug)]
pub struct TempoEnsemble {
    strategies: Vec<Strategy>,
}

impl Default for TempoEnsemble {
    fn default() -> Self {
        Self {
            strategies: Strategy::ALL.to_vec(),
        }
    }
}

impl TempoEnsemble {
    /// Ensemble over a custom list of strategies, kept in the given order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// One estimate per strategy, in strategy order.
    ///
    /// # Errors
    /// Fails as a whole if any strategy errors or yields no candidate:
    /// partial ensembles are never returned.
    pub fn estimate(&self, provider: &dyn FeatureProvider, signal: &Signal) -> Result<Vec<f64>> {
        let mut estimates = Vec::with_capacity(self.strategies.len());
        for &strategy in &self.strategies {
            let candidates = strategy.candidates(provider, signal)?;
            let Some(bpm) = mean(&candidates) else {
                bail!("Stratégie {} : aucun tempo candidat", strategy.name());
            };
            log::trace!("{} -> {bpm:.2} BPM ({} candidats)", strategy.name(), candidates.len());
            estimates.push(bpm);
        }
        Ok(estimates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns fixed candidates and counts envelope derivations.
    struct Scripted {
        single: Vec<f64>,
        per_band: Vec<Vec<f64>>,
        onset_calls: AtomicUsize,
    }

    impl Scripted {
        fn new(single: Vec<f64>, per_band: Vec<Vec<f64>>) -> Self {
            Self {
                single,
                per_band,
                onset_calls: AtomicUsize::new(0),
            }
        }
    }

    impl FeatureProvider for Scripted {
        fn decode(&self, _path: &Path) -> Result<Signal> {
            Ok(Signal::new(vec![0.0; 16], 16)?)
        }
        fn onset_strength(&self, _signal: &Signal) -> Result<Vec<f32>> {
            self.onset_calls.fetch_add(1, Ordering::SeqCst);
            // Band index 0 marks the single-channel envelope.
            Ok(vec![0.0])
        }
        fn onset_strength_multi(&self, _signal: &Signal) -> Result<Vec<Vec<f32>>> {
            Ok((1..=self.per_band.len()).map(|i| vec![i as f32]).collect())
        }
        fn estimate_tempo(&self, envelope: &[f32], _sr: u32) -> Result<Vec<f64>> {
            let band = envelope[0] as usize;
            if band == 0 {
                Ok(self.single.clone())
            } else {
                Ok(self.per_band[band - 1].clone())
            }
        }
        fn detect_beats(&self, _signal: &Signal) -> Result<Vec<usize>> {
            Ok(Vec::new())
        }
        fn frames_to_time(&self, frames: &[usize], _sr: u32) -> Vec<f64> {
            frames.iter().map(|&f| f as f64).collect()
        }
    }

    fn signal() -> Signal {
        Signal::new(vec![0.0; 16], 16).unwrap()
    }

    #[test]
    fn one_estimate_per_strategy_in_order() {
        let provider = Scripted::new(vec![118.0, 122.0], vec![vec![110.0], vec![130.0, 126.0]]);
        let estimates = TempoEnsemble::default().estimate(&provider, &signal()).unwrap();
        assert_eq!(estimates.len(), 3);
        assert!((estimates[0] - 120.0).abs() < 1e-12);
        assert!((estimates[1] - 120.0).abs() < 1e-12);
        assert!((estimates[2] - 122.0).abs() < 1e-12);
    }

    #[test]
    fn onset_mean_derives_its_own_envelope() {
        let provider = Scripted::new(vec![120.0], vec![vec![120.0]]);
        TempoEnsemble::default().estimate(&provider, &signal()).unwrap();
        assert_eq!(provider.onset_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_candidates_fail_the_whole_ensemble() {
        let provider = Scripted::new(Vec::new(), vec![vec![120.0]]);
        let err = TempoEnsemble::default().estimate(&provider, &signal()).unwrap_err();
        assert!(err.to_string().contains("primary"));

        let provider = Scripted::new(vec![120.0], vec![Vec::new(), Vec::new()]);
        assert!(TempoEnsemble::default().estimate(&provider, &signal()).is_err());
    }

    #[test]
    fn custom_strategy_order_is_kept() {
        let provider = Scripted::new(vec![100.0], vec![vec![140.0]]);
        let ensemble =
            TempoEnsemble::with_strategies(vec![Strategy::SpectralFluxMean, Strategy::Primary]);
        let estimates = ensemble.estimate(&provider, &signal()).unwrap();
        assert_eq!(estimates, vec![140.0, 100.0]);
    }

    /// Noise bursts every 10240 samples at 22.05 kHz, about 129 BPM.
    fn click_track() -> Signal {
        let sr = 22050;
        let len = sr as usize * 20;
        let mut samples = vec![0.0f32; len];
        let mut seed: u32 = 0x0bad_5eed;
        for start in (0..len).step_by(10240) {
            for i in 0..1500.min(len - start) {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let noise = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                samples[start + i] = 0.8 * noise * (-(i as f32) / 300.0).exp();
            }
        }
        Signal::new(samples, sr).unwrap()
    }

    #[test]
    fn rerun_on_same_signal_gives_same_tempo() {
        let provider = tm_audio::SpectralProvider::new(tm_core::config::AnalysisParams::default());
        let signal = click_track();
        let ensemble = TempoEnsemble::default();

        let first = ensemble.estimate(&provider, &signal).unwrap();
        let second = ensemble.estimate(&provider, &signal).unwrap();
        assert_eq!(first, second);

        let a = crate::builder::build_profile(first, &[]).unwrap();
        let b = crate::builder::build_profile(second, &[]).unwrap();
        assert_eq!(a.primary_tempo, b.primary_tempo);
        assert_eq!(a.tempo_std, b.tempo_std);
    }
}
