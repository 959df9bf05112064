use crate::error::CoreError;

/// A decoded, mono, finite audio signal.
///
/// Samples are normalised to [-1.0, 1.0].
///
/// # Example
/// ```
/// use tm_core::signal::Signal;
/// let signal = Signal::new(vec![0.0; 22050], 22050).unwrap();
/// assert!((signal.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    /// Wrap decoded samples.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidSignal`] if the buffer is empty or the
    /// sample rate is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, CoreError> {
        if samples.is_empty() {
            return Err(CoreError::InvalidSignal("aucun échantillon".into()));
        }
        if sample_rate == 0 {
            return Err(CoreError::InvalidSignal("fréquence d'échantillonnage nulle".into()));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Mono samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_zero_rate() {
        assert!(matches!(
            Signal::new(vec![], 44100),
            Err(CoreError::InvalidSignal(_))
        ));
        assert!(matches!(
            Signal::new(vec![0.0; 4], 0),
            Err(CoreError::InvalidSignal(_))
        ));
    }
}
