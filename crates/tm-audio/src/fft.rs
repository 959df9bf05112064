use realfft::RealFftPlanner;

use crate::error::AudioError;

/// FFT pipeline: windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers, so a whole track is
/// transformed without per-frame allocation beyond the output rows.
///
/// # Example
/// ```
/// use tm_audio::fft::FftPipeline;
/// let fft = FftPipeline::new(2048);
/// assert_eq!(fft.bins(), 1025);
/// ```
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f32>>,
    /// Hann window coefficients.
    window: Vec<f32>,
}

impl FftPipeline {
    /// Create a new FFT pipeline with the given window size.
    ///
    /// # Panics
    /// Panics if `size` is 0.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "FFT size must be > 0");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        // Hann window
        let window: Vec<f32> = (0..size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
        }
    }

    /// Window `samples` (zero-padded to the FFT size) and write the
    /// magnitude spectrum into `out` (N/2+1 bins).
    ///
    /// # Example
    /// ```
    /// use tm_audio::fft::FftPipeline;
    /// let mut fft = FftPipeline::new(256);
    /// let mut out = vec![0.0; fft.bins()];
    /// fft.process_into(&[0.0f32; 256], &mut out);
    /// assert!(out.iter().all(|m| *m == 0.0));
    /// ```
    pub fn process_into(&mut self, samples: &[f32], out: &mut [f32]) {
        let n = self.fft_size.min(samples.len());

        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n { samples[i] * self.window[i] } else { 0.0 };
        }

        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            out.fill(0.0);
            return;
        }

        for (slot, c) in out.iter_mut().zip(&self.spectrum_buf) {
            *slot = (c.re * c.re + c.im * c.im).sqrt() / self.fft_size as f32;
        }
    }

    /// Magnitude spectrogram of a whole signal, one row per hop.
    ///
    /// The last frame is zero-padded. Frame `t` covers samples
    /// `[t * hop, t * hop + fft_size)`.
    ///
    /// # Errors
    /// Returns [`AudioError::TooShort`] if the signal is shorter than one window.
    pub fn spectrogram(&mut self, samples: &[f32], hop: usize) -> Result<Vec<Vec<f32>>, AudioError> {
        if samples.len() < self.fft_size || hop == 0 {
            return Err(AudioError::TooShort {
                samples: samples.len(),
                frame_size: self.fft_size,
            });
        }

        let n_frames = 1 + (samples.len() - self.fft_size).div_ceil(hop);
        let mut frames = Vec::with_capacity(n_frames);
        for t in 0..n_frames {
            let start = t * hop;
            let end = (start + self.fft_size).min(samples.len());
            let mut row = vec![0.0; self.bins()];
            self.process_into(&samples[start..end], &mut row);
            frames.push(row);
        }
        Ok(frames)
    }

    /// Number of magnitude bins per frame.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}
