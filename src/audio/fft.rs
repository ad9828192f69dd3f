//! Forward real transform producing the packed half-complex layout.
//!
//! For a block of `n` real samples the output holds, in `n` slots:
//! index 0 the DC real part, index `k` (0 < k < n/2) the real part of bin
//! `k` with its imaginary part at index `n - k`, and, for even `n`, index
//! `n/2` the Nyquist real part.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::SessionError;

pub struct FftEngine {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftEngine {
    /// Plans the transform once; `execute` never re-plans or allocates.
    pub fn new(len: usize) -> Result<Self, SessionError> {
        if len == 0 {
            return Err(SessionError::InvalidConfig(
                "transform length must be > 0".into(),
            ));
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(len);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); len],
            scratch,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Transforms `input` into `output`, both exactly `len()` long.
    pub fn execute(&mut self, input: &[f32], output: &mut [f32]) {
        let n = self.buffer.len();
        debug_assert_eq!(input.len(), n);
        debug_assert_eq!(output.len(), n);

        for (slot, &sample) in self.buffer.iter_mut().zip(input) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        output[0] = self.buffer[0].re;
        for k in 1..(n + 1) / 2 {
            output[k] = self.buffer[k].re;
            output[n - k] = self.buffer[k].im;
        }
        if n % 2 == 0 {
            output[n / 2] = self.buffer[n / 2].re;
        }
    }
}

/// Magnitude of bin `k` (0 < k < n/2) read from a packed spectrum
#[inline]
pub fn packed_magnitude(spectrum: &[f32], k: usize) -> f32 {
    let re = spectrum[k];
    let im = spectrum[spectrum.len() - k];
    (re * re + im * im).sqrt()
}
