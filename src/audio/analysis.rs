use std::ops::Range;

use super::fft::{packed_magnitude, FftEngine};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Logarithmically spaced bin ranges over the usable half spectrum.
///
/// Band `i` starts at `floor(2^(i / bands * log2(n/2)))`. Bands that would
/// collapse to zero width are widened to one bin, and the last band always
/// ends at the Nyquist bin `n/2` (exclusive).
pub fn log_band_ranges(frames_per_block: usize, bands: usize) -> Vec<Range<usize>> {
    let half = frames_per_block / 2;
    let octaves = (half as f64).log2();
    let edge = |i: usize| -> usize {
        (2f64.powf(i as f64 / bands as f64 * octaves)).floor() as usize
    };

    (0..bands)
        .map(|i| {
            let start = edge(i).min(half - 1);
            let end = if i + 1 == bands { half } else { edge(i + 1).min(half) };
            start..end.max(start + 1)
        })
        .collect()
}

/// Reduces interleaved blocks to per-band mean spectral magnitude.
pub struct SpectrumAnalyzer {
    engine: FftEngine,
    channels: usize,
    mono: Vec<f32>,
    spectrum: Vec<f32>,
    ranges: Vec<Range<usize>>,
    energies: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let n = config.frames_per_block;
        let engine = FftEngine::new(n)?;
        let ranges = log_band_ranges(n, config.bands);

        log::debug!(
            "Spectrum analyzer: {} bins -> {} bands (first {:?}, last {:?})",
            n / 2,
            config.bands,
            ranges.first(),
            ranges.last()
        );

        Ok(Self {
            engine,
            channels: config.channels,
            mono: vec![0.0; n],
            spectrum: vec![0.0; n],
            ranges,
            energies: vec![0.0; config.bands],
        })
    }

    /// Analyzes one interleaved block of `frames_per_block * channels`
    /// samples and returns the band energies, low to high frequency.
    pub fn analyze(&mut self, block: &[f32]) -> &[f32] {
        debug_assert_eq!(block.len(), self.mono.len() * self.channels);

        // Downmix
        let scale = 1.0 / self.channels as f32;
        for (out, frame) in self.mono.iter_mut().zip(block.chunks_exact(self.channels)) {
            *out = frame.iter().sum::<f32>() * scale;
        }

        self.engine.execute(&self.mono, &mut self.spectrum);

        for (energy, range) in self.energies.iter_mut().zip(&self.ranges) {
            let width = range.len() as f32;
            let sum: f32 = range
                .clone()
                .map(|k| packed_magnitude(&self.spectrum, k))
                .sum();
            *energy = sum / width;
        }

        &self.energies
    }

    pub fn band_energies(&self) -> &[f32] {
        &self.energies
    }

    pub fn band_ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Packed spectrum from the most recent `analyze`
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn mono(frames_per_block: usize, bands: usize) -> SessionConfig {
        SessionConfig {
            sample_rate: 44100,
            frames_per_block,
            channels: 1,
            bands,
        }
    }

    fn sine_at_bin(n: usize, bin: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn first_band_widened_to_one_bin() {
        let ranges = log_band_ranges(1024, 64);
        // floor(2^(0/64 * 9)) == floor(2^(1/64 * 9)) == 1
        assert_eq!(ranges[0], 1..2);
    }

    #[test]
    fn last_band_ends_at_nyquist() {
        let ranges = log_band_ranges(1024, 64);
        let expected_start = 2f64.powf(63.0 / 64.0 * 9.0).floor() as usize;
        assert_eq!(ranges[63], expected_start..512);
    }

    #[test]
    fn ranges_are_monotonic_and_in_bounds() {
        for &(n, bands) in &[(1024, 64), (4, 64), (8, 3), (2048, 1), (100, 16)] {
            let ranges = log_band_ranges(n, bands);
            assert_eq!(ranges.len(), bands);
            for r in &ranges {
                assert!(r.start >= 1);
                assert!(r.end > r.start);
                assert!(r.end <= n / 2);
            }
            for pair in ranges.windows(2) {
                assert!(pair[1].start >= pair[0].start);
                assert!(pair[1].end >= pair[0].end);
            }
            assert_eq!(ranges.last().unwrap().end, n / 2);
        }
    }

    #[test]
    fn silence_gives_zero_energy() {
        let config = mono(1024, 64);
        let mut analyzer = SpectrumAnalyzer::new(&config).unwrap();
        let energies = analyzer.analyze(&vec![0.0; 1024]);
        assert_eq!(energies.len(), 64);
        assert!(energies.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn energies_are_non_negative_and_sized() {
        let config = SessionConfig {
            sample_rate: 48000,
            frames_per_block: 8,
            channels: 2,
            bands: 64,
        };
        let mut analyzer = SpectrumAnalyzer::new(&config).unwrap();
        let block: Vec<f32> = (0..16).map(|i| ((i * 7) % 5) as f32 - 2.0).collect();
        let energies = analyzer.analyze(&block);
        assert_eq!(energies.len(), 64);
        assert!(energies.iter().all(|&e| e >= 0.0 && e.is_finite()));
    }

    #[test]
    fn sine_peaks_in_its_band() {
        let n = 1024;
        let bin = 100;
        let config = mono(n, 64);
        let mut analyzer = SpectrumAnalyzer::new(&config).unwrap();
        let target = analyzer
            .band_ranges()
            .iter()
            .position(|r| r.contains(&bin))
            .unwrap();

        let energies = analyzer.analyze(&sine_at_bin(n, bin)).to_vec();
        let peak = energies[target];
        assert!(peak > 10.0, "peak energy {}", peak);

        for (i, &e) in energies.iter().enumerate() {
            if i.abs_diff(target) > 2 {
                assert!(e < peak * 0.01, "band {} = {} vs peak {}", i, e, peak);
            }
        }
    }

    #[test]
    fn stereo_downmix_matches_mono() {
        let n = 256;
        let signal = sine_at_bin(n, 20);
        let interleaved: Vec<f32> = signal.iter().flat_map(|&s| [s, s]).collect();

        let mut mono_analyzer = SpectrumAnalyzer::new(&mono(n, 16)).unwrap();
        let mut stereo_analyzer = SpectrumAnalyzer::new(&SessionConfig {
            channels: 2,
            ..mono(n, 16)
        })
        .unwrap();

        let a = mono_analyzer.analyze(&signal).to_vec();
        let b = stereo_analyzer.analyze(&interleaved).to_vec();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-3);
        }
    }
}
