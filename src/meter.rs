//! One-line terminal bar meter for band energies.

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Peak decay per rendered frame (0.0-1.0, higher = slower fall)
const PEAK_DECAY: f32 = 0.995;

/// Energies below this never raise the scale, so silence stays blank
const PEAK_FLOOR: f32 = 1e-3;

pub struct Meter {
    peak: f32,
}

impl Meter {
    pub fn new() -> Self {
        Self { peak: PEAK_FLOOR }
    }

    /// Scales against a slowly decaying running peak.
    pub fn render(&mut self, energies: &[f32]) -> String {
        let frame_max = energies.iter().copied().fold(0.0f32, f32::max);
        self.peak = (self.peak * PEAK_DECAY).max(frame_max).max(PEAK_FLOOR);

        energies
            .iter()
            .map(|&e| {
                let level = (e / self.peak).clamp(0.0, 1.0);
                LEVELS[(level * (LEVELS.len() - 1) as f32).round() as usize]
            })
            .collect()
    }
}
