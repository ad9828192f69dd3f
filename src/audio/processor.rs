use std::path::Path;
use triple_buffer::TripleBuffer;

use super::analysis::SpectrumAnalyzer;
use super::callback::CaptureCallback;
use super::source::{SourceKind, SourceSwitch};
use crate::config::SessionConfig;
use crate::error::{LoadError, SessionError};

/// Application-side session context: source switching, the consumer end
/// of the block handoff and the spectrum analyzer.
///
/// Created together with the [`CaptureCallback`] that feeds it; the
/// callback goes to the audio backend, this stays on the application thread.
pub struct AudioProcessor {
    config: SessionConfig,
    switch: SourceSwitch,
    blocks: triple_buffer::Output<Vec<f32>>,
    block: Vec<f32>,
    analyzer: SpectrumAnalyzer,
}

impl AudioProcessor {
    pub fn new(config: SessionConfig) -> Result<(Self, CaptureCallback), SessionError> {
        config.validate()?;

        let analyzer = SpectrumAnalyzer::new(&config)?;
        let block = vec![0.0f32; config.block_len()];
        let (input, output) = TripleBuffer::new(&block).split();
        let switch = SourceSwitch::new(config.channels, config.sample_rate);
        let callback = CaptureCallback::new(switch.shared(), input);

        Ok((
            Self {
                config,
                switch,
                blocks: output,
                block,
                analyzer,
            },
            callback,
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Takes the most recently published block and analyzes it. Call once
    /// per application loop iteration.
    pub fn process(&mut self) -> &[f32] {
        self.block.copy_from_slice(self.blocks.read());
        self.analyzer.analyze(&self.block)
    }

    /// Band energies from the last `process`, low to high frequency
    pub fn band_energies(&self) -> &[f32] {
        self.analyzer.band_energies()
    }

    /// Interleaved samples of the block analyzed by the last `process`
    pub fn audio_data(&self) -> &[f32] {
        &self.block
    }

    pub fn active_source(&self) -> SourceKind {
        self.switch.active()
    }

    pub fn file_position(&self) -> Option<usize> {
        self.switch.file_position()
    }

    pub fn toggle_source(&mut self) -> Result<SourceKind, LoadError> {
        self.switch.toggle()
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        self.switch.load_file(path)
    }
}
