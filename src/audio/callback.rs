//! Real-time capture callback.
//!
//! Runs on the audio backend's thread. It never allocates, never blocks
//! and never logs: it only copies samples from the active source into the
//! staging block and publishes complete blocks through a triple buffer, so
//! the reader always sees a whole block and never a half-written one.

use std::sync::TryLockError;

use super::source::{SharedSource, Source, SourceKind};

pub struct CaptureCallback {
    source: SharedSource,
    blocks: triple_buffer::Input<Vec<f32>>,
    filled: usize,
    last_kind: SourceKind,
}

impl CaptureCallback {
    pub fn new(source: SharedSource, blocks: triple_buffer::Input<Vec<f32>>) -> Self {
        Self {
            source,
            blocks,
            filled: 0,
            last_kind: SourceKind::Live,
        }
    }

    /// Handles one backend buffer of interleaved input samples.
    ///
    /// With a File source the input is ignored and the same number of
    /// samples is read from the file instead, looping at end of stream.
    /// When the backend delivers exactly one block per call, exactly one
    /// block is published per call. If the source is being swapped right
    /// now the buffer is dropped and the last published block stays current.
    /// A partly filled block is discarded whenever the audio stops being
    /// contiguous (a dropped buffer or a source change), so a published
    /// block never joins two unrelated segments.
    pub fn process(&mut self, input: &[f32]) {
        let mut source = match self.source.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.filled = 0;
                return;
            }
        };

        let kind = source.kind();
        if kind != self.last_kind {
            self.filled = 0;
            self.last_kind = kind;
        }

        let mut offset = 0;
        while offset < input.len() {
            let block = self.blocks.input_buffer_mut();
            let block_len = block.len();
            let count = (block_len - self.filled).min(input.len() - offset);
            let dst = &mut block[self.filled..self.filled + count];

            match &mut *source {
                Source::Live => dst.copy_from_slice(&input[offset..offset + count]),
                Source::File(file) => file.fill_looped(dst),
            }

            self.filled += count;
            offset += count;

            if self.filled == block_len {
                self.blocks.publish();
                self.filled = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::FileSource;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use triple_buffer::TripleBuffer;

    fn setup(block_len: usize, source: Source) -> (CaptureCallback, triple_buffer::Output<Vec<f32>>, SharedSource) {
        let shared = Arc::new(Mutex::new(source));
        let (input, output) = TripleBuffer::new(&vec![0.0f32; block_len]).split();
        (CaptureCallback::new(Arc::clone(&shared), input), output, shared)
    }

    #[test]
    fn live_block_copied_verbatim() {
        let (mut callback, mut output, _) = setup(8, Source::Live);
        let input: Vec<f32> = (0..8).map(|i| i as f32 * 0.1).collect();
        callback.process(&input);
        assert_eq!(output.read(), &input);
    }

    #[test]
    fn partial_buffers_publish_on_completion() {
        let (mut callback, mut output, _) = setup(8, Source::Live);
        callback.process(&[1.0; 5]);
        assert!(!output.update());
        callback.process(&[2.0; 5]);
        assert!(output.update());
        assert_eq!(output.read(), &vec![1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn file_shorter_than_block_loops() {
        let file = FileSource::from_samples(Path::new("short.wav"), vec![1.0, 2.0, 3.0], 44100);
        let (mut callback, mut output, _) = setup(8, Source::File(file));
        callback.process(&[0.0; 8]);
        assert_eq!(output.read(), &vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0]);

        callback.process(&[0.0; 8]);
        assert_eq!(output.read(), &vec![3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn contended_source_keeps_last_block() {
        let (mut callback, mut output, shared) = setup(4, Source::Live);
        callback.process(&[1.0; 4]);
        assert_eq!(output.read(), &vec![1.0; 4]);

        let guard = shared.lock().unwrap();
        callback.process(&[9.0; 4]);
        drop(guard);

        assert!(!output.update());
        assert_eq!(output.read(), &vec![1.0; 4]);
    }

    #[test]
    fn dropped_buffer_restarts_partial_block() {
        let (mut callback, mut output, shared) = setup(8, Source::Live);
        callback.process(&[1.0; 4]);

        let guard = shared.lock().unwrap();
        callback.process(&[9.0; 4]);
        drop(guard);

        callback.process(&[2.0; 4]);
        assert!(!output.update());
        callback.process(&[3.0; 4]);
        assert!(output.update());
        assert_eq!(output.read(), &vec![2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn source_change_restarts_partial_block() {
        let (mut callback, mut output, shared) = setup(8, Source::Live);
        callback.process(&[0.5; 4]);
        *shared.lock().unwrap() = Source::File(FileSource::from_samples(
            Path::new("midblock.wav"),
            vec![-1.0; 16],
            44100,
        ));

        callback.process(&[0.5; 4]);
        assert!(!output.update());
        callback.process(&[0.5; 4]);
        assert_eq!(output.read(), &vec![-1.0; 8]);
    }

    #[test]
    fn switch_to_file_takes_effect_next_call() {
        let (mut callback, mut output, shared) = setup(4, Source::Live);
        callback.process(&[0.5; 4]);
        *shared.lock().unwrap() = Source::File(FileSource::from_samples(
            Path::new("swap.wav"),
            vec![-1.0; 4],
            44100,
        ));
        callback.process(&[0.5; 4]);
        assert_eq!(output.read(), &vec![-1.0; 4]);
    }
}
