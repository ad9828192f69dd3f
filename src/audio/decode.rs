use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::LoadError;

/// A decoded audio file held in memory with a read cursor.
///
/// Samples are interleaved at the session channel count. Reads from the
/// real-time thread are plain copies; dropping the source closes it.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl FileSource {
    /// Decodes `path` and remixes it to `channels` interleaved channels.
    pub fn open(path: &Path, channels: usize) -> Result<Self, LoadError> {
        let (decoded, file_channels, sample_rate) = decode_interleaved(path)?;
        let samples = remix(decoded, file_channels, channels);
        if samples.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        log::info!(
            "Loaded {}: {} frames, {} channel(s) -> {}, {}Hz",
            path.display(),
            samples.len() / channels,
            file_channels,
            channels,
            sample_rate
        );

        Ok(Self {
            path: path.to_path_buf(),
            samples,
            sample_rate,
            cursor: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_samples(path: &Path, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            samples,
            sample_rate,
            cursor: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total interleaved samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Current read cursor, in interleaved samples
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor, clamped to the end of the data.
    pub fn seek(&mut self, position: usize) {
        self.cursor = position.min(self.samples.len());
    }

    /// Copies up to `out.len()` samples from the cursor and advances it.
    /// Returns fewer than requested at end of stream.
    pub fn read_interleaved(&mut self, out: &mut [f32]) -> usize {
        let available = self.samples.len() - self.cursor;
        let count = available.min(out.len());
        out[..count].copy_from_slice(&self.samples[self.cursor..self.cursor + count]);
        self.cursor += count;
        count
    }

    /// Fills all of `out`, rewinding to the start each time the data runs out.
    pub fn fill_looped(&mut self, out: &mut [f32]) {
        let mut filled = 0;
        while filled < out.len() {
            filled += self.read_interleaved(&mut out[filled..]);
            if filled < out.len() {
                if self.samples.is_empty() {
                    out[filled..].fill(0.0);
                    return;
                }
                self.seek(0);
            }
        }
    }
}

fn decode_interleaved(path: &Path) -> Result<(Vec<f32>, usize, u32), LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|source| LoadError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| LoadError::NoTrack(path.to_path_buf()))?;

    let track_id = track.id;
    // Containers may omit the channel layout; decoded buffers always carry it
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let decode_err = |source: symphonia::core::errors::Error| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err(e)),
        };

        channels = Some(decoded.spec().channels.count());
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    Ok((samples, channels.unwrap_or(1), sample_rate))
}

/// Converts interleaved audio between channel counts. Equal counts pass
/// through; otherwise each frame is averaged and spread to every output
/// channel, which covers the mono/stereo cases.
pub fn remix(samples: Vec<f32>, from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 {
        return samples;
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        let mono = frame.iter().sum::<f32>() / from as f32;
        out.extend(std::iter::repeat(mono).take(to));
    }
    out
}
