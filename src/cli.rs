use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bandscope", about = "Live audio spectrum analyzer (microphone or file playback)")]
pub struct Cli {
    /// Audio file to play instead of live input (WAV, MP3, FLAC, OGG)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Config file (defaults to bandscope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Frames per audio block (FFT size)
    #[arg(long, default_value_t = 1024)]
    pub frames: usize,

    /// Requested input channels (1 or 2)
    #[arg(long, default_value_t = 2)]
    pub channels: usize,

    /// Number of logarithmic frequency bands
    #[arg(short, long, default_value_t = 64)]
    pub bands: usize,

    /// Meter refresh rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Stop after this many seconds instead of waiting for `q`
    #[arg(long)]
    pub seconds: Option<f32>,
}
