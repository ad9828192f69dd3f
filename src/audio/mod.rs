//! Audio acquisition and spectral analysis.
//!
//! The backend thread runs [`callback::CaptureCallback`]; everything else
//! lives on the application thread behind [`processor::AudioProcessor`].

pub mod analysis;
pub mod backend;
pub mod callback;
pub mod decode;
pub mod fft;
pub mod processor;
pub mod source;

pub use analysis::SpectrumAnalyzer;
pub use backend::Session;
pub use processor::AudioProcessor;
pub use source::SourceKind;
