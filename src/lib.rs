pub mod audio;
pub mod config;
pub mod error;

pub use audio::{AudioProcessor, Session, SourceKind};
pub use config::SessionConfig;
pub use error::{LoadError, SessionError};
