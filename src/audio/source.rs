use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::decode::FileSource;
use crate::error::LoadError;

/// The origin feeding the real-time callback. Exactly one is active.
#[derive(Debug)]
pub enum Source {
    Live,
    File(FileSource),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Live => SourceKind::Live,
            Source::File(_) => SourceKind::File,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Live,
    File,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Live => write!(f, "Live Input"),
            SourceKind::File => write!(f, "Playing File"),
        }
    }
}

/// Source state shared with the callback thread. Replaced whole under the
/// lock, so the callback never sees a tag without its file.
pub type SharedSource = Arc<Mutex<Source>>;

/// A file switched away from: closed, but its path and cursor are kept so
/// toggling back resumes where playback stopped.
#[derive(Debug, Clone)]
struct ParkedFile {
    path: PathBuf,
    position: usize,
}

/// Owns the active source and mediates every change to it. Lives on the
/// application thread; the callback only holds a clone of `shared`.
pub struct SourceSwitch {
    shared: SharedSource,
    channels: usize,
    sample_rate: u32,
    parked: Option<ParkedFile>,
}

impl SourceSwitch {
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Source::Live)),
            channels,
            sample_rate,
            parked: None,
        }
    }

    pub fn shared(&self) -> SharedSource {
        Arc::clone(&self.shared)
    }

    pub fn active(&self) -> SourceKind {
        self.lock().kind()
    }

    /// Cursor of the open file, or of the parked one while Live is active
    pub fn file_position(&self) -> Option<usize> {
        match &*self.lock() {
            Source::File(file) => Some(file.position()),
            Source::Live => self.parked.as_ref().map(|p| p.position),
        }
    }

    /// Opens `path` and makes it the active source. On failure nothing changes.
    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let file = self.open(path)?;
        let previous = self.install(Source::File(file));
        self.parked = None;

        if let Source::File(old) = previous {
            log::info!("Closed {}", old.path().display());
        }
        Ok(())
    }

    /// Flips between Live and File and returns the now-active kind.
    ///
    /// Leaving File closes the file. Returning to File reopens the last
    /// loaded file at its previous cursor; with none ever loaded this stays
    /// Live. A reopen failure leaves Live active.
    pub fn toggle(&mut self) -> Result<SourceKind, LoadError> {
        match self.active() {
            SourceKind::File => {
                if let Source::File(file) = self.install(Source::Live) {
                    self.parked = Some(ParkedFile {
                        path: file.path().to_path_buf(),
                        position: file.position(),
                    });
                    log::info!("Closed {}, switched to live input", file.path().display());
                }
                Ok(SourceKind::Live)
            }
            SourceKind::Live => {
                let Some(parked) = self.parked.clone() else {
                    log::info!("No audio file loaded, staying on live input");
                    return Ok(SourceKind::Live);
                };
                let mut file = self.open(&parked.path)?;
                file.seek(parked.position);
                self.install(Source::File(file));
                self.parked = None;
                Ok(SourceKind::File)
            }
        }
    }

    fn open(&self, path: &Path) -> Result<FileSource, LoadError> {
        let file = FileSource::open(path, self.channels)?;
        if file.sample_rate() != 0 && file.sample_rate() != self.sample_rate {
            log::warn!(
                "{} is {}Hz, session runs at {}Hz; playing without resampling",
                path.display(),
                file.sample_rate(),
                self.sample_rate
            );
        }
        Ok(file)
    }

    /// Swaps in `source` and hands back the old one, to be dropped outside
    /// the lock.
    fn install(&self, source: Source) -> Source {
        std::mem::replace(&mut *self.lock(), source)
    }

    fn lock(&self) -> MutexGuard<'_, Source> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
