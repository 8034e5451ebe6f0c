//! Result handle and its disposal
//!
//! The scanner leaves its report behind as a [`ResultHandle`]: a lazily opened
//! stream over a file. After the gate decision the handle is either closed
//! straight away or rewound and handed to whoever prints the detailed
//! summary. [`dispose`] makes exactly one of those two calls per handle.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("Result handle is closed")]
    Closed,

    #[error("Failed to read results from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode results from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Lifecycle of a [`ResultHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Readable; possibly partially consumed
    Open,
    /// Rewound, ready for one full read by another consumer
    ResetForReread,
    /// Released; no further reads are possible
    Closed,
}

/// Single-owner stream over scan output
#[derive(Debug)]
pub struct ResultHandle {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    state: HandleState,
    disposed: bool,
    temp: Option<TempPath>,
}

impl ResultHandle {
    /// Handle over an existing file that outlives the handle
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
            state: HandleState::Open,
            disposed: false,
            temp: None,
        }
    }

    /// Handle over a temporary file that is deleted on close
    pub fn from_temp_path(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            reader: None,
            state: HandleState::Open,
            disposed: false,
            temp: Some(temp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == HandleState::Closed
    }

    fn reader(&mut self) -> Result<&mut BufReader<File>, HandleError> {
        if self.state == HandleState::Closed {
            return Err(HandleError::Closed);
        }
        if self.reader.is_none() {
            let file = File::open(&self.path).map_err(|source| HandleError::Io {
                path: self.path.clone(),
                source,
            })?;
            self.reader = Some(BufReader::new(file));
        }
        // Checked above: the reader was just created if it was missing
        self.reader.as_mut().ok_or(HandleError::Closed)
    }

    /// Reads everything from the current position to the end
    pub fn read_to_string(&mut self) -> Result<String, HandleError> {
        let path = self.path.clone();
        let mut content = String::new();
        self.reader()?
            .read_to_string(&mut content)
            .map_err(|source| HandleError::Io { path, source })?;
        self.state = HandleState::Open;
        Ok(content)
    }

    /// Reads the remaining content as one JSON document
    pub fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, HandleError> {
        let content = self.read_to_string()?;
        serde_json::from_str(&content).map_err(|source| HandleError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Rewinds the stream for one more full read
    pub fn reset(&mut self) -> Result<(), HandleError> {
        if self.state == HandleState::Closed {
            return Err(HandleError::Closed);
        }
        if let Some(reader) = self.reader.as_mut() {
            reader
                .seek(SeekFrom::Start(0))
                .map_err(|source| HandleError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        }
        self.state = HandleState::ResetForReread;
        Ok(())
    }

    /// Releases the underlying file. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), HandleError> {
        if self.state == HandleState::Closed {
            return Ok(());
        }
        self.reader = None;
        self.state = HandleState::Closed;
        if let Some(temp) = self.temp.take() {
            temp.close().map_err(|source| HandleError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Drop for ResultHandle {
    fn drop(&mut self) {
        if !self.disposed && self.state != HandleState::Closed {
            warn!(path = %self.path.display(), "Result handle dropped without being disposed");
        }
    }
}

/// What [`dispose`] did with a handle
#[derive(Debug)]
pub enum Disposition {
    /// The handle was closed; nobody reads it again
    Closed,
    /// The handle was rewound and belongs to the summary printer now
    HandedOff(ResultHandle),
}

impl Disposition {
    pub fn into_handle(self) -> Option<ResultHandle> {
        match self {
            Disposition::Closed => None,
            Disposition::HandedOff(handle) => Some(handle),
        }
    }
}

/// Closes the handle, or rewinds it for the detailed summary
///
/// # Panics
///
/// Panics if the handle was already disposed.
pub fn dispose(
    mut handle: ResultHandle,
    detailed_summary_requested: bool,
) -> Result<Disposition, HandleError> {
    assert!(
        !handle.disposed,
        "result handle for {} disposed twice",
        handle.path.display()
    );
    handle.disposed = true;

    if detailed_summary_requested {
        handle.reset()?;
        debug!(path = %handle.path.display(), "Result handle reset for detailed summary");
        Ok(Disposition::HandedOff(handle))
    } else {
        handle.close()?;
        debug!(path = %handle.path.display(), "Result handle closed");
        Ok(Disposition::Closed)
    }
}
