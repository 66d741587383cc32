//! Process-global single-stream wrapper.
//!
//! Mirrors the one-open-file discipline of the original readers: at most
//! one stream is open per process through this module. Code that wants
//! several streams side by side uses [`SimtelFile`] handles directly.

use std::path::Path;
use std::sync::Mutex;

use crate::errors::{Result, SimtelError};
use crate::simtel_file::SimtelFile;

static FILE: Mutex<Option<SimtelFile>> = Mutex::new(None);

fn slot() -> std::sync::MutexGuard<'static, Option<SimtelFile>> {
    // a poisoned lock only means a panic mid-query; the slot itself is
    // still valid
    FILE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Open `path` as the process-global stream.
pub fn open<P: AsRef<Path>>(path: P) -> Result<()> {
    let mut guard = slot();
    if guard.is_some() {
        return Err(SimtelError::StreamAlreadyOpen);
    }
    *guard = Some(SimtelFile::open(path)?);
    Ok(())
}

/// Close the global stream. Closing when none is open is a no-op.
pub fn close() {
    *slot() = None;
}

/// Run `f` against the global stream.
pub fn with<T>(f: impl FnOnce(&mut SimtelFile) -> Result<T>) -> Result<T> {
    let mut guard = slot();
    let file = guard.as_mut().ok_or(SimtelError::NoStreamOpen)?;
    f(file)
}
