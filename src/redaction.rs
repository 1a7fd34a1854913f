//! Output redaction for fetched secret values.
//!
//! [`MaskedValues`] accumulates every secret value exported during a run;
//! [`MaskingWriter`] wraps the host's console stream and replaces each
//! occurrence of an accumulated value with [`MASK`] before forwarding.
//!
//! Matching is exact-substring, case-sensitive, non-overlapping, and
//! leftmost-first; when two values match at the same position the longer one
//! wins. The aggregate pattern is rebuilt lazily, only on the first write
//! after the set has grown.
//!
//! Masking operates per `write` call. A value split across two writes is not
//! guaranteed to be masked; hosts that buffer output line-wise get full
//! coverage in practice.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use regex::bytes::{NoExpand, Regex};

/// Replacement marker emitted for every masked occurrence.
pub const MASK: &str = "****";

#[derive(Default)]
struct MaskState {
    values: HashSet<String>,
    generation: u64,
}

/// Shared, growing set of values that must never reach an output stream.
///
/// Handles are cheap to clone and internally synchronized, so the injection
/// loop can insert while a log-writing thread reads. The set only ever grows
/// within a run. Debug prints the size and generation, never the values.
#[derive(Clone, Default)]
pub struct MaskedValues {
    state: Arc<Mutex<MaskState>>,
}

impl MaskedValues {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value for masking. Returns whether the set changed.
    ///
    /// Blank values (empty or whitespace-only) are rejected; masking them
    /// would shred ordinary output. Re-registering a known value is a no-op
    /// and does not invalidate compiled patterns.
    pub fn insert(&self, value: &str) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let mut state = self.lock();
        if state.values.insert(value.to_string()) {
            state.generation += 1;
            true
        } else {
            false
        }
    }

    /// Number of registered values.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// True when nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    /// Whether `value` is registered.
    pub fn contains(&self, value: &str) -> bool {
        self.lock().values.contains(value)
    }

    /// Returns `(generation, values)` when the set changed since `seen`.
    ///
    /// Values come back longest first so that an aggregate alternation
    /// prefers the longest match at any position.
    pub(crate) fn snapshot_if_changed(&self, seen: u64) -> Option<(u64, Vec<String>)> {
        let state = self.lock();
        if state.generation == seen {
            return None;
        }
        let mut values: Vec<String> = state.values.iter().cloned().collect();
        values.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Some((state.generation, values))
    }

    // The state is append-only, so a writer that panicked mid-insert cannot
    // leave it inconsistent; recover instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, MaskState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for MaskedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MaskedValues")
            .field("len", &state.values.len())
            .field("generation", &state.generation)
            .finish()
    }
}

/// A [`Write`] adapter that masks registered values in everything passing
/// through it.
///
/// Wrap the host's console/log stream with this before starting a run and
/// every occurrence of a fetched secret value is replaced with [`MASK`].
/// When no values are registered, writes pass through untouched.
pub struct MaskingWriter<W: Write> {
    inner: W,
    masked: MaskedValues,
    pattern: Option<Regex>,
    pattern_generation: u64,
}

impl<W: Write> MaskingWriter<W> {
    /// Wraps `inner`, masking every value registered in `masked`.
    pub fn new(inner: W, masked: MaskedValues) -> Self {
        Self { inner, masked, pattern: None, pattern_generation: 0 }
    }

    /// Unwraps the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn refresh_pattern(&mut self) -> io::Result<()> {
        let Some((generation, values)) = self.masked.snapshot_if_changed(self.pattern_generation)
        else {
            return Ok(());
        };
        let alternation =
            values.iter().map(|value| regex::escape(value)).collect::<Vec<_>>().join("|");
        // Failing to build the pattern must not let secrets through; the
        // stream errors instead of passing text unmasked.
        let pattern = Regex::new(&alternation).map_err(|err| {
            io::Error::new(io::ErrorKind::InvalidData, format!("mask pattern rebuild failed: {}", err))
        })?;
        self.pattern = Some(pattern);
        self.pattern_generation = generation;
        Ok(())
    }
}

impl<W: Write> Write for MaskingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.refresh_pattern()?;
        match &self.pattern {
            None => self.inner.write_all(buf)?,
            Some(pattern) => {
                let masked = pattern.replace_all(buf, NoExpand(MASK.as_bytes()));
                self.inner.write_all(&masked)?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
