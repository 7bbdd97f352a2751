//! Multi-stream trace writer engine.
//!
//! # Registry
//! [`StreamRegistry`] owns one [`StreamState`] per open destination and
//! routes every write call to the right state.  Lookups go through a
//! single-entry last-used cache that is verified by identity before being
//! trusted — callers may interleave writes across destinations in any
//! order — with a scan of the open destinations as the fallback.
//!
//! # Encoding freeze
//! The first trace written to a destination freezes that stream's
//! `ns_first` and payload kind.  They never change afterwards: a later
//! trace declaring a different `trid` is still encoded with the frozen
//! kind (a warning is logged naming both).
//!
//! # Failure model
//! Synchronous, single-threaded, blocking.  Every reported error is fatal
//! to the operation in progress: no retries, no partial-trace commit.  The
//! caller must treat any error as terminating the write pipeline for that
//! destination.  Operations on a single destination are not reentrant;
//! distinct destinations need no cross-destination synchronization.

use std::fmt;
use std::io::{self, Write};

use thiserror::Error;

use crate::codec::{encode_samples, Endianness, PayloadKind};
use crate::header::HEADER_BYTES;
use crate::preamble::StreamPreamble;
use crate::sink::{SinkClass, TraceSink};
use crate::trace::{TraceRecord, MAX_SAMPLES_PER_TRACE};

// ── Handles and modes ────────────────────────────────────────────────────────

/// Registry-issued handle naming one open destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestId(u64);

impl fmt::Display for DestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "destination #{}", self.0)
    }
}

/// Length discipline of a write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    /// Every trace must carry the sample count of the first trace.
    #[default]
    Fixed,
    /// Each trace is written with its own declared length.
    Variable,
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Write-path errors.  Trace indices are 1-based counts of traces already
/// written to the named destination.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{dest}: output can't be a {class}")]
    Configuration { dest: DestId, class: SinkClass },
    #[error("{dest}: trace #{trace}: unable to handle {ns} > {max} samples per trace")]
    CapacityExceeded {
        dest: DestId,
        trace: u64,
        ns: usize,
        max: usize,
    },
    #[error("{dest}: trace #{trace}: number of samples in header ({actual}) differs from number for first trace ({expected})")]
    SchemaViolation {
        dest: DestId,
        trace: u64,
        expected: u16,
        actual: u16,
    },
    #[error("{dest}: trace #{trace}: tried to write {expected} bytes, wrote {actual} bytes")]
    WriteIntegrity {
        dest: DestId,
        trace: u64,
        expected: usize,
        actual: usize,
    },
    #[error("{dest}: trace #{trace}: header declares {declared} samples but payload holds {actual}")]
    PayloadMismatch {
        dest: DestId,
        trace: u64,
        declared: usize,
        actual: usize,
    },
    #[error("{dest}: preamble must precede the first trace")]
    PreambleAfterTrace { dest: DestId },
    #[error("{0} is not open in this registry")]
    UnknownDestination(DestId),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Per-destination state ────────────────────────────────────────────────────

/// Encoding choice frozen at the first encode call for a destination.
#[derive(Debug, Clone, Copy)]
struct FrozenEncoding {
    ns_first: u16,
    payload: PayloadKind,
    bytes_per: usize,
}

/// Per-destination mutable state: the sink, the trace counter, the frozen
/// encoding, and a scratch buffer sized for one maximum-size trace.  Never
/// shared across destinations; lives until the destination is released.
pub struct StreamState {
    id: DestId,
    sink: Box<dyn TraceSink>,
    itr: u64,
    encoding: Option<FrozenEncoding>,
    buf: Vec<u8>,
}

impl StreamState {
    fn new(id: DestId, sink: Box<dyn TraceSink>) -> Self {
        Self {
            id,
            sink,
            itr: 0,
            encoding: None,
            buf: Vec::with_capacity(HEADER_BYTES + MAX_SAMPLES_PER_TRACE * 4),
        }
    }

    /// Traces written to this destination so far.
    pub fn traces_written(&self) -> u64 {
        self.itr
    }

    /// Sample count of the first trace, once frozen.
    pub fn ns_first(&self) -> Option<u16> {
        self.encoding.map(|e| e.ns_first)
    }

    /// Payload kind chosen from the first trace, once frozen.
    pub fn payload_kind(&self) -> Option<PayloadKind> {
        self.encoding.map(|e| e.payload)
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Owns all per-destination writer state for one session.
///
/// Host byte order is probed once at construction, never per sample.
pub struct StreamRegistry {
    streams: Vec<StreamState>,
    /// Last-used hint: (handle, index).  Never trusted without an identity
    /// check — releases shift indices and callers interleave destinations.
    last: Option<(DestId, usize)>,
    next_id: u64,
    host: Endianness,
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::with_byte_order(Endianness::host())
    }

    /// Registry with an explicit host byte order.  Tests use this to prove
    /// disk bytes do not depend on the machine doing the writing.
    pub fn with_byte_order(host: Endianness) -> Self {
        Self {
            streams: Vec::new(),
            last: None,
            next_id: 1,
            host,
        }
    }

    /// Register an open sink as a trace destination.
    ///
    /// Classification happens here, on first sight: a directory or an
    /// interactive terminal fails with [`WriteError::Configuration`] before
    /// any state is allocated.  The encoding freeze is deferred to the
    /// first write.
    pub fn open(&mut self, sink: Box<dyn TraceSink>) -> Result<DestId, WriteError> {
        let dest = DestId(self.next_id);
        let class = sink.classify();
        if class != SinkClass::Regular {
            return Err(WriteError::Configuration { dest, class });
        }
        self.next_id += 1;
        self.streams.push(StreamState::new(dest, sink));
        log::debug!("{dest}: opened");
        Ok(dest)
    }

    /// Number of destinations currently open.
    pub fn open_count(&self) -> usize {
        self.streams.len()
    }

    /// Immutable view of a destination's state, if open.
    pub fn state(&self, dest: DestId) -> Option<&StreamState> {
        self.streams.iter().find(|s| s.id == dest)
    }

    fn resolve(&mut self, dest: DestId) -> Result<usize, WriteError> {
        if let Some((id, idx)) = self.last {
            if id == dest && self.streams.get(idx).map_or(false, |s| s.id == dest) {
                return Ok(idx);
            }
        }
        let idx = self
            .streams
            .iter()
            .position(|s| s.id == dest)
            .ok_or(WriteError::UnknownDestination(dest))?;
        self.last = Some((dest, idx));
        Ok(idx)
    }

    /// Write one trace record to `dest`.
    ///
    /// Invariant checks run before any byte is produced: the capacity
    /// ceiling in either mode, then the fixed-length discipline against
    /// `ns_first`.  The header preamble and the samples are encoded into
    /// the destination's scratch buffer, the produced payload byte count is
    /// verified against `bytes_per_sample x count`, and the whole trace is
    /// written in one call.  The trace counter advances only on success.
    pub fn write_trace(
        &mut self,
        dest: DestId,
        trace: &TraceRecord,
        mode: LengthMode,
    ) -> Result<(), WriteError> {
        let host = self.host;
        let idx = self.resolve(dest)?;
        let state = &mut self.streams[idx];
        let trace_no = state.itr + 1;
        let ns = trace.ns();

        if ns > MAX_SAMPLES_PER_TRACE {
            return Err(WriteError::CapacityExceeded {
                dest,
                trace: trace_no,
                ns,
                max: MAX_SAMPLES_PER_TRACE,
            });
        }
        if trace.data.len() != ns {
            return Err(WriteError::PayloadMismatch {
                dest,
                trace: trace_no,
                declared: ns,
                actual: trace.data.len(),
            });
        }

        let frozen = match state.encoding {
            Some(frozen) => {
                if mode == LengthMode::Fixed && trace.header.ns != frozen.ns_first {
                    return Err(WriteError::SchemaViolation {
                        dest,
                        trace: trace_no,
                        expected: frozen.ns_first,
                        actual: trace.header.ns,
                    });
                }
                let declared = PayloadKind::from_trid(trace.header.trid);
                if declared != frozen.payload {
                    log::warn!(
                        "{dest}: trace #{trace_no}: trid {} declares {} payload, keeping frozen {}",
                        trace.header.trid,
                        declared.name(),
                        frozen.payload.name()
                    );
                }
                frozen
            }
            None => {
                let payload = PayloadKind::from_trid(trace.header.trid);
                let frozen = FrozenEncoding {
                    ns_first: trace.header.ns,
                    payload,
                    bytes_per: payload.bytes_per_sample(),
                };
                log::debug!(
                    "{dest}: froze encoding: ns_first={}, payload={}",
                    frozen.ns_first,
                    payload.name()
                );
                state.encoding = Some(frozen);
                frozen
            }
        };

        let count = match mode {
            LengthMode::Fixed => frozen.ns_first as usize,
            LengthMode::Variable => ns,
        };

        state.buf.clear();
        trace.header.write(&mut state.buf)?;
        if state.buf.len() != HEADER_BYTES {
            return Err(WriteError::WriteIntegrity {
                dest,
                trace: trace_no,
                expected: HEADER_BYTES,
                actual: state.buf.len(),
            });
        }
        encode_samples(frozen.payload, &trace.data, count, host, &mut state.buf);

        let expected = frozen.bytes_per * count;
        let produced = state.buf.len() - HEADER_BYTES;
        if produced != expected {
            return Err(WriteError::WriteIntegrity {
                dest,
                trace: trace_no,
                expected,
                actual: produced,
            });
        }

        state.sink.write_all(&state.buf)?;
        state.itr += 1;
        self.last = Some((dest, idx));
        Ok(())
    }

    /// Write the one-time stream preamble.  Valid only before the first
    /// trace of the destination; the trace stream begins immediately after
    /// it.
    pub fn write_preamble(
        &mut self,
        dest: DestId,
        preamble: &StreamPreamble,
    ) -> Result<(), WriteError> {
        let idx = self.resolve(dest)?;
        let state = &mut self.streams[idx];
        if state.itr > 0 || state.encoding.is_some() {
            return Err(WriteError::PreambleAfterTrace { dest });
        }
        preamble.write_to(&mut state.sink)?;
        Ok(())
    }

    pub fn flush(&mut self, dest: DestId) -> Result<(), WriteError> {
        let idx = self.resolve(dest)?;
        self.streams[idx].sink.flush()?;
        Ok(())
    }

    /// Flush and remove a destination, returning its sink so the caller
    /// can close it.  The per-destination scratch buffer is dropped here
    /// instead of living for the registry's lifetime.
    pub fn release(&mut self, dest: DestId) -> Result<Box<dyn TraceSink>, WriteError> {
        let idx = self
            .streams
            .iter()
            .position(|s| s.id == dest)
            .ok_or(WriteError::UnknownDestination(dest))?;
        let mut state = self.streams.remove(idx);
        state.sink.flush()?;
        // Indices shifted; the identity check in resolve() heals any stale
        // cache entry, but a hint for the removed handle must go.
        if self.last.map_or(false, |(id, _)| id == dest) {
            self.last = None;
        }
        log::debug!("{dest}: released after {} trace(s)", state.itr);
        Ok(state.sink)
    }
}
