//! Output destinations and their classification.
//!
//! A destination is a local, already-open byte sink supplied by the caller.
//! Classification happens once, at first use: directories and interactive
//! terminals are never valid trace destinations.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, IsTerminal, Write};

/// What a destination handle denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkClass {
    /// Writable non-interactive sink — the only valid class.
    Regular,
    Directory,
    Terminal,
}

impl fmt::Display for SinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkClass::Regular => "regular sink",
            SinkClass::Directory => "directory",
            SinkClass::Terminal => "terminal",
        })
    }
}

/// A byte sink traces can be written to.
///
/// `classify` answers once per destination; in-memory sinks are regular by
/// default, so only handles that can actually be a directory or a terminal
/// need to override it.
pub trait TraceSink: Write {
    fn classify(&self) -> SinkClass {
        SinkClass::Regular
    }
}

impl TraceSink for File {
    fn classify(&self) -> SinkClass {
        if self.metadata().map(|m| m.is_dir()).unwrap_or(false) {
            return SinkClass::Directory;
        }
        if self.is_terminal() {
            return SinkClass::Terminal;
        }
        SinkClass::Regular
    }
}

impl TraceSink for io::Stdout {
    fn classify(&self) -> SinkClass {
        if self.is_terminal() {
            SinkClass::Terminal
        } else {
            SinkClass::Regular
        }
    }
}

impl TraceSink for Cursor<Vec<u8>> {}

impl TraceSink for Vec<u8> {}
