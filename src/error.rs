//! Errors raised while building a machine.
//!
//! Everything here is reported before the first cycle runs.  Faults the
//! real hardware exhibits (JAM lock-up, floating bus) are emulated, not
//! reported.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// A ROM image has the wrong size.
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    /// No directory holding all ROM images was found.
    RomNotFound { searched: Vec<PathBuf> },
    /// Reading a file failed.
    Io { path: PathBuf, source: io::Error },
    /// The machine configuration could not be parsed.
    Config(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomSize {
                name,
                expected,
                actual,
            } => write!(
                f,
                "{name} ROM image is {actual} bytes, expected {expected}"
            ),
            Self::RomNotFound { searched } => {
                writeln!(f, "C64 ROM files not found.  Searched:")?;
                for dir in searched {
                    writeln!(f, "  {}", dir.display())?;
                }
                write!(
                    f,
                    "Place kernal.bin/rom (8 KiB), basic.bin/rom (8 KiB) and \
                     chargen.bin/rom (4 KiB) in one of those directories, \
                     or set the C64_ROM_DIR environment variable."
                )
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Config(e) => write!(f, "invalid machine configuration: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e)
    }
}
