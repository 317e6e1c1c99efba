// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Identifier of a simulated host. Valid IDs lie in `[0, node_count)`.
pub type NodeId = usize;

/// Identifier of a flow (connection) line. Assigned sequentially from 1.
pub type FlowId = u64;

/// Identifier of a oneshot synchronization trigger. Issued sequentially
/// from 1 and declared contiguously in the trigger section.
pub type TriggerId = u64;

#[macro_export]
/// Build a [ScheduleError::Config] from a format string
macro_rules! config_error {
    ($($arg:tt)*) => {
        Err($crate::types::ScheduleError::Config(format!($($arg)*)))?
    };
}

/// The error type returned by schedule generation and emission.
#[derive(Debug)]
pub enum ScheduleError {
    /// A parameter combination the generators cannot express, e.g. a group
    /// size that does not divide the connection count.
    Config(String),

    /// A structural invariant of a built schedule does not hold.
    Invalid(String),

    /// Writing the output file failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScheduleError::Config(msg) => {
                write!(f, "Configuration error: {msg}")
            }
            ScheduleError::Invalid(msg) => {
                write!(f, "Invalid schedule: {msg}")
            }
            ScheduleError::Io { path, source } => {
                write!(f, "Failed to write '{}': {source}", path.display())
            }
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScheduleError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The result type for most schedule generation functions
pub type ScheduleResult<T> = Result<T, ScheduleError>;
