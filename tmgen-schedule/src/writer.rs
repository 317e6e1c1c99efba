// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Serialization of a schedule into the connection-matrix text format.
//!
//! The format, in order:
//!
//! ```text
//! Nodes <N>
//! Connections <C>
//! Triggers <T>
//! <body: flow lines and # comment lines, in emission order>
//! trigger id <t> oneshot      (one line per t in 1..=T)
//! ```
//!
//! Header counts are computed from the in-memory [Schedule], so a single
//! pass suffices. Emission goes through a temporary file in the destination
//! directory which is renamed into place once fully written; an interrupted
//! run never leaves a truncated connection matrix behind.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::schedule::{Entry, Schedule};
use crate::types::{ScheduleError, ScheduleResult};

/// Serialize `schedule` to `writer` in the connection-matrix format.
pub fn serialize<W: Write>(writer: &mut W, schedule: &Schedule) -> io::Result<()> {
    writeln!(writer, "Nodes {}", schedule.node_count())?;
    writeln!(writer, "Connections {}", schedule.connection_count())?;
    writeln!(writer, "Triggers {}", schedule.trigger_count())?;

    for entry in schedule.entries() {
        match entry {
            Entry::Comment(text) => writeln!(writer, "# {text}")?,
            Entry::Flow(flow) => writeln!(writer, "{flow}")?,
        }
    }

    for trigger in 1..=schedule.trigger_count() {
        writeln!(writer, "trigger id {trigger} oneshot")?;
    }

    Ok(())
}

/// Serialize `schedule` to a `String`. Mostly useful for logging and tests.
pub fn to_string(schedule: &Schedule) -> String {
    let mut buffer = Vec::new();
    serialize(&mut buffer, schedule).expect("writing to a Vec should not fail");
    String::from_utf8(buffer).expect("the connection-matrix format is ASCII")
}

/// Write `schedule` to `path` atomically.
pub fn write_file(schedule: &Schedule, path: &Path) -> ScheduleResult<()> {
    let io_error = |source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(directory).map_err(io_error)?;

    let mut writer = BufWriter::new(staged.as_file_mut());
    serialize(&mut writer, schedule).map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    drop(writer);

    staged.persist(path).map_err(|e| io_error(e.error))?;
    log::debug!(
        "wrote {} connections and {} triggers to {}",
        schedule.connection_count(),
        schedule.trigger_count(),
        path.display()
    );
    Ok(())
}
