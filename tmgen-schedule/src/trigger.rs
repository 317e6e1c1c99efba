// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Allocation of oneshot trigger identifiers.
//!
//! A trigger is a one-shot barrier: it fires exactly once, when the flow
//! that names it as its completion event finishes, and at that instant
//! releases every flow gated on it. The allocator only ever moves forward;
//! an ID is never reissued. The declaration section of the output file
//! covers `1..=last_issued` contiguously, even if a strategy left an
//! intermediate ID unused (a synthetic trigger for a degenerate group, for
//! example), so the high-water mark is the only state required.

use crate::types::TriggerId;

/// Issues strictly increasing trigger IDs, starting from 1.
#[derive(Debug, Default)]
pub struct TriggerAllocator {
    last_issued: TriggerId,
}

impl TriggerAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh trigger ID.
    pub fn next(&mut self) -> TriggerId {
        self.last_issued += 1;
        self.last_issued
    }

    /// The highest ID issued so far, or 0 when none have been.
    ///
    /// Because IDs are sequential this is also the number of triggers the
    /// declaration section must contain.
    pub fn last_issued(&self) -> TriggerId {
        self.last_issued
    }
}
