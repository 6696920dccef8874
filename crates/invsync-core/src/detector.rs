//! Poll-cycle change detection
//!
//! Polling an inventory on a short cadence mostly returns the same
//! data. The detector keeps the previous cycle's sorted messages and
//! skips reprocessing when nothing changed, but only up to a bounded
//! horizon of consecutive identical cycles, after which the cycle is
//! reprocessed unconditionally so a comparison bug can never suppress
//! updates forever.

/// Consecutive identical cycles after which a cycle is reprocessed
/// even when its messages match the previous poll.
pub const STALE_HORIZON: u32 = 360;

/// Sorted-fingerprint change detector.
///
/// Single-writer: only the poll loop touches it, so it carries no lock.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    /// Sorted messages of the most recent poll, `None` before the first
    last: Option<Vec<String>>,
    /// Consecutive cycles judged identical
    stale_cycles: u32,
}

impl ChangeDetector {
    /// Create a detector with no prior observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one poll cycle's raw messages and decide whether the
    /// cycle must be reprocessed.
    ///
    /// Returns `true` ("changed") when the sorted messages differ from
    /// the previous cycle, on the first cycle, or when the staleness
    /// horizon has been reached. Returns `false` ("unchanged") when
    /// the comparison ran and matched.
    ///
    /// The stored fingerprint is replaced on every call, changed or not.
    pub fn observe(&mut self, messages: &[String]) -> bool {
        let mut sorted = messages.to_vec();
        sorted.sort_unstable();

        let unchanged =
            self.stale_cycles < STALE_HORIZON && self.last.as_deref() == Some(sorted.as_slice());

        self.last = Some(sorted);
        if unchanged {
            self.stale_cycles += 1;
            false
        } else {
            self.stale_cycles = 0;
            true
        }
    }

    /// Number of consecutive cycles judged identical.
    pub fn stale_cycles(&self) -> u32 {
        self.stale_cycles
    }
}
