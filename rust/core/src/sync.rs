// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced, echo-suppressed URL fragment writer.
//!
//! Time is passed in explicitly (milliseconds, as from
//! `performance.now()`), which keeps the writer deterministic in tests and
//! free of any timer dependency.

/// How a fragment reaches the browser history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// New history entry (selection and cut-plane changes).
    Push,
    /// Overwrite the current entry (camera-only changes).
    Replace,
}

impl WriteMode {
    /// `Push` if either side needs a new history entry.
    pub fn merge(self, other: WriteMode) -> WriteMode {
        if self == WriteMode::Push || other == WriteMode::Push {
            WriteMode::Push
        } else {
            WriteMode::Replace
        }
    }
}

/// A fragment that should be written to the location now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWrite {
    pub fragment: String,
    pub mode: WriteMode,
}

#[derive(Debug, Clone)]
struct Pending {
    fragment: String,
    mode: WriteMode,
    due_ms: f64,
}

#[derive(Debug, Clone)]
pub struct FragmentSync {
    debounce_ms: f64,
    last_written: Option<String>,
    pending: Option<Pending>,
}

impl FragmentSync {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: f64::from(debounce_ms),
            last_written: None,
            pending: None,
        }
    }

    /// Queues `fragment`, replacing any pending one, and re-arms the
    /// debounce deadline.
    pub fn schedule(&mut self, fragment: String, mode: WriteMode, now_ms: f64) {
        let mode = match &self.pending {
            Some(pending) => pending.mode.merge(mode),
            None => mode,
        };
        self.pending = Some(Pending {
            fragment,
            mode,
            due_ms: now_ms + self.debounce_ms,
        });
    }

    /// Emits the pending write once its deadline has passed. Writes equal to
    /// the last written fragment are dropped.
    pub fn poll(&mut self, now_ms: f64) -> Option<HistoryWrite> {
        match &self.pending {
            Some(pending) if pending.due_ms <= now_ms => self.flush(),
            _ => None,
        }
    }

    /// Emits the pending write regardless of its deadline.
    pub fn flush(&mut self) -> Option<HistoryWrite> {
        let pending = self.pending.take()?;
        if self.last_written.as_deref() == Some(pending.fragment.as_str()) {
            tracing::debug!(fragment = %pending.fragment, "fragment unchanged, skipping history write");
            return None;
        }
        tracing::debug!(fragment = %pending.fragment, mode = ?pending.mode, "writing fragment");
        self.last_written = Some(pending.fragment.clone());
        Some(HistoryWrite {
            fragment: pending.fragment,
            mode: pending.mode,
        })
    }

    /// Records a fragment that came in through navigation. It counts as
    /// written, and any pending write made obsolete by it is dropped.
    pub fn acknowledge(&mut self, fragment: &str) {
        self.last_written = Some(fragment.to_owned());
        self.pending = None;
    }

    /// `true` when a navigation to `fragment` is the echo of our own write.
    pub fn is_echo(&self, fragment: &str) -> bool {
        self.last_written.as_deref() == Some(fragment)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    /// Forgets pending and written state.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_written = None;
    }
}

impl Default for FragmentSync {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FRAGMENT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_debounce() {
        let mut sync = FragmentSync::new(250);
        sync.schedule("i:1,3".into(), WriteMode::Push, 0.0);
        assert_eq!(sync.poll(100.0), None);
        assert!(sync.has_pending());
        let write = sync.poll(250.0).unwrap();
        assert_eq!(write.fragment, "i:1,3");
        assert_eq!(write.mode, WriteMode::Push);
        assert!(!sync.has_pending());
    }

    #[test]
    fn rescheduling_rearms_deadline_and_keeps_latest() {
        let mut sync = FragmentSync::new(250);
        sync.schedule("i:1".into(), WriteMode::Push, 0.0);
        sync.schedule("i:1,2".into(), WriteMode::Push, 200.0);
        assert_eq!(sync.poll(300.0), None);
        assert_eq!(sync.poll(450.0).unwrap().fragment, "i:1,2");
    }

    #[test]
    fn push_wins_when_merged() {
        let mut sync = FragmentSync::new(0);
        sync.schedule("i:1".into(), WriteMode::Push, 0.0);
        sync.schedule("c:1,2,3,4,5,6,true::i:1".into(), WriteMode::Replace, 0.0);
        assert_eq!(sync.poll(0.0).unwrap().mode, WriteMode::Push);

        sync.schedule("c:0,0,1,0,0,0,true::i:1".into(), WriteMode::Replace, 1.0);
        assert_eq!(sync.poll(1.0).unwrap().mode, WriteMode::Replace);
    }

    #[test]
    fn identical_fragment_is_not_rewritten() {
        let mut sync = FragmentSync::new(0);
        sync.schedule("i:1".into(), WriteMode::Push, 0.0);
        assert!(sync.flush().is_some());
        sync.schedule("i:1".into(), WriteMode::Push, 1.0);
        assert_eq!(sync.flush(), None);
    }

    #[test]
    fn acknowledged_fragments_are_echoes() {
        let mut sync = FragmentSync::new(0);
        sync.schedule("i:9".into(), WriteMode::Push, 0.0);
        sync.acknowledge("i:1,3");
        assert!(!sync.has_pending());
        assert!(sync.is_echo("i:1,3"));
        assert!(!sync.is_echo("i:1"));

        sync.schedule("i:1,3".into(), WriteMode::Push, 0.0);
        assert_eq!(sync.poll(0.0), None);
    }
}
