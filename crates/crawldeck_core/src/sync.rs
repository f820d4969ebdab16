//! Tracked-URL table synchronizer.
//!
//! One fetch may be in flight per mounted table. Triggers arriving while a
//! fetch is in flight collapse into a single pending flag, which is turned
//! into exactly one new fetch when the in-flight one completes. Results are
//! matched against the in-flight ticket, so replies from a superseded fetch
//! or from before an unmount are dropped.

use std::time::Duration;

use crawldeck_logging::{deck_debug, deck_trace, deck_warn};

use crate::failure::RequestFailure;
use crate::rows::TrackedUrl;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Fetching,
    Settled,
    Failed,
}

/// What caused a synchronizer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Mount,
    Interval,
    Invalidated,
}

/// Identifies one issued fetch: the mount epoch plus a per-table sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub epoch: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Whether the result was applied to the table.
    pub applied: bool,
    /// A follow-up fetch to issue immediately (a coalesced pending trigger).
    pub next: Option<FetchTicket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSync {
    phase: SyncPhase,
    rows: Vec<TrackedUrl>,
    mounted: bool,
    epoch: u64,
    next_seq: u64,
    in_flight: Option<FetchTicket>,
    pending: bool,
    last_failure: Option<RequestFailure>,
}

impl TableSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn rows(&self) -> &[TrackedUrl] {
        &self.rows
    }

    pub fn row(&self, id: u64) -> Option<&TrackedUrl> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn last_failure(&self) -> Option<&RequestFailure> {
        self.last_failure.as_ref()
    }

    /// Mounts the table view and issues its first fetch. Re-mounting starts
    /// a new epoch, orphaning anything still in flight.
    pub fn mount(&mut self) -> FetchTicket {
        self.mounted = true;
        self.epoch += 1;
        self.in_flight = None;
        self.pending = false;
        deck_debug!("Table mounted (epoch {})", self.epoch);
        self.issue()
    }

    /// Tears the view down. Rows are kept for a later mount to show while it
    /// refetches; in-flight results will be discarded.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        deck_debug!("Table unmounted (epoch {})", self.epoch);
        self.mounted = false;
        self.in_flight = None;
        self.pending = false;
        self.phase = SyncPhase::Idle;
    }

    /// Requests a cycle. Returns the ticket to fetch now, or `None` when the
    /// request was coalesced into the pending flag or the view is unmounted.
    pub fn request(&mut self, trigger: SyncTrigger) -> Option<FetchTicket> {
        if !self.mounted {
            deck_trace!("Ignoring {:?} trigger on unmounted table", trigger);
            return None;
        }
        if self.in_flight.is_some() {
            deck_trace!("Coalescing {:?} trigger into pending fetch", trigger);
            self.pending = true;
            return None;
        }
        Some(self.issue())
    }

    /// Applies the result of `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<TrackedUrl>, RequestFailure>,
    ) -> Completion {
        if !self.mounted || self.in_flight != Some(ticket) {
            deck_debug!("Discarding stale table result {:?}", ticket);
            return Completion {
                applied: false,
                next: None,
            };
        }
        self.in_flight = None;

        match result {
            Ok(mut rows) => {
                rows.sort_by(|a, b| b.id.cmp(&a.id));
                self.rows = rows;
                self.phase = SyncPhase::Settled;
                self.last_failure = None;
            }
            Err(failure) => {
                deck_warn!("Table refresh failed: {}", failure);
                self.phase = SyncPhase::Failed;
                self.last_failure = Some(failure);
            }
        }

        let next = if self.pending {
            self.pending = false;
            Some(self.issue())
        } else {
            None
        };
        Completion {
            applied: true,
            next,
        }
    }

    fn issue(&mut self) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.in_flight = Some(ticket);
        self.phase = SyncPhase::Fetching;
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64) -> TrackedUrl {
        TrackedUrl {
            id,
            url: format!("site{id}.example.com"),
            status: crate::rows::UrlStatus::Queued,
            last_updated: None,
        }
    }

    #[test]
    fn unmounted_table_never_fetches() {
        let mut sync = TableSync::new();
        assert_eq!(sync.request(SyncTrigger::Interval), None);
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[test]
    fn result_from_previous_mount_is_discarded() {
        let mut sync = TableSync::new();
        let first = sync.mount();
        sync.unmount();
        let second = sync.mount();
        assert_ne!(first, second);

        let stale = sync.complete(first, Ok(vec![row(1)]));
        assert!(!stale.applied);
        assert!(sync.rows().is_empty());
        assert!(sync.is_fetching());

        let fresh = sync.complete(second, Ok(vec![row(2)]));
        assert!(fresh.applied);
        assert_eq!(sync.rows().len(), 1);
    }

    #[test]
    fn failure_keeps_previous_rows() {
        let mut sync = TableSync::new();
        let ticket = sync.mount();
        sync.complete(ticket, Ok(vec![row(1), row(3), row(2)]));
        let ids: Vec<_> = sync.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let ticket = sync.request(SyncTrigger::Interval).unwrap();
        let completion = sync.complete(ticket, Err(RequestFailure::Network));
        assert!(completion.applied);
        assert_eq!(sync.phase(), SyncPhase::Failed);
        assert_eq!(sync.rows().len(), 3);
        assert_eq!(sync.last_failure(), Some(&RequestFailure::Network));
    }
}
