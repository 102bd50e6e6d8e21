use async_trait::async_trait;
use shared::error::RemoteError;

pub mod chart;
pub mod config;
pub mod http;
pub mod search;

pub use chart::{normalize, ChartAggregator, ChartRow, ChartSegment, ChartState};
pub use search::{ColumnKind, ResultColumn, SearchController, SearchState, RESULT_COLUMNS};

/// An asynchronous, fallible request/response unit against a backend service.
#[async_trait]
pub trait RemoteCall<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req) -> Result<Resp, RemoteError>;
}

/// Discrete rendering mode of a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

impl LoadState {
    pub fn is_loading(self) -> bool {
        self == LoadState::Loading
    }
}

/// A call issued by a widget that has not settled yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall<Req> {
    pub seq: u64,
    pub request: Req,
}

/// Outcome of a [`PendingCall`], tagged with the sequence it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement<Resp> {
    pub seq: u64,
    pub outcome: Result<Resp, RemoteError>,
}

/// Monotonic per-widget request counter. Only the most recently issued
/// sequence may settle into widget state.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Makes every outstanding sequence stale without issuing a new call.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_only_accepts_latest() {
        let mut sequence = RequestSequence::default();
        let first = sequence.next();
        let second = sequence.next();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));

        sequence.invalidate();
        assert!(!sequence.is_current(second));
    }

    #[test]
    fn only_loading_is_loading() {
        assert!(LoadState::Loading.is_loading());
        assert!(!LoadState::Idle.is_loading());
        assert!(!LoadState::Error.is_loading());
        assert_eq!(LoadState::default(), LoadState::Idle);
    }
}
