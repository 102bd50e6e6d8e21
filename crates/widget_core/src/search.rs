//! Radius-bounded facility search widget.

use std::{future::Future, sync::Arc};

use shared::{
    domain::AccountId,
    error::RemoteError,
    protocol::{FacilityResponse, FacilityResult, SearchRequest, DEFAULT_RADIUS_MILES},
};
use tracing::{debug, error};

use crate::{LoadState, PendingCall, RemoteCall, RequestSequence, Settlement};

pub type FacilitySearch = dyn RemoteCall<SearchRequest, FacilityResponse>;
pub type PendingSearch = PendingCall<SearchRequest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

/// Table column the host renders for each [`FacilityResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultColumn {
    pub label: &'static str,
    pub field_name: &'static str,
    pub kind: ColumnKind,
    pub fraction_digits: Option<usize>,
    pub initial_width: Option<u16>,
}

impl ResultColumn {
    pub fn cell(&self, row: &FacilityResult) -> String {
        match self.field_name {
            "name" => row.name.clone(),
            "city" => row.city.clone(),
            "state" => row.state.clone(),
            "distanceMiles" => match (row.distance_miles, self.fraction_digits) {
                (Some(distance), Some(digits)) => format!("{:.*}", digits, distance),
                (Some(distance), None) => distance.to_string(),
                (None, _) => String::new(),
            },
            _ => String::new(),
        }
    }
}

pub const RESULT_COLUMNS: [ResultColumn; 4] = [
    ResultColumn {
        label: "Name",
        field_name: "name",
        kind: ColumnKind::Text,
        fraction_digits: None,
        initial_width: None,
    },
    ResultColumn {
        label: "City",
        field_name: "city",
        kind: ColumnKind::Text,
        fraction_digits: None,
        initial_width: None,
    },
    ResultColumn {
        label: "State",
        field_name: "state",
        kind: ColumnKind::Text,
        fraction_digits: None,
        initial_width: Some(80),
    },
    ResultColumn {
        label: "Distance (mi)",
        field_name: "distanceMiles",
        kind: ColumnKind::Number,
        fraction_digits: Some(1),
        initial_width: Some(130),
    },
];

/// Everything the search widget renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub load_state: LoadState,
    pub radius_miles: f64,
    pub results: Vec<FacilityResult>,
    pub error: Option<RemoteError>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            load_state: LoadState::Idle,
            radius_miles: DEFAULT_RADIUS_MILES,
            results: Vec::new(),
            error: None,
        }
    }
}

/// Parses raw radius input with the same grammar a browser number field
/// accepts: decimal literals, `0x`/`0o`/`0b` integers and `[+-]Infinity`.
/// Blank input and anything else become 0; negative and infinite values are
/// kept.
pub fn parse_radius(raw: &str) -> f64 {
    let trimmed = raw.trim();
    match trimmed {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.starts_with('+') {
            return 0.0;
        }
        return u128::from_str_radix(digits, radix)
            .map(|value| value as f64)
            .unwrap_or(0.0);
    }

    // `f64::from_str` also takes "inf", "infinity" and "nan" in any case.
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

pub struct SearchController {
    remote: Arc<FacilitySearch>,
    account_id: Option<AccountId>,
    state: SearchState,
    sequence: RequestSequence,
}

impl SearchController {
    pub fn new(remote: Arc<FacilitySearch>, account_id: Option<AccountId>) -> Self {
        Self {
            remote,
            account_id,
            state: SearchState::default(),
            sequence: RequestSequence::default(),
        }
    }

    pub fn with_radius(mut self, radius_miles: f64) -> Self {
        self.state.radius_miles = radius_miles;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn radius_miles(&self) -> f64 {
        self.state.radius_miles
    }

    pub fn set_radius(&mut self, raw: &str) {
        self.state.radius_miles = parse_radius(raw);
    }

    pub fn results(&self) -> &[FacilityResult] {
        &self.state.results
    }

    pub fn has_results(&self) -> bool {
        !self.state.results.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.state.load_state.is_loading()
    }

    pub fn show_empty(&self) -> bool {
        self.state.load_state == LoadState::Empty
    }

    pub fn error_message(&self) -> String {
        self.state
            .error
            .as_ref()
            .map(RemoteError::message)
            .unwrap_or_default()
    }

    /// Enters `Loading` and returns the call to issue, or `None` when there is
    /// no record context.
    pub fn begin_search(&mut self) -> Option<PendingSearch> {
        let account_id = self.account_id.clone()?;
        let seq = self.sequence.next();

        self.state.load_state = LoadState::Loading;
        self.state.results.clear();
        self.state.error = None;

        let request = SearchRequest {
            account_id,
            radius_miles: self.state.radius_miles,
        };
        debug!(
            seq,
            account_id = %request.account_id,
            radius_miles = request.radius_miles,
            "issuing facility search"
        );
        Some(PendingCall { seq, request })
    }

    /// Future resolving the remote call for `pending`. It does not borrow the
    /// controller, so hosts can drive it alongside other work.
    pub fn dispatch(
        &self,
        pending: PendingSearch,
    ) -> impl Future<Output = Settlement<FacilityResponse>> + Send + 'static {
        let remote = Arc::clone(&self.remote);
        async move {
            let outcome = remote.call(pending.request).await;
            Settlement {
                seq: pending.seq,
                outcome,
            }
        }
    }

    /// Reduces a settled call into widget state. Returns `false` when the
    /// settlement belongs to a superseded call and was dropped.
    pub fn settle(&mut self, settlement: Settlement<FacilityResponse>) -> bool {
        if !self.sequence.is_current(settlement.seq) {
            debug!(
                seq = settlement.seq,
                latest = self.sequence.latest(),
                "dropping stale facility search result"
            );
            return false;
        }

        match settlement.outcome {
            Ok(Some(results)) if !results.is_empty() => {
                self.state.results = results;
                self.state.error = None;
                self.state.load_state = LoadState::Success;
            }
            Ok(_) => {
                self.state.results = Vec::new();
                self.state.error = None;
                self.state.load_state = LoadState::Empty;
            }
            Err(err) => {
                error!(seq = settlement.seq, error = %err, "error fetching nearby facilities");
                self.state.results = Vec::new();
                self.state.error = Some(err);
                self.state.load_state = LoadState::Error;
            }
        }
        true
    }

    /// Gives up on the call issued under `seq` without a result. Leaves
    /// `Loading` for `Idle` when that call was still the current one.
    pub fn abandon(&mut self, seq: u64) {
        if !self.sequence.is_current(seq) {
            return;
        }
        debug!(seq, "facility search abandoned before settling");
        self.sequence.invalidate();
        self.state.load_state = LoadState::Idle;
    }

    /// Runs one full search: begin, await the remote call, settle. Dropping
    /// the returned future before it completes abandons the call.
    pub async fn trigger_search(&mut self) {
        let Some(pending) = self.begin_search() else {
            return;
        };
        let seq = pending.seq;
        let call = self.dispatch(pending);
        let mut in_flight = InFlightSearch {
            controller: self,
            seq,
            settled: false,
        };
        let settlement = call.await;
        in_flight.settled = true;
        in_flight.controller.settle(settlement);
    }
}

struct InFlightSearch<'a> {
    controller: &'a mut SearchController,
    seq: u64,
    settled: bool,
}

impl Drop for InFlightSearch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.abandon(self.seq);
        }
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
