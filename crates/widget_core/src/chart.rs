//! Quarterly contract-hours chart widget and the stacked-bar normalization.
//!
//! Segment heights are scaled against the tallest quarter's total, so a row's
//! three percentages sum to `total_hours / max_total * 100` rather than 100.

use std::{future::Future, sync::Arc};

use serde::Serialize;
use shared::{
    domain::AccountId,
    error::RemoteError,
    protocol::{ContractHoursRequest, QuarterlyStaffingRecord, StaffingResponse},
};
use tracing::{debug, error};

use crate::{LoadState, PendingCall, RemoteCall, RequestSequence, Settlement};

pub type ContractHoursFetch = dyn RemoteCall<ContractHoursRequest, StaffingResponse>;
pub type PendingFetch = PendingCall<ContractHoursRequest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSegment {
    Cna,
    Lpn,
    Rn,
}

impl ChartSegment {
    /// Stacking order, bottom to top.
    pub const ALL: [ChartSegment; 3] = [ChartSegment::Cna, ChartSegment::Lpn, ChartSegment::Rn];

    pub fn label(self) -> &'static str {
        match self {
            ChartSegment::Cna => "CNA",
            ChartSegment::Lpn => "LPN",
            ChartSegment::Rn => "RN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub quarter: String,
    pub cna_hours: f64,
    pub lpn_hours: f64,
    pub rn_hours: f64,
    pub total_hours: f64,
    pub total_label: i64,
    pub cna_pct: f64,
    pub lpn_pct: f64,
    pub rn_pct: f64,
}

impl ChartRow {
    pub fn pct(&self, segment: ChartSegment) -> f64 {
        match segment {
            ChartSegment::Cna => self.cna_pct,
            ChartSegment::Lpn => self.lpn_pct,
            ChartSegment::Rn => self.rn_pct,
        }
    }

    /// Inline style the host binds to the segment element.
    pub fn segment_style(&self, segment: ChartSegment) -> String {
        format!("height: {}%;", self.pct(segment))
    }

    fn totals(record: &QuarterlyStaffingRecord) -> Self {
        let cna_hours = record.cna_hours.unwrap_or(0.0);
        let lpn_hours = record.lpn_hours.unwrap_or(0.0);
        let rn_hours = record.rn_hours.unwrap_or(0.0);
        let total_hours = cna_hours + lpn_hours + rn_hours;

        Self {
            quarter: record.quarter.clone(),
            cna_hours,
            lpn_hours,
            rn_hours,
            total_hours,
            total_label: total_hours.round() as i64,
            cna_pct: 0.0,
            lpn_pct: 0.0,
            rn_pct: 0.0,
        }
    }
}

/// Two-pass transform from raw records to renderable rows. Returns `None` when
/// there is nothing to draw: no records, or every quarter totals zero.
pub fn normalize(records: &[QuarterlyStaffingRecord]) -> Option<Vec<ChartRow>> {
    let mut max_total = 0.0_f64;
    let mut rows: Vec<ChartRow> = records
        .iter()
        .map(|record| {
            let row = ChartRow::totals(record);
            if row.total_hours > max_total {
                max_total = row.total_hours;
            }
            row
        })
        .collect();

    if rows.is_empty() || max_total <= 0.0 {
        return None;
    }

    for row in &mut rows {
        row.cna_pct = row.cna_hours / max_total * 100.0;
        row.lpn_pct = row.lpn_hours / max_total * 100.0;
        row.rn_pct = row.rn_hours / max_total * 100.0;
    }
    Some(rows)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartState {
    pub load_state: LoadState,
    pub account_id: Option<AccountId>,
    pub rows: Vec<ChartRow>,
    pub error: Option<RemoteError>,
}

pub struct ChartAggregator {
    remote: Arc<ContractHoursFetch>,
    state: ChartState,
    sequence: RequestSequence,
}

impl ChartAggregator {
    pub fn new(remote: Arc<ContractHoursFetch>) -> Self {
        Self {
            remote,
            state: ChartState::default(),
            sequence: RequestSequence::default(),
        }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.state.account_id.as_ref()
    }

    pub fn rows(&self) -> &[ChartRow] {
        &self.state.rows
    }

    pub fn has_data(&self) -> bool {
        !self.state.rows.is_empty()
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

    /// Observes the bound identifier. A changed, present identifier issues
    /// exactly one fetch; an unchanged one issues nothing. Losing the
    /// identifier abandons any in-flight fetch and returns to `Idle`.
    pub fn watch(&mut self, account_id: Option<AccountId>) -> Option<PendingFetch> {
        if account_id == self.state.account_id {
            return None;
        }

        let Some(account_id) = account_id else {
            debug!("chart identifier cleared");
            self.sequence.invalidate();
            self.state = ChartState::default();
            return None;
        };

        let seq = self.sequence.next();
        self.state.account_id = Some(account_id.clone());
        self.state.load_state = LoadState::Loading;
        self.state.rows.clear();
        self.state.error = None;

        debug!(seq, account_id = %account_id, "issuing contract hours fetch");
        Some(PendingCall {
            seq,
            request: ContractHoursRequest { account_id },
        })
    }

    pub fn dispatch(
        &self,
        pending: PendingFetch,
    ) -> impl Future<Output = Settlement<StaffingResponse>> + Send + 'static {
        let remote = Arc::clone(&self.remote);
        async move {
            let outcome = remote.call(pending.request).await;
            Settlement {
                seq: pending.seq,
                outcome,
            }
        }
    }

    /// Reduces a settled fetch into chart state. Returns `false` for a stale
    /// settlement, which leaves state untouched.
    pub fn settle(&mut self, settlement: Settlement<StaffingResponse>) -> bool {
        if !self.sequence.is_current(settlement.seq) {
            debug!(
                seq = settlement.seq,
                latest = self.sequence.latest(),
                "dropping stale contract hours result"
            );
            return false;
        }

        match settlement.outcome {
            Err(err) => {
                error!(seq = settlement.seq, error = %err, "contract hours fetch failed");
                self.state.rows = Vec::new();
                self.state.error = Some(err);
                self.state.load_state = LoadState::Error;
            }
            Ok(records) => {
                self.state.error = None;
                match normalize(records.as_deref().unwrap_or_default()) {
                    Some(rows) => {
                        self.state.rows = rows;
                        self.state.load_state = LoadState::Success;
                    }
                    None => {
                        self.state.rows = Vec::new();
                        self.state.load_state = LoadState::Empty;
                    }
                }
            }
        }
        true
    }

    /// Gives up on the fetch issued under `seq`. When it was still current the
    /// binding is dropped as well, so watching the same identifier again
    /// re-fetches.
    pub fn abandon(&mut self, seq: u64) {
        if !self.sequence.is_current(seq) {
            return;
        }
        debug!(seq, "contract hours fetch abandoned before settling");
        self.sequence.invalidate();
        self.state = ChartState::default();
    }

    /// Watches `account_id` and, if that issued a fetch, awaits and settles it.
    /// Dropping the returned future before it completes abandons the fetch.
    pub async fn refresh(&mut self, account_id: Option<AccountId>) {
        let Some(pending) = self.watch(account_id) else {
            return;
        };
        let seq = pending.seq;
        let call = self.dispatch(pending);
        let mut in_flight = InFlightFetch {
            chart: self,
            seq,
            settled: false,
        };
        let settlement = call.await;
        in_flight.settled = true;
        in_flight.chart.settle(settlement);
    }
}

struct InFlightFetch<'a> {
    chart: &'a mut ChartAggregator,
    seq: u64,
    settled: bool,
}

impl Drop for InFlightFetch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.chart.abandon(self.seq);
        }
    }
}

#[cfg(test)]
#[path = "tests/chart_tests.rs"]
mod tests;
