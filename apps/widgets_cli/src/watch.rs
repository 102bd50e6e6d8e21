//! Account watcher: feeds identifiers read line by line into the chart widget.

use std::io::Write;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt, OptionFuture};
use shared::{domain::AccountId, protocol::StaffingResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;
use widget_core::{ChartAggregator, Settlement};

use crate::render::render_chart;

/// Runs until `input` is exhausted. A changed identifier supersedes the
/// in-flight fetch by dropping its future; a blank line clears the binding.
pub async fn run_watch<R, W>(chart: &mut ChartAggregator, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut in_flight: Option<BoxFuture<'static, Settlement<StaffingResponse>>> = None;

    loop {
        tokio::select! {
            biased;

            Some(settlement) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                in_flight = None;
                if chart.settle(settlement) {
                    writeln!(out, "{}", render_chart(chart.state()))?;
                }
            }
            line = lines.next_line() => {
                let Some(raw) = line.context("failed to read account id")? else {
                    break;
                };
                let account_id = AccountId::parse_optional(&raw);
                let cleared = account_id.is_none() && chart.account_id().is_some();

                if let Some(pending) = chart.watch(account_id) {
                    if in_flight.is_some() {
                        debug!(seq = pending.seq, "superseding in-flight contract hours fetch");
                    }
                    writeln!(out, "{}", render_chart(chart.state()))?;
                    in_flight = Some(chart.dispatch(pending).boxed());
                } else if cleared {
                    in_flight = None;
                    writeln!(out, "{}", render_chart(chart.state()))?;
                }
            }
        }
    }

    if let Some(pending) = in_flight.take() {
        let settlement = pending.await;
        if chart.settle(settlement) {
            writeln!(out, "{}", render_chart(chart.state()))?;
        }
    }
    Ok(())
}
