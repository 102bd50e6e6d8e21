//! Text rendering of widget state for the terminal host.

use std::fmt::Write as _;

use shared::error::RemoteError;
use widget_core::{
    ChartSegment, ChartState, ColumnKind, LoadState, SearchState, RESULT_COLUMNS,
};

const BAR_WIDTH: usize = 40;

fn segment_glyph(segment: ChartSegment) -> char {
    match segment {
        ChartSegment::Cna => '#',
        ChartSegment::Lpn => '=',
        ChartSegment::Rn => '+',
    }
}

pub fn render_search(state: &SearchState) -> String {
    match state.load_state {
        LoadState::Idle => "Enter a radius and search.".to_string(),
        LoadState::Loading => "Searching...".to_string(),
        LoadState::Empty => format!(
            "No facilities found within {} miles.",
            state.radius_miles
        ),
        LoadState::Error => format!("Error: {}", error_text(state.error.as_ref())),
        LoadState::Success => render_results_table(state),
    }
}

fn render_results_table(state: &SearchState) -> String {
    let cells: Vec<Vec<String>> = state
        .results
        .iter()
        .map(|row| RESULT_COLUMNS.iter().map(|column| column.cell(row)).collect())
        .collect();

    let widths: Vec<usize> = RESULT_COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            cells
                .iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(column.label.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = RESULT_COLUMNS
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.label, width = *width))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());

    for row in &cells {
        let line: Vec<String> = RESULT_COLUMNS
            .iter()
            .zip(&widths)
            .zip(row)
            .map(|((column, width), cell)| match column.kind {
                ColumnKind::Number => format!("{:>width$}", cell, width = *width),
                ColumnKind::Text => format!("{:<width$}", cell, width = *width),
            })
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out.trim_end().to_string()
}

pub fn render_chart(state: &ChartState) -> String {
    match state.load_state {
        LoadState::Idle => "No account selected.".to_string(),
        LoadState::Loading => "Loading PBJ contract hours...".to_string(),
        LoadState::Empty => "No PBJ contract hours available.".to_string(),
        LoadState::Error => format!("Error: {}", error_text(state.error.as_ref())),
        LoadState::Success => {
            let quarter_width = state
                .rows
                .iter()
                .map(|row| row.quarter.chars().count())
                .max()
                .unwrap_or_default();

            let mut out = String::new();
            for row in &state.rows {
                let mut bar = String::new();
                for segment in ChartSegment::ALL {
                    let cells = (row.pct(segment) / 100.0 * BAR_WIDTH as f64).round() as usize;
                    bar.extend(std::iter::repeat(segment_glyph(segment)).take(cells));
                }
                let _ = writeln!(
                    out,
                    "{:<qw$}  {:<bw$}  {}",
                    row.quarter,
                    bar,
                    row.total_label,
                    qw = quarter_width,
                    bw = BAR_WIDTH
                );
            }
            let legend: Vec<String> = ChartSegment::ALL
                .iter()
                .map(|segment| format!("{} {}", segment_glyph(*segment), segment.label()))
                .collect();
            let _ = write!(out, "{}", legend.join("  "));
            out
        }
    }
}

fn error_text(error: Option<&RemoteError>) -> String {
    error.map(|err| err.message()).unwrap_or_default()
}
