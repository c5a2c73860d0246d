//! Terminal rendering of the view projections.

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};

use eqviz_application::ClientSnapshot;
use eqviz_core::dataset::DatasetDetail;
use eqviz_core::event::{ClientEvent, SchedulerState};
use eqviz_core::session::EndReason;
use eqviz_core::upload::{UploadPhase, UploadState};
use eqviz_core::view::{
    EquipmentRow, ParameterView, Rgba, equipment_table, history_entries, parameter_series,
    summary_stats, type_distribution,
};

const BAR_WIDTH: usize = 30;

fn paint(text: &str, color: Rgba) -> ColoredString {
    text.truecolor(color.r, color.g, color.b)
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn history(snapshot: &ClientSnapshot) {
    let current = snapshot.current.as_ref().map(|d| d.id);
    let entries = history_entries(&snapshot.datasets, current);
    if entries.is_empty() {
        println!("{}", "No uploads yet. Use /file and /upload to add one.".bright_black());
        return;
    }

    println!("{}", "Upload history".bright_magenta().bold());
    for entry in entries {
        let marker = if entry.active { "*" } else { " " };
        let line = format!(
            "{marker} #{:<5} {:<32} {:>6} items  avg flow {:>10}  {} by {}",
            entry.id,
            entry.name,
            entry.total_count,
            entry.avg_flowrate,
            local_time(entry.uploaded_at),
            entry.uploaded_by,
        );
        if entry.active {
            println!("{}", line.bright_green());
        } else {
            println!("{line}");
        }
    }
    if let Some(at) = snapshot.last_update {
        println!("{}", format!("Last update: {}", local_time(at)).bright_black());
    }
}

pub fn detail(detail: Option<&DatasetDetail>) {
    let Some(stats) = summary_stats(detail) else {
        println!("{}", "No dataset selected. Use /select <id>.".bright_black());
        return;
    };

    println!("{}", stats.name.bright_magenta().bold());
    println!("  Total equipment   {}", stats.total_count);
    println!("  Avg flowrate      {}", stats.avg_flowrate);
    println!("  Avg pressure      {}", stats.avg_pressure);
    println!("  Avg temperature   {}", stats.avg_temperature);
    println!();

    let rows = equipment_table(detail);
    if rows.is_empty() {
        println!("{}", "No equipment items.".bright_black());
        return;
    }

    let mut widths = EquipmentRow::HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.len());
        }
    }

    let header: Vec<String> = EquipmentRow::HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    println!("{}", header.join("  ").bold());
    for row in &rows {
        let cells: Vec<String> = row
            .cells()
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        println!("{}", cells.join("  "));
    }
}

pub fn charts(detail: Option<&DatasetDetail>) {
    let Some(dist) = type_distribution(detail) else {
        println!("{}", "No dataset selected.".bright_black());
        return;
    };

    println!("{}", "Equipment type distribution".bright_magenta().bold());
    let max = dist.values.iter().copied().max().unwrap_or(0).max(1);
    let label_width = dist.labels.iter().map(String::len).max().unwrap_or(0);
    for ((pos, label), color) in dist.labels.iter().enumerate().zip(dist.colors()) {
        let value = dist.values[pos];
        let len = (value as usize * BAR_WIDTH).div_ceil(max as usize);
        let share = dist.share(pos).unwrap_or(0.0);
        println!(
            "  {label:<label_width$}  {} {value} ({share:.1}%)",
            paint(&"█".repeat(len), color)
        );
    }
    println!();

    match parameter_series(detail) {
        ParameterView::NoData => {}
        ParameterView::NoSeries => {
            println!("{}", "No equipment items to chart.".bright_black());
        }
        ParameterView::Ready(series) => {
            println!("{}", "Parameters per item".bright_magenta().bold());
            let legend: Vec<String> = series
                .series()
                .iter()
                .map(|s| paint(s.name, s.color).to_string())
                .collect();
            println!("  {}", legend.join("  "));

            let label_width = series.labels.iter().map(String::len).max().unwrap_or(0);
            for (i, label) in series.labels.iter().enumerate() {
                let values: Vec<String> = series
                    .series()
                    .iter()
                    .map(|s| paint(&format!("{:>10}", s.values[i]), s.color).to_string())
                    .collect();
                println!("  {label:<label_width$}{}", values.join(""));
            }
        }
    }
}

pub fn status(snapshot: &ClientSnapshot) {
    match &snapshot.username {
        Some(name) => println!("User:          {}", name.bright_green()),
        None => println!("User:          {}", "not logged in".bright_black()),
    }
    println!("Datasets:      {}", snapshot.datasets.len());
    match &snapshot.current {
        Some(detail) => println!("Selected:      #{} {}", detail.id, detail.name),
        None => println!("Selected:      -"),
    }
    match snapshot.last_update {
        Some(at) => println!("Last update:   {}", local_time(at)),
        None => println!("Last update:   -"),
    }
    let timer = match snapshot.scheduler {
        SchedulerState::Running => "running".green(),
        SchedulerState::Stopped => "stopped".bright_black(),
    };
    let auto = if snapshot.auto_refresh { "on" } else { "off" };
    println!("Auto-refresh:  {auto} ({timer})");
    println!("Upload:        {}", upload(&snapshot.upload));
}

fn upload(state: &UploadState) -> String {
    match state {
        UploadState::Idle => "idle".to_string(),
        UploadState::FileSelected(file) => format!("{} selected", file.file_name),
        UploadState::Uploading => "uploading".to_string(),
        UploadState::Succeeded(detail) => format!("uploaded {}", detail.name),
        UploadState::Failed(message) => format!("failed: {message}"),
    }
}

/// Prints an event published by the client. List refreshes are only shown
/// when the number of datasets changes.
pub fn event(event: &ClientEvent, last_count: &mut Option<usize>) {
    match event {
        ClientEvent::SessionStarted { username } => {
            println!("{}", format!("Logged in as {username}").bright_green());
        }
        ClientEvent::SessionEnded { reason } => match reason {
            EndReason::Logout => println!("{}", "Logged out".bright_black()),
            EndReason::Expired => {
                println!("{}", "Session expired. Please log in again.".red());
            }
            EndReason::Replaced => {
                println!("{}", "Previous session replaced".bright_black());
            }
        },
        ClientEvent::ListRefreshed { count, .. } => {
            if *last_count != Some(*count) {
                println!("{}", format!("{count} dataset(s) available").bright_blue());
            }
            *last_count = Some(*count);
        }
        ClientEvent::DetailSelected { id } => {
            println!("{}", format!("Dataset #{id} selected").bright_blue());
        }
        ClientEvent::SyncFailed { message } => {
            println!("{}", format!("Refresh failed: {message}").yellow());
        }
        ClientEvent::SchedulerChanged { state } => {
            let text = match state {
                SchedulerState::Running => "Auto-refresh running",
                SchedulerState::Stopped => "Auto-refresh stopped",
            };
            println!("{}", text.bright_black());
        }
        ClientEvent::UploadChanged { phase } => {
            if *phase == UploadPhase::Uploading {
                println!("{}", "Uploading...".bright_black());
            }
        }
        ClientEvent::ReportSaved { path } => {
            println!("{}", format!("Report saved to {}", path.display()).bright_green());
        }
    }
}
