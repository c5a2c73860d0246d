//! Pure projections of the dataset store for rendering.
//!
//! Every function here is deterministic in its inputs, so re-rendering the
//! same detail yields identical labels, values and colour assignments.

pub mod charts;
pub mod palette;
pub mod tables;

pub use charts::{
    ParameterSeries, ParameterView, Series, TypeDistribution, parameter_series,
    type_distribution,
};
pub use palette::{CATEGORY_PALETTE, Rgba, category_color, category_color_index};
pub use tables::{
    EquipmentRow, HistoryEntry, SummaryStats, UNKNOWN_UPLOADER, equipment_table,
    history_entries, summary_stats,
};
