//! Chart projections of a dataset detail.

use crate::dataset::DatasetDetail;

use super::palette::{
    FLOWRATE_COLOR, PRESSURE_COLOR, Rgba, TEMPERATURE_COLOR, category_color,
    category_color_index,
};

/// Equipment type counts, backing both the proportion chart and the count chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDistribution {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    /// Palette slot per label, by position.
    pub color_indices: Vec<usize>,
}

impl TypeDistribution {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    pub fn colors(&self) -> Vec<Rgba> {
        (0..self.labels.len()).map(category_color).collect()
    }

    /// Percentage share of the category at `position`, or `None` when out of range.
    pub fn share(&self, position: usize) -> Option<f64> {
        let value = *self.values.get(position)?;
        let total = self.total();
        if total == 0 {
            return Some(0.0);
        }
        Some(value as f64 * 100.0 / total as f64)
    }
}

/// One named per-item series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub values: Vec<f64>,
    pub color: Rgba,
}

/// Flowrate, pressure and temperature, index-aligned with `labels` and with
/// the detail's `equipment_items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSeries {
    pub labels: Vec<String>,
    pub flowrate: Series,
    pub pressure: Series,
    pub temperature: Series,
}

impl ParameterSeries {
    pub fn series(&self) -> [&Series; 3] {
        [&self.flowrate, &self.pressure, &self.temperature]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Result of [`parameter_series`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterView {
    /// No dataset is selected.
    NoData,
    /// A dataset is selected but has no equipment items.
    NoSeries,
    Ready(ParameterSeries),
}

impl ParameterView {
    pub fn ready(&self) -> Option<&ParameterSeries> {
        match self {
            ParameterView::Ready(series) => Some(series),
            _ => None,
        }
    }
}

/// Labels and counts of `equipment_types` in the map's own order.
///
/// Returns `None` when no detail is selected.
pub fn type_distribution(detail: Option<&DatasetDetail>) -> Option<TypeDistribution> {
    let detail = detail?;
    let labels: Vec<String> = detail.equipment_types.keys().cloned().collect();
    let values: Vec<u64> = detail.equipment_types.values().copied().collect();
    let color_indices = (0..labels.len()).map(category_color_index).collect();

    Some(TypeDistribution {
        labels,
        values,
        color_indices,
    })
}

/// Per-item parameter series in `equipment_items` order.
pub fn parameter_series(detail: Option<&DatasetDetail>) -> ParameterView {
    let Some(detail) = detail else {
        return ParameterView::NoData;
    };
    let items = match detail.equipment_items.as_deref() {
        Some(items) if !items.is_empty() => items,
        _ => return ParameterView::NoSeries,
    };

    let labels = items.iter().map(|i| i.equipment_name.clone()).collect();
    let column = |f: fn(&crate::dataset::EquipmentRecord) -> f64| -> Vec<f64> {
        items.iter().map(f).collect()
    };

    ParameterView::Ready(ParameterSeries {
        labels,
        flowrate: Series {
            name: "Flowrate",
            values: column(|i| i.flowrate),
            color: FLOWRATE_COLOR,
        },
        pressure: Series {
            name: "Pressure",
            values: column(|i| i.pressure),
            color: PRESSURE_COLOR,
        },
        temperature: Series {
            name: "Temperature",
            values: column(|i| i.temperature),
            color: TEMPERATURE_COLOR,
        },
    })
}
