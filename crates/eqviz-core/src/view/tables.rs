//! Tabular projections: the summary cards, the item table and the history list.

use chrono::{DateTime, Utc};

use crate::dataset::{DatasetDetail, DatasetId, DatasetSummary};

/// Shown when a dataset carries no uploader name.
pub const UNKNOWN_UPLOADER: &str = "You";

/// Headline aggregates for the selected dataset, formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub name: String,
    pub total_count: u64,
    pub avg_flowrate: String,
    pub avg_pressure: String,
    pub avg_temperature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRow {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: String,
    pub pressure: String,
    pub temperature: String,
}

impl EquipmentRow {
    pub const HEADERS: [&'static str; 5] =
        ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

    pub fn cells(&self) -> [&str; 5] {
        [
            &self.name,
            &self.equipment_type,
            &self.flowrate,
            &self.pressure,
            &self.temperature,
        ]
    }
}

/// One line of the upload history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: DatasetId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub total_count: u64,
    pub avg_flowrate: String,
    /// The entry is the currently selected dataset.
    pub active: bool,
}

fn two_places(value: f64) -> String {
    format!("{value:.2}")
}

pub fn summary_stats(detail: Option<&DatasetDetail>) -> Option<SummaryStats> {
    let detail = detail?;
    Some(SummaryStats {
        name: detail.name.clone(),
        total_count: detail.total_count,
        avg_flowrate: two_places(detail.avg_flowrate),
        avg_pressure: two_places(detail.avg_pressure),
        avg_temperature: two_places(detail.avg_temperature),
    })
}

/// Rows in `equipment_items` order; empty when there is no detail or no items.
pub fn equipment_table(detail: Option<&DatasetDetail>) -> Vec<EquipmentRow> {
    let Some(detail) = detail else {
        return Vec::new();
    };
    detail
        .items()
        .iter()
        .map(|item| EquipmentRow {
            name: item.equipment_name.clone(),
            equipment_type: item.equipment_type.clone(),
            flowrate: item.flowrate.to_string(),
            pressure: item.pressure.to_string(),
            temperature: item.temperature.to_string(),
        })
        .collect()
}

/// History entries in list order, marking the one matching `current`.
pub fn history_entries(
    datasets: &[DatasetSummary],
    current: Option<DatasetId>,
) -> Vec<HistoryEntry> {
    datasets
        .iter()
        .map(|summary| HistoryEntry {
            id: summary.id,
            name: summary.name.clone(),
            uploaded_at: summary.uploaded_at,
            uploaded_by: summary
                .uploaded_by_username
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_UPLOADER.to_string()),
            total_count: summary.total_count,
            avg_flowrate: two_places(summary.avg_flowrate),
            active: current == Some(summary.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EquipmentRecord;
    use chrono::TimeZone;

    fn summary(id: DatasetId, by: Option<&str>) -> DatasetSummary {
        DatasetSummary {
            id,
            name: format!("set-{id}.csv"),
            uploaded_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
            total_count: 4,
            avg_flowrate: 123.456,
            avg_pressure: 5.0,
            avg_temperature: 80.0,
            uploaded_by_username: by.map(str::to_string),
            equipment_types: None,
        }
    }

    #[test]
    fn test_history_keeps_order_and_marks_active() {
        let list = vec![summary(9, Some("alice")), summary(4, None), summary(1, Some(""))];
        let entries = history_entries(&list, Some(4));

        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 4, 1]);
        assert!(!entries[0].active);
        assert!(entries[1].active);
        assert_eq!(entries[0].uploaded_by, "alice");
        assert_eq!(entries[1].uploaded_by, UNKNOWN_UPLOADER);
        assert_eq!(entries[2].uploaded_by, UNKNOWN_UPLOADER);
        assert_eq!(entries[0].avg_flowrate, "123.46");
    }

    #[test]
    fn test_summary_stats_and_table() {
        let mut detail = DatasetDetail {
            id: 3,
            name: "plant.csv".to_string(),
            uploaded_at: Utc::now(),
            total_count: 1,
            avg_flowrate: 10.0,
            avg_pressure: 2.5,
            avg_temperature: 99.999,
            uploaded_by_username: None,
            equipment_types: Default::default(),
            equipment_items: None,
        };
        assert!(equipment_table(Some(&detail)).is_empty());

        detail.equipment_items = Some(vec![EquipmentRecord {
            id: Some(1),
            equipment_name: "HX-1".to_string(),
            equipment_type: "HeatExchanger".to_string(),
            flowrate: 10.0,
            pressure: 2.5,
            temperature: 99.999,
        }]);

        let stats = summary_stats(Some(&detail)).unwrap();
        assert_eq!(stats.avg_pressure, "2.50");
        assert_eq!(stats.avg_temperature, "100.00");

        let rows = equipment_table(Some(&detail));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells()[0], "HX-1");
        assert_eq!(rows[0].pressure, "2.5");

        assert!(summary_stats(None).is_none());
        assert!(equipment_table(None).is_empty());
    }
}
