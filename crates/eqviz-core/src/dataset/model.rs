//! Dataset domain models as returned by the analysis service.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a dataset by the service.
pub type DatasetId = i64;

/// Count of equipment items per equipment type, in the service's key order.
pub type EquipmentTypeCounts = IndexMap<String, u64>;

/// Lightweight metadata about one uploaded dataset, used in the history list.
///
/// Summaries are immutable snapshots; the list they come in is ordered by
/// the service (most recent first) and must never be re-sorted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by_username: Option<String>,
    /// The list endpoint also reports the type distribution; it is optional here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_types: Option<EquipmentTypeCounts>,
}

/// One row of an uploaded CSV file.
///
/// The position of a record inside [`DatasetDetail::equipment_items`] is the
/// join key for every per-item series derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub equipment_name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Full per-item data and aggregates for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetail {
    pub id: DatasetId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by_username: Option<String>,
    #[serde(default)]
    pub equipment_types: EquipmentTypeCounts,
    /// `None` when the service omitted the field entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_items: Option<Vec<EquipmentRecord>>,
}

impl DatasetDetail {
    /// Returns the summary view of this detail.
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            name: self.name.clone(),
            uploaded_at: self.uploaded_at,
            total_count: self.total_count,
            avg_flowrate: self.avg_flowrate,
            avg_pressure: self.avg_pressure,
            avg_temperature: self.avg_temperature,
            uploaded_by_username: self.uploaded_by_username.clone(),
            equipment_types: Some(self.equipment_types.clone()),
        }
    }

    /// Items in service order; empty when the field was absent.
    pub fn items(&self) -> &[EquipmentRecord] {
        self.equipment_items.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_JSON: &str = r#"{
        "id": 7,
        "name": "sample_equipment_data.csv",
        "uploaded_at": "2025-01-15T10:30:00Z",
        "uploaded_by_username": "alice",
        "total_count": 3,
        "avg_flowrate": 120.5,
        "avg_pressure": 5.25,
        "avg_temperature": 80.0,
        "equipment_types": {"Valve": 1, "Pump": 2},
        "equipment_items": [
            {"id": 1, "equipment_name": "Pump-1", "equipment_type": "Pump", "flowrate": 100.0, "pressure": 5.0, "temperature": 70.0},
            {"id": 2, "equipment_name": "Pump-2", "equipment_type": "Pump", "flowrate": 150.0, "pressure": 6.0, "temperature": 90.0},
            {"id": 3, "equipment_name": "Valve-1", "equipment_type": "Valve", "flowrate": 111.5, "pressure": 4.75, "temperature": 80.0}
        ]
    }"#;

    #[test]
    fn test_detail_preserves_type_key_order() {
        let detail: DatasetDetail = serde_json::from_str(DETAIL_JSON).unwrap();

        let keys: Vec<&str> = detail.equipment_types.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Valve", "Pump"]);
        assert_eq!(detail.items().len(), 3);
        assert_eq!(detail.items()[2].equipment_name, "Valve-1");
    }

    #[test]
    fn test_summary_without_uploader() {
        let json = r#"{
            "id": 1,
            "name": "a.csv",
            "uploaded_at": "2025-01-15T10:30:00.123456Z",
            "total_count": 0,
            "avg_flowrate": 0.0,
            "avg_pressure": 0.0,
            "avg_temperature": 0.0
        }"#;
        let summary: DatasetSummary = serde_json::from_str(json).unwrap();
        assert!(summary.uploaded_by_username.is_none());
        assert!(summary.equipment_types.is_none());
    }

    #[test]
    fn test_detail_without_items_field() {
        let json = r#"{
            "id": 2,
            "name": "b.csv",
            "uploaded_at": "2025-01-15T10:30:00Z",
            "total_count": 0,
            "avg_flowrate": 0.0,
            "avg_pressure": 0.0,
            "avg_temperature": 0.0,
            "equipment_types": {}
        }"#;
        let detail: DatasetDetail = serde_json::from_str(json).unwrap();
        assert!(detail.equipment_items.is_none());
        assert!(detail.items().is_empty());
        assert_eq!(detail.summary().id, 2);
    }
}
