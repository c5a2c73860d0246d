//! In-memory store for the dataset list and the currently selected detail.

use chrono::{DateTime, Utc};

use super::model::{DatasetDetail, DatasetId, DatasetSummary};

/// Monotonically increasing id attached to every fetch issued against the store.
pub type RequestId = u64;

/// Handle for an in-flight list refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListTicket(RequestId);

impl ListTicket {
    pub fn id(&self) -> RequestId {
        self.0
    }
}

/// Handle for an in-flight detail fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DetailTicket(RequestId);

impl DetailTicket {
    pub fn id(&self) -> RequestId {
        self.0
    }
}

/// Outcome of applying a list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListApply {
    /// The list was replaced. `auto_select` names the entry whose detail
    /// should be fetched because nothing is selected yet.
    Applied { auto_select: Option<DatasetId> },
    /// A newer response was already applied; the list was left untouched.
    Stale,
}

/// Outcome of applying a detail response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailApply {
    Applied,
    /// A newer selection (or an upload result) replaced this request.
    Superseded,
}

/// Single source of truth for what the user is looking at.
///
/// The list and the current detail are written by disjoint operations, so
/// a background list refresh never overwrites a user's selection. Both are
/// guarded by request ids: a response is applied only when it is not older
/// than what the store already shows.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    datasets: Vec<DatasetSummary>,
    current: Option<DatasetDetail>,
    last_update: Option<DateTime<Utc>>,
    list_issued: RequestId,
    list_applied: RequestId,
    detail_issued: RequestId,
    detail_pending: Option<RequestId>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summaries in service order.
    pub fn datasets(&self) -> &[DatasetSummary] {
        &self.datasets
    }

    pub fn current(&self) -> Option<&DatasetDetail> {
        self.current.as_ref()
    }

    /// Time of the last applied list refresh.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Returns `true` if `id` is the currently selected dataset.
    pub fn is_selected(&self, id: DatasetId) -> bool {
        self.current.as_ref().is_some_and(|d| d.id == id)
    }

    /// Returns `true` while a detail fetch is outstanding.
    pub fn detail_in_flight(&self) -> bool {
        self.detail_pending.is_some()
    }

    /// Id of the most recently applied list response (0 if none).
    pub fn last_applied_list_request(&self) -> RequestId {
        self.list_applied
    }

    /// Registers a new list refresh and returns its ticket.
    pub fn begin_list_request(&mut self) -> ListTicket {
        self.list_issued += 1;
        ListTicket(self.list_issued)
    }

    /// Replaces the list wholesale if `ticket` is newer than the last applied one.
    pub fn apply_list(
        &mut self,
        ticket: ListTicket,
        datasets: Vec<DatasetSummary>,
        received_at: DateTime<Utc>,
    ) -> ListApply {
        if ticket.0 <= self.list_applied {
            return ListApply::Stale;
        }

        self.list_applied = ticket.0;
        self.datasets = datasets;
        self.last_update = Some(received_at);

        let auto_select = if self.current.is_none() && self.detail_pending.is_none() {
            self.datasets.first().map(|d| d.id)
        } else {
            None
        };

        ListApply::Applied { auto_select }
    }

    /// Registers a new detail fetch. Any older outstanding fetch is superseded.
    pub fn begin_detail_request(&mut self) -> DetailTicket {
        self.detail_issued += 1;
        self.detail_pending = Some(self.detail_issued);
        DetailTicket(self.detail_issued)
    }

    /// Sets `detail` as current if `ticket` is the latest detail request.
    pub fn apply_detail(&mut self, ticket: DetailTicket, detail: DatasetDetail) -> DetailApply {
        if self.detail_pending != Some(ticket.0) {
            return DetailApply::Superseded;
        }
        self.detail_pending = None;
        self.current = Some(detail);
        DetailApply::Applied
    }

    /// Marks a failed detail fetch as finished without touching the current detail.
    pub fn abandon_detail(&mut self, ticket: DetailTicket) {
        if self.detail_pending == Some(ticket.0) {
            self.detail_pending = None;
        }
    }

    /// Sets the current detail unconditionally, superseding in-flight fetches.
    pub fn set_current(&mut self, detail: DatasetDetail) {
        self.detail_issued += 1;
        self.detail_pending = None;
        self.current = Some(detail);
    }

    /// Drops all data. Responses to requests issued before the clear are
    /// treated as stale.
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.current = None;
        self.last_update = None;
        self.list_applied = self.list_issued;
        self.detail_issued += 1;
        self.detail_pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::model::DatasetDetail;

    fn summary(id: DatasetId) -> DatasetSummary {
        DatasetSummary {
            id,
            name: format!("data-{id}.csv"),
            uploaded_at: Utc::now(),
            total_count: 1,
            avg_flowrate: 1.0,
            avg_pressure: 2.0,
            avg_temperature: 3.0,
            uploaded_by_username: None,
            equipment_types: None,
        }
    }

    fn detail(id: DatasetId) -> DatasetDetail {
        DatasetDetail {
            id,
            name: format!("data-{id}.csv"),
            uploaded_at: Utc::now(),
            total_count: 0,
            avg_flowrate: 0.0,
            avg_pressure: 0.0,
            avg_temperature: 0.0,
            uploaded_by_username: None,
            equipment_types: Default::default(),
            equipment_items: Some(vec![]),
        }
    }

    #[test]
    fn test_first_list_requests_auto_select() {
        let mut store = DatasetStore::new();
        let ticket = store.begin_list_request();

        let outcome = store.apply_list(ticket, vec![summary(3), summary(2)], Utc::now());

        assert_eq!(outcome, ListApply::Applied { auto_select: Some(3) });
        assert_eq!(store.datasets().len(), 2);
        assert!(store.last_update().is_some());
    }

    #[test]
    fn test_no_auto_select_when_detail_current() {
        let mut store = DatasetStore::new();
        store.set_current(detail(1));

        let ticket = store.begin_list_request();
        let outcome = store.apply_list(ticket, vec![summary(3)], Utc::now());

        assert_eq!(outcome, ListApply::Applied { auto_select: None });
    }

    #[test]
    fn test_no_auto_select_while_detail_in_flight() {
        let mut store = DatasetStore::new();
        let _pending = store.begin_detail_request();

        let ticket = store.begin_list_request();
        let outcome = store.apply_list(ticket, vec![summary(3)], Utc::now());

        assert_eq!(outcome, ListApply::Applied { auto_select: None });
    }

    #[test]
    fn test_older_list_response_is_discarded() {
        let mut store = DatasetStore::new();
        let first = store.begin_list_request();
        let second = store.begin_list_request();

        // Second response arrives first.
        store.apply_list(second, vec![summary(2), summary(1)], Utc::now());
        let outcome = store.apply_list(first, vec![summary(1)], Utc::now());

        assert_eq!(outcome, ListApply::Stale);
        let ids: Vec<DatasetId> = store.datasets().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(store.last_applied_list_request(), second.id());
    }

    #[test]
    fn test_list_order_is_preserved() {
        let mut store = DatasetStore::new();
        let ticket = store.begin_list_request();
        store.apply_list(ticket, vec![summary(5), summary(9), summary(1)], Utc::now());

        let ids: Vec<DatasetId> = store.datasets().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![5, 9, 1]);
    }

    #[test]
    fn test_latest_detail_request_wins() {
        let mut store = DatasetStore::new();
        let first = store.begin_detail_request();
        let second = store.begin_detail_request();

        assert_eq!(store.apply_detail(second, detail(2)), DetailApply::Applied);
        assert_eq!(store.apply_detail(first, detail(1)), DetailApply::Superseded);
        assert!(store.is_selected(2));
        assert!(!store.detail_in_flight());
    }

    #[test]
    fn test_set_current_supersedes_in_flight_detail() {
        let mut store = DatasetStore::new();
        let pending = store.begin_detail_request();

        store.set_current(detail(10));

        assert_eq!(store.apply_detail(pending, detail(1)), DetailApply::Superseded);
        assert!(store.is_selected(10));
    }

    #[test]
    fn test_abandon_detail_keeps_current() {
        let mut store = DatasetStore::new();
        store.set_current(detail(4));
        let ticket = store.begin_detail_request();

        store.abandon_detail(ticket);

        assert!(store.is_selected(4));
        assert!(!store.detail_in_flight());
    }

    #[test]
    fn test_clear_discards_in_flight_responses() {
        let mut store = DatasetStore::new();
        let list = store.begin_list_request();
        let detail_ticket = store.begin_detail_request();

        store.clear();

        assert_eq!(store.apply_list(list, vec![summary(1)], Utc::now()), ListApply::Stale);
        assert_eq!(
            store.apply_detail(detail_ticket, detail(1)),
            DetailApply::Superseded
        );
        assert!(store.datasets().is_empty());
        assert!(store.current().is_none());
        assert!(store.last_update().is_none());
    }
}
