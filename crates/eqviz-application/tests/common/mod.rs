#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use eqviz_application::ClientSession;
use eqviz_core::api::{AnalysisApi, AuthResponse, UploadFile};
use eqviz_core::config::ClientConfig;
use eqviz_core::dataset::{
    DatasetDetail, DatasetId, DatasetSummary, EquipmentRecord, EquipmentTypeCounts,
};
use eqviz_core::error::{ClientError, Result};
use eqviz_core::session::Credentials;
use eqviz_infrastructure::InMemoryCredentialRepository;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn summary(id: DatasetId) -> DatasetSummary {
    DatasetSummary {
        id,
        name: format!("dataset_{id}.csv"),
        uploaded_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, id as u32 % 60).unwrap(),
        total_count: 3,
        avg_flowrate: 100.0 + id as f64,
        avg_pressure: 5.0,
        avg_temperature: 80.0,
        uploaded_by_username: Some("alice".to_string()),
        equipment_types: None,
    }
}

pub fn detail(id: DatasetId) -> DatasetDetail {
    let mut equipment_types = EquipmentTypeCounts::new();
    equipment_types.insert("Pump".to_string(), 2);
    equipment_types.insert("Valve".to_string(), 1);

    let item = |name: &str, kind: &str, flowrate: f64| EquipmentRecord {
        id: None,
        equipment_name: name.to_string(),
        equipment_type: kind.to_string(),
        flowrate,
        pressure: 5.0,
        temperature: 80.0,
    };

    DatasetDetail {
        id,
        name: format!("dataset_{id}.csv"),
        uploaded_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
        total_count: 3,
        avg_flowrate: 100.0,
        avg_pressure: 5.0,
        avg_temperature: 80.0,
        uploaded_by_username: Some("alice".to_string()),
        equipment_types,
        equipment_items: Some(vec![
            item("P-1", "Pump", 90.0),
            item("P-2", "Pump", 110.0),
            item("V-1", "Valve", 100.0),
        ]),
    }
}

/// A list response that arrives after `delay`.
pub struct Scripted {
    pub delay: Duration,
    pub result: Result<Vec<DatasetSummary>>,
}

/// In-memory stand-in for the analysis service.
pub struct MockApi {
    pub tokens: Mutex<HashMap<String, String>>,
    pub datasets: Mutex<Vec<DatasetSummary>>,
    pub list_script: Mutex<VecDeque<Scripted>>,
    pub login_error: Mutex<Option<ClientError>>,
    pub upload_result: Mutex<Option<Result<DatasetDetail>>>,
    pub report: Vec<u8>,
    pub fail_lists: AtomicBool,
    pub reject_tokens: AtomicBool,
    pub auth_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tokens: Mutex::new(HashMap::from([("alice".to_string(), "T1".to_string())])),
            datasets: Mutex::new(vec![summary(3), summary(2), summary(1)]),
            list_script: Mutex::new(VecDeque::new()),
            login_error: Mutex::new(None),
            upload_result: Mutex::new(None),
            report: b"%PDF-1.4 report".to_vec(),
            fail_lists: AtomicBool::new(false),
            reject_tokens: AtomicBool::new(false),
            auth_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_datasets(&self, datasets: Vec<DatasetSummary>) {
        *self.datasets.lock().unwrap() = datasets;
    }

    pub fn script_list(&self, delay: Duration, result: Result<Vec<DatasetSummary>>) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
    }

    fn authorize(&self, token: &str) -> Result<()> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        if token.is_empty() || self.reject_tokens.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized);
        }
        Ok(())
    }

    fn auth(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.login_error.lock().unwrap().clone() {
            return Err(e);
        }
        let token = self
            .tokens
            .lock()
            .unwrap()
            .get(&credentials.username)
            .cloned()
            .unwrap_or_else(|| format!("T-{}", credentials.username));
        Ok(AuthResponse {
            token,
            username: credentials.username.clone(),
            user_id: Some(1),
        })
    }
}

#[async_trait]
impl AnalysisApi for MockApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.auth(credentials)
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.auth(credentials)
    }

    async fn list_datasets(&self, token: &str) -> Result<Vec<DatasetSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;

        let scripted = self.list_script.lock().unwrap().pop_front();
        if let Some(Scripted { delay, result }) = scripted {
            tokio::time::sleep(delay).await;
            return result;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ClientError::network("connection refused"));
        }
        Ok(self.datasets.lock().unwrap().clone())
    }

    async fn get_dataset(&self, token: &str, id: DatasetId) -> Result<DatasetDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        Ok(detail(id))
    }

    async fn upload_csv(&self, token: &str, file: &UploadFile) -> Result<DatasetDetail> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        if let Some(result) = self.upload_result.lock().unwrap().take() {
            return result;
        }
        let mut uploaded = detail(99);
        uploaded.name = file.file_name.clone();
        Ok(uploaded)
    }

    async fn generate_report(&self, token: &str, _id: DatasetId) -> Result<Vec<u8>> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        Ok(self.report.clone())
    }
}

pub struct Harness {
    pub api: Arc<MockApi>,
    pub repo: InMemoryCredentialRepository,
    pub client: ClientSession,
}

pub fn harness() -> Harness {
    harness_with(ClientConfig::default(), InMemoryCredentialRepository::new())
}

pub fn harness_with(config: ClientConfig, repo: InMemoryCredentialRepository) -> Harness {
    let api = MockApi::new();
    let client = ClientSession::create(config, api.clone(), Arc::new(repo.clone()))
        .expect("valid config");
    Harness { api, repo, client }
}

pub fn alice() -> Credentials {
    Credentials::new("alice", "pw")
}

/// Advances paused time and lets spawned tasks run.
pub async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Everything published so far.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<eqviz_core::event::ClientEvent>) -> Vec<eqviz_core::event::ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn manual_refresh() -> ClientConfig {
    ClientConfig {
        auto_refresh: false,
        ..Default::default()
    }
}
