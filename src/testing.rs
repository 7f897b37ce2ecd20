//! Scripted doubles for controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::api::SalesBackend;
use crate::catalog::{Catalog, Product};
use crate::dialogs::{Dialogs, Notification, NotificationKind};
use crate::error::ApiError;
use crate::models::{DayPreview, MonthReport, QuickStats, ReportArtifact, SaleReceipt, SaleRequest};

pub fn product(id: i64, name: &str, price_cents: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: Decimal::new(price_cents, 2),
        stock: 10,
    }
}

pub fn sample_catalog() -> Catalog {
    Catalog::from_products(vec![
        product(1, "Água", 500),
        product(2, "Pão Francês", 75),
        product(3, "Café", 1200),
    ])
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// Answers confirmations and prompts from queues and records everything.
///
/// An exhausted confirmation queue answers `false`; an exhausted prompt
/// queue cancels.
#[derive(Default)]
pub struct ScriptedDialogs {
    confirms: Mutex<VecDeque<bool>>,
    prompts: Mutex<VecDeque<Option<String>>>,
    pub confirm_messages: Mutex<Vec<String>>,
    pub prompt_messages: Mutex<Vec<(String, String)>>,
    pub alerts: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_next(&self, answer: bool) {
        self.confirms.lock().unwrap().push_back(answer);
    }

    pub fn prompt_next(&self, answer: Option<&str>) {
        self.prompts
            .lock()
            .unwrap()
            .push_back(answer.map(str::to_string));
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.notifications.lock().unwrap().last().cloned()
    }

    pub fn notifications_of(&self, kind: NotificationKind) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn confirm_count(&self) -> usize {
        self.confirm_messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
    async fn confirm(&self, message: &str) -> bool {
        self.confirm_messages
            .lock()
            .unwrap()
            .push(message.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(false)
    }

    async fn prompt(&self, message: &str, default: &str) -> Option<String> {
        self.prompt_messages
            .lock()
            .unwrap()
            .push((message.to_string(), default.to_string()));
        self.prompts.lock().unwrap().pop_front().flatten()
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// A queued month report answer, optionally held back until `gate` fires.
pub struct MonthAnswer {
    pub result: Result<MonthReport, ApiError>,
    pub gate: Option<oneshot::Receiver<()>>,
}

/// Backend double with per-call answer queues and call counters.
///
/// Calls with an empty queue fail with a transport error.
#[derive(Default)]
pub struct MockBackend {
    pub catalog: Mutex<Option<Catalog>>,
    pub stats: Mutex<VecDeque<Result<QuickStats, ApiError>>>,
    pub months: Mutex<VecDeque<MonthAnswer>>,
    pub previews: Mutex<VecDeque<Result<DayPreview, ApiError>>>,
    pub sales: Mutex<VecDeque<Result<SaleReceipt, ApiError>>>,
    pub downloads: Mutex<VecDeque<Result<Vec<u8>, ApiError>>>,
    pub submitted: Mutex<Vec<SaleRequest>>,
    pub month_requests: Mutex<Vec<(i32, u32)>>,
    pub downloaded: Mutex<Vec<ReportArtifact>>,
    pub stats_calls: AtomicUsize,
    stats_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stats(&self, result: Result<QuickStats, ApiError>) {
        self.stats.lock().unwrap().push_back(result);
    }

    pub fn push_month(&self, result: Result<MonthReport, ApiError>) {
        self.months
            .lock()
            .unwrap()
            .push_back(MonthAnswer { result, gate: None });
    }

    /// Queue a month answer that is only delivered once the returned sender fires.
    pub fn push_gated_month(&self, result: Result<MonthReport, ApiError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.months.lock().unwrap().push_back(MonthAnswer {
            result,
            gate: Some(rx),
        });
        tx
    }

    /// Hold the next quick stats call until the returned sender fires (or drops).
    pub fn hold_next_stats(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.stats_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn push_preview(&self, result: Result<DayPreview, ApiError>) {
        self.previews.lock().unwrap().push_back(result);
    }

    pub fn push_sale(&self, result: Result<SaleReceipt, ApiError>) {
        self.sales.lock().unwrap().push_back(result);
    }

    pub fn push_download(&self, result: Result<Vec<u8>, ApiError>) {
        self.downloads.lock().unwrap().push_back(result);
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

fn exhausted() -> ApiError {
    ApiError::Transport("no scripted answer".to_string())
}

#[async_trait]
impl SalesBackend for MockBackend {
    async fn fetch_catalog(&self) -> Result<Catalog, ApiError> {
        self.catalog.lock().unwrap().clone().ok_or_else(exhausted)
    }

    async fn quick_stats(&self) -> Result<QuickStats, ApiError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.stats_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.stats.lock().unwrap().pop_front().unwrap_or_else(|| Err(exhausted()))
    }

    async fn month_report(&self, year: i32, month: u32) -> Result<MonthReport, ApiError> {
        self.month_requests.lock().unwrap().push((year, month));
        let answer = self.months.lock().unwrap().pop_front();
        let Some(answer) = answer else {
            return Err(exhausted());
        };
        if let Some(gate) = answer.gate {
            let _ = gate.await;
        }
        answer.result
    }

    async fn day_preview(
        &self,
        _year: i32,
        _month: u32,
        _day: u32,
    ) -> Result<DayPreview, ApiError> {
        self.previews
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }

    async fn finalize_sale(&self, request: &SaleRequest) -> Result<SaleReceipt, ApiError> {
        self.submitted.lock().unwrap().push(request.clone());
        self.sales
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }

    async fn download(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ApiError> {
        self.downloaded.lock().unwrap().push(*artifact);
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }
}
