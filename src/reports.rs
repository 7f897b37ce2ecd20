//! Sales report browser.
//!
//! Shows the quick stats strip, one month of daily sales cards, the per-day
//! preview modal, and saves the PDFs rendered by the backend.
//!
//! The browser is shared between the host and the quick stats refresh task,
//! so its view state lives behind a mutex that is never held across an
//! `.await`. Month searches are numbered: a response that arrives after a
//! newer search was issued is discarded instead of overwriting the view.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::SalesBackend;
use crate::dialogs::{Dialogs, Notification};
use crate::error::ApiError;
use crate::models::ReportArtifact;
use crate::view::{MonthView, PreviewModal, QuickStatsView, ReportPanel, ReportView};

/// Quick stats refresh period of the report page (5 minutes).
pub const DEFAULT_STATS_REFRESH: Duration = Duration::from_secs(300);

const MSG_REPORTS_FAILED: &str = "Erro ao carregar relatórios";
const MSG_PREVIEW_FAILED: &str = "Erro ao carregar preview";
const MSG_DOWNLOAD_FAILED: &str = "Erro ao baixar relatório";

/// How the preview modal was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewDismissal {
    CloseButton,
    Backdrop,
    Escape,
}

pub struct ReportBrowser<B, D> {
    backend: Arc<B>,
    dialogs: Arc<D>,
    download_dir: PathBuf,
    state: Mutex<ReportView>,
    generation: AtomicU64,
}

impl<B, D> ReportBrowser<B, D>
where
    B: SalesBackend + 'static,
    D: Dialogs + 'static,
{
    pub fn new(backend: Arc<B>, dialogs: Arc<D>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            dialogs,
            download_dir: download_dir.into(),
            state: Mutex::new(ReportView::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ReportView {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut ReportView) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Page load: quick stats, then the month containing `today`.
    pub async fn open_initial(&self, today: NaiveDate) {
        self.load_quick_stats().await;
        self.search_month(today.year(), today.month()).await;
    }

    // -----------------------------------------------------------------------
    // Quick stats
    // -----------------------------------------------------------------------

    /// Refresh the stats strip. Failures are logged and leave the previous
    /// figures on screen.
    pub async fn load_quick_stats(&self) -> bool {
        match self.backend.quick_stats().await {
            Ok(stats) => {
                let view = QuickStatsView::from(&stats);
                debug!(today = %view.today, month = %view.month, "Quick stats updated");
                self.update(|s| s.quick_stats = Some(view));
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to load quick stats");
                false
            }
        }
    }

    /// Re-run [`Self::load_quick_stats`] every `period` until `cancel` fires.
    pub fn start_quick_stats_refresh(
        self: Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Quick stats refresh started (interval: {}s)", period.as_secs());
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the page load already fetched.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Quick stats refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        // An in-flight request must not delay shutdown.
                        let stopped = tokio::select! {
                            _ = cancel.cancelled() => true,
                            _ = self.load_quick_stats() => false,
                        };
                        if stopped {
                            info!("Quick stats refresh stopped during a request");
                            break;
                        }
                    }
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Month report
    // -----------------------------------------------------------------------

    /// Load one month. Returns `true` when this response was rendered.
    pub async fn search_month(&self, year: i32, month: u32) -> bool {
        // Numbered under the same lock as the reset, so the newest number
        // always belongs to the newest reset.
        let generation = self.update(|s| {
            s.loading = true;
            s.panel = ReportPanel::Empty;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        });
        info!(year, month, "Loading month report");

        let result = self.backend.month_report(year, month).await;
        let panel = match result {
            Ok(report) => {
                let view = MonthView::from(&report);
                info!(
                    year,
                    month,
                    cards = view.cards.len(),
                    days_with_sales = view.days_with_sales,
                    "Month report loaded"
                );
                ReportPanel::Month(view)
            }
            Err(ApiError::Rejected(message)) => {
                warn!(year, month, reason = %message, "Month report refused");
                ReportPanel::Error { message }
            }
            Err(e) => {
                error!(year, month, error = %e, "Month report request failed");
                ReportPanel::Error {
                    message: MSG_REPORTS_FAILED.to_string(),
                }
            }
        };

        // Checked under the lock so a newer search cannot interleave.
        let rendered = self.update(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.loading = false;
            s.panel = panel;
            true
        });
        if !rendered {
            debug!(year, month, generation, "Discarding superseded month report");
        }
        rendered
    }

    // -----------------------------------------------------------------------
    // Preview modal
    // -----------------------------------------------------------------------

    pub async fn preview_day(&self, year: i32, month: u32, day: u32) -> bool {
        match self.backend.day_preview(year, month, day).await {
            Ok(preview) => {
                let modal = PreviewModal {
                    title: format!("Relatório de {}", preview.date),
                    text: preview.text,
                    year,
                    month,
                    day,
                };
                self.update(|s| s.preview = Some(modal));
                true
            }
            Err(e) => {
                let message = match e {
                    ApiError::Rejected(message) => message,
                    other => {
                        error!(year, month, day, error = %other, "Day preview request failed");
                        MSG_PREVIEW_FAILED.to_string()
                    }
                };
                self.update(|s| s.panel = ReportPanel::Error { message });
                false
            }
        }
    }

    /// Close the preview modal. Escape is ignored when no modal is open.
    pub fn close_preview(&self, reason: PreviewDismissal) -> bool {
        let closed = self.update(|s| s.preview.take().is_some());
        if closed {
            debug!(?reason, "Preview closed");
        }
        closed
    }

    /// Download the PDF of the previewed day and close the modal.
    pub async fn download_from_preview(&self) -> Option<PathBuf> {
        let (year, month, day) = self.update(|s| {
            s.preview
                .as_ref()
                .map(|p| (p.year, p.month, p.day))
        })?;
        let saved = self.download_day(year, month, day).await;
        self.close_preview(PreviewDismissal::CloseButton);
        saved
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    pub async fn download_day(&self, year: i32, month: u32, day: u32) -> Option<PathBuf> {
        self.dialogs.notify(Notification::info("Gerando PDF..."));
        let saved = self
            .download(ReportArtifact::Day { year, month, day })
            .await?;
        self.dialogs
            .notify(Notification::success("PDF baixado com sucesso!"));
        Some(saved)
    }

    pub async fn download_month(&self, year: i32, month: u32) -> Option<PathBuf> {
        self.dialogs
            .notify(Notification::info("Gerando relatório mensal..."));
        let saved = self.download(ReportArtifact::Month { year, month }).await?;
        self.dialogs
            .notify(Notification::success("Relatório mensal baixado!"));
        Some(saved)
    }

    async fn download(&self, artifact: ReportArtifact) -> Option<PathBuf> {
        let bytes = match self.backend.download(&artifact).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let message = match e {
                    ApiError::Rejected(message) => message,
                    other => {
                        error!(path = %artifact.path(), error = %other, "Report download failed");
                        MSG_DOWNLOAD_FAILED.to_string()
                    }
                };
                self.dialogs.notify(Notification::error(message));
                return None;
            }
        };

        let path = self.download_dir.join(artifact.file_name());
        let written = async {
            tokio::fs::create_dir_all(&self.download_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;

        match written {
            Ok(()) => {
                info!(path = %path.display(), bytes = bytes.len(), "Report saved");
                Some(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to save report");
                self.dialogs.notify(Notification::error(format!(
                    "Erro ao salvar {}",
                    artifact.file_name()
                )));
                None
            }
        }
    }
}
