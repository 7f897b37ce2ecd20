//! View models.
//!
//! Controllers publish their state as these plain, serializable snapshots.
//! A host binds them declaratively (terminal renderer, web view, ...)
//! instead of patching markup by hand.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::models::{DailyReport, MonthReport, QuickStats, SaleReceipt};
use crate::money::{format_brl, format_signed_brl};
use crate::months::month_number;

// ---------------------------------------------------------------------------
// Sale register
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntryView {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub stock: u32,
}

/// Result panel under the search field. Absent when the term is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPanel {
    pub term: String,
    pub entries: Vec<SearchEntryView>,
}

impl SearchPanel {
    pub fn not_found(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub index: usize,
    pub product_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

impl LineView {
    /// `2x R$ 5.00 = R$ 10.00`
    pub fn description(&self) -> String {
        format!("{}x {} = {}", self.quantity, self.unit_price, self.subtotal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptView {
    pub sale_id: i64,
    pub date: String,
    pub total: String,
    pub message: String,
}

impl From<&SaleReceipt> for ReceiptView {
    fn from(receipt: &SaleReceipt) -> Self {
        Self {
            sale_id: receipt.sale_id,
            date: receipt.sale_date.clone(),
            total: format_brl(receipt.total),
            message: receipt.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub search_term: String,
    pub results: Option<SearchPanel>,
    pub selected: Option<String>,
    pub quantity_input: String,
    /// Formatted subtotal of the pending selection; empty when invalid.
    pub subtotal: String,
    pub add_enabled: bool,
    /// Set right after a line was added; hosts flash an acknowledgement.
    pub just_added: bool,
    pub lines: Vec<LineView>,
    pub total: String,
    pub submit: SubmitState,
    pub receipt: Option<ReceiptView>,
}

impl CartView {
    pub fn submit_enabled(&self) -> bool {
        self.submit == SubmitState::Idle
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Report browser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStatsView {
    pub today: String,
    pub month: String,
    pub comparison: String,
    pub trend: Trend,
}

impl From<&QuickStats> for QuickStatsView {
    fn from(stats: &QuickStats) -> Self {
        let difference = stats.comparison.difference;
        let (comparison, trend) = if difference > Decimal::ZERO {
            (format_signed_brl(difference), Trend::Up)
        } else if difference < Decimal::ZERO {
            (format_signed_brl(difference), Trend::Down)
        } else {
            // The stats card has always shown the flat case with a comma.
            ("R$ 0,00".to_string(), Trend::Flat)
        };
        Self {
            today: format_brl(stats.today.total),
            month: format_brl(stats.current_month.total),
            comparison,
            trend,
        }
    }
}

/// Day card colour tier, by day total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTier {
    Neutral,
    Low,
    Medium,
    High,
}

impl CardTier {
    /// `> 100` High, `> 50` Medium, `> 20` Low, otherwise Neutral.
    pub fn for_total(total: Decimal) -> Self {
        if total > Decimal::from(100) {
            Self::High
        } else if total > Decimal::from(50) {
            Self::Medium
        } else if total > Decimal::from(20) {
            Self::Low
        } else {
            Self::Neutral
        }
    }

    /// `(text, background)` utility classes for web hosts.
    pub fn classes(self) -> (&'static str, &'static str) {
        match self {
            Self::High => ("text-green-700", "bg-green-50"),
            Self::Medium => ("text-blue-700", "bg-blue-50"),
            Self::Low => ("text-yellow-700", "bg-yellow-50"),
            Self::Neutral => ("text-gray-600", "bg-gray-50"),
        }
    }
}

/// Number of products named on a day card before the ellipsis.
const CARD_HIGHLIGHTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub date: String,
    pub total: String,
    pub sale_count: u32,
    pub tier: CardTier,
    /// `{qty}x {name}` for the first products of the day.
    pub highlights: Vec<String>,
    pub more_products: bool,
}

impl DayCard {
    /// `None` for days without sales or with an unreadable date.
    pub fn from_daily(report: &DailyReport, year: i32) -> Option<Self> {
        if !report.has_sales {
            return None;
        }
        let Some((day, month)) = report.day_month() else {
            warn!(date = %report.date, "Skipping day card with unreadable date");
            return None;
        };
        Some(Self {
            year,
            month,
            day,
            date: report.date.clone(),
            total: format_brl(report.total),
            sale_count: report.sale_count,
            tier: CardTier::for_total(report.total),
            highlights: report
                .products
                .iter()
                .take(CARD_HIGHLIGHTS)
                .map(|(name, summary)| format!("{}x {name}", summary.quantity))
                .collect(),
            more_products: report.products.len() > CARD_HIGHLIGHTS,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub total: String,
    pub days_with_sales: u32,
    pub cards: Vec<DayCard>,
}

impl From<&MonthReport> for MonthView {
    fn from(report: &MonthReport) -> Self {
        Self {
            year: report.year,
            month: month_number(&report.month_name),
            month_name: report.month_name.clone(),
            total: format_brl(report.total),
            days_with_sales: report.days_with_sales,
            cards: report
                .daily
                .iter()
                .filter_map(|d| DayCard::from_daily(d, report.year))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPanel {
    Empty,
    Month(MonthView),
    /// Inline error with a retry action.
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewModal {
    pub title: String,
    pub text: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub quick_stats: Option<QuickStatsView>,
    pub loading: bool,
    pub panel: ReportPanel,
    pub preview: Option<PreviewModal>,
}

impl Default for ReportView {
    fn default() -> Self {
        Self {
            quick_stats: None,
            loading: false,
            panel: ReportPanel::Empty,
            preview: None,
        }
    }
}
