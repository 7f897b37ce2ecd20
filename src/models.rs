//! Wire types exchanged with the sales backend.
//!
//! Field names on the wire are Portuguese (`hoje`, `mes_atual`,
//! `relatorios_diarios`, ...); the Rust side uses English names and maps
//! them with `#[serde(rename)]`. Amounts decode from JSON numbers or
//! decimal strings.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Quick stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodTotal {
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comparison {
    #[serde(rename = "diferenca")]
    pub difference: Decimal,
}

/// `GET /vendas/estatisticas-rapidas/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuickStats {
    #[serde(rename = "hoje")]
    pub today: PeriodTotal,
    #[serde(rename = "mes_atual")]
    pub current_month: PeriodTotal,
    #[serde(rename = "comparativo")]
    pub comparison: Comparison,
}

// ---------------------------------------------------------------------------
// Month report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductSummary {
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// One day of a month report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyReport {
    /// `dd/mm/yyyy`
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "tem_vendas", default)]
    pub has_sales: bool,
    pub total: Decimal,
    #[serde(rename = "numero_vendas", default)]
    pub sale_count: u32,
    /// Product name -> quantity sold, in the order the backend listed them.
    #[serde(
        rename = "produtos_resumo",
        default,
        deserialize_with = "deserialize_ordered_summary"
    )]
    pub products: Vec<(String, ProductSummary)>,
}

impl DailyReport {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%d/%m/%Y").ok()
    }

    /// `(day, month)` extracted from the `dd/mm/yyyy` date.
    pub fn day_month(&self) -> Option<(u32, u32)> {
        self.parsed_date().map(|d| (d.day(), d.month()))
    }
}

/// `GET /vendas/buscar-relatorios-mes/?ano=&mes=`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthReport {
    #[serde(rename = "ano")]
    pub year: i32,
    #[serde(rename = "mes_nome")]
    pub month_name: String,
    #[serde(rename = "total_mensal")]
    pub total: Decimal,
    #[serde(rename = "dias_com_vendas", default)]
    pub days_with_sales: u32,
    #[serde(rename = "relatorios_diarios", default)]
    pub daily: Vec<DailyReport>,
}

/// `GET /vendas/preview-relatorio-diario/{y}/{m}/{d}/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DayPreview {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "texto_formatado")]
    pub text: String,
}

// ---------------------------------------------------------------------------
// Sale submission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleItem {
    #[serde(rename = "produto_id")]
    pub product_id: i64,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// `POST /vendas/finalizar-venda/` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRequest {
    #[serde(rename = "itens")]
    pub items: Vec<SaleItem>,
}

/// Successful finalize response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleReceipt {
    #[serde(rename = "venda_id")]
    pub sale_id: i64,
    #[serde(rename = "data_venda", default)]
    pub sale_date: String,
    pub total: Decimal,
    #[serde(rename = "mensagem", default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Server-rendered artifacts
// ---------------------------------------------------------------------------

/// A PDF rendered by the backend and fetched as an opaque byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportArtifact {
    Day { year: i32, month: u32, day: u32 },
    Month { year: i32, month: u32 },
}

impl ReportArtifact {
    /// Path below the `/vendas` prefix.
    pub fn path(&self) -> String {
        match *self {
            Self::Day { year, month, day } => {
                format!("/download-relatorio-diario/{year}/{month}/{day}/")
            }
            Self::Month { year, month } => format!("/download-relatorio-mensal/{year}/{month}/"),
        }
    }

    /// Suggested file name for the saved download.
    pub fn file_name(&self) -> String {
        match *self {
            Self::Day { year, month, day } => format!("relatorio_{day}_{month}_{year}.pdf"),
            Self::Month { year, month } => {
                let slug = crate::months::month_slug(month).unwrap_or_else(|| month.to_string());
                format!("relatorio_mensal_{slug}_{year}.pdf")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ordered map decoding
// ---------------------------------------------------------------------------

fn deserialize_ordered_summary<'de, D>(
    deserializer: D,
) -> Result<Vec<(String, ProductSummary)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedSummary;

    impl<'de> Visitor<'de> for OrderedSummary {
        type Value = Vec<(String, ProductSummary)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of product name to summary")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, summary)) = map.next_entry::<String, ProductSummary>()? {
                entries.push((name, summary));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedSummary)
}
