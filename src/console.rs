//! Terminal host.
//!
//! A line-oriented front end for the sale register and the report browser.
//! Input lines are parsed into [`SaleCommand`] / [`ReportCommand`], the
//! controllers are driven with them, and their view snapshots are rendered
//! as plain text. Dialogs are answered on the same input stream.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::SalesBackend;
use crate::dialogs::{Dialogs, Notification};
use crate::months::MONTH_NAMES;
use crate::reports::{PreviewDismissal, ReportBrowser};
use crate::sales::{FinalizeOutcome, SaleRegister};
use crate::view::{CardTier, CartView, ReportPanel, ReportView, Trend};

/// How long a sale receipt stays on screen.
pub const RECEIPT_DISPLAY: Duration = Duration::from_secs(5);

/// Prompt answer that cancels instead of accepting the default.
const CANCEL_ANSWER: &str = "x";

const SALE_HELP: &str = "\
Comandos:
  b <termo>      buscar produto
  s <id>         selecionar produto
  q <n>          quantidade
  a              adicionar ao carrinho
  e <linha>      editar quantidade
  r <linha>      remover item
  limpar         esvaziar carrinho
  f              finalizar venda
  esc            limpar seleção
  ver | ajuda | sair";

const REPORT_HELP: &str = "\
Comandos:
  mes <ano> <mês>            relatórios do mês (número ou nome)
  dia [<ano> <mês>] <dia>    visualizar relatório do dia
  pdf [[<ano> <mês>] <dia>]  baixar PDF do dia (sem argumentos: o visualizado)
  pdf-mes [<ano> <mês>]      baixar PDF do mês
  fechar | esc               fechar visualização
  atualizar                  atualizar estatísticas
  recarregar                 recarregar a página
  ver | ajuda | sair";

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// Dialogs answered on a line-based input stream, printed to stdout.
pub struct TerminalDialogs<R> {
    lines: Mutex<Lines<R>>,
}

pub type StdinDialogs = TerminalDialogs<BufReader<Stdin>>;

impl StdinDialogs {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> TerminalDialogs<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(line) => line.map(|l| l.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "Failed to read terminal input");
                None
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Dialogs for TerminalDialogs<R> {
    async fn confirm(&self, message: &str) -> bool {
        self.read_line(&format!("{message} [s/N] "))
            .await
            .is_some_and(|answer| is_yes(&answer))
    }

    async fn prompt(&self, message: &str, default: &str) -> Option<String> {
        let answer = self
            .read_line(&format!("{message} [{default}] ('{CANCEL_ANSWER}' cancela) "))
            .await?;
        if answer.eq_ignore_ascii_case(CANCEL_ANSWER) {
            None
        } else if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }

    async fn alert(&self, message: &str) {
        println!("! {message}");
    }

    fn notify(&self, notification: Notification) {
        println!("{} {}", notification.kind.icon(), notification.message);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("comando vazio")]
    Empty,
    #[error("comando desconhecido: {0} (digite 'ajuda')")]
    Unknown(String),
    #[error("faltou o argumento: {0}")]
    MissingArgument(&'static str),
    #[error("número inválido: {0}")]
    InvalidNumber(String),
    #[error("mês inválido: {0}")]
    InvalidMonth(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleCommand {
    Search(String),
    Select(i64),
    Quantity(String),
    Add,
    /// Zero-based cart line index.
    Edit(usize),
    Remove(usize),
    Clear,
    Finalize,
    Escape,
    Show,
    Help,
    Quit,
}

impl SaleCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let (head, rest) = split_head(line);
        match head.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "b" | "buscar" => Ok(Self::Search(rest.to_string())),
            "s" | "selecionar" => Ok(Self::Select(parse_number(rest, "id")?)),
            "q" | "qtd" => Ok(Self::Quantity(rest.to_string())),
            "a" | "adicionar" => Ok(Self::Add),
            "e" | "editar" => Ok(Self::Edit(parse_line_number(rest)?)),
            "r" | "remover" => Ok(Self::Remove(parse_line_number(rest)?)),
            "limpar" => Ok(Self::Clear),
            "f" | "finalizar" => Ok(Self::Finalize),
            "esc" => Ok(Self::Escape),
            "v" | "ver" => Ok(Self::Show),
            "?" | "ajuda" => Ok(Self::Help),
            "sair" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// A day, optionally in an explicit month. Without one, the month on
/// screen is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRef {
    pub month: Option<(i32, u32)>,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCommand {
    Month { year: i32, month: u32 },
    Preview(DayRef),
    Close,
    Escape,
    Download(DayRef),
    DownloadMonth(Option<(i32, u32)>),
    DownloadPreview,
    Stats,
    Reload,
    Show,
    Help,
    Quit,
}

impl ReportCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let (head, rest) = split_head(line);
        let args: Vec<&str> = rest.split_whitespace().collect();
        match head.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "mes" | "mês" => match args.as_slice() {
                [year, month] => Ok(Self::Month {
                    year: parse_number(year, "ano")?,
                    month: parse_month(month)?,
                }),
                _ => Err(CommandError::MissingArgument("<ano> <mês>")),
            },
            "dia" => Ok(Self::Preview(parse_day_ref(&args)?)),
            "pdf" if args.is_empty() => Ok(Self::DownloadPreview),
            "pdf" => Ok(Self::Download(parse_day_ref(&args)?)),
            "pdf-mes" | "pdf-mês" => match args.as_slice() {
                [] => Ok(Self::DownloadMonth(None)),
                [year, month] => Ok(Self::DownloadMonth(Some((
                    parse_number(year, "ano")?,
                    parse_month(month)?,
                )))),
                _ => Err(CommandError::MissingArgument("<ano> <mês>")),
            },
            "fechar" => Ok(Self::Close),
            "esc" => Ok(Self::Escape),
            "atualizar" => Ok(Self::Stats),
            "recarregar" => Ok(Self::Reload),
            "v" | "ver" => Ok(Self::Show),
            "?" | "ajuda" => Ok(Self::Help),
            "sair" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn split_head(line: &str) -> (&str, &str) {
    let line = line.trim();
    line.split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((line, ""))
}

fn parse_number<T: std::str::FromStr>(arg: &str, name: &'static str) -> Result<T, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

/// One-based line number as shown on screen -> zero-based index.
fn parse_line_number(arg: &str) -> Result<usize, CommandError> {
    let n: usize = parse_number(arg, "linha")?;
    n.checked_sub(1)
        .ok_or_else(|| CommandError::InvalidNumber(arg.to_string()))
}

/// `3`, `março` or `Março`.
fn parse_month(arg: &str) -> Result<u32, CommandError> {
    if let Ok(n) = arg.parse::<u32>() {
        return if (1..=12).contains(&n) {
            Ok(n)
        } else {
            Err(CommandError::InvalidMonth(arg.to_string()))
        };
    }
    let wanted = arg.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| name.to_lowercase() == wanted)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| CommandError::InvalidMonth(arg.to_string()))
}

fn parse_day(arg: &str) -> Result<u32, CommandError> {
    let day: u32 = parse_number(arg, "dia")?;
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(CommandError::InvalidNumber(arg.to_string()))
    }
}

fn parse_day_ref(args: &[&str]) -> Result<DayRef, CommandError> {
    match args {
        [day] => Ok(DayRef {
            month: None,
            day: parse_day(day)?,
        }),
        [year, month, day] => Ok(DayRef {
            month: Some((parse_number(year, "ano")?, parse_month(month)?)),
            day: parse_day(day)?,
        }),
        _ => Err(CommandError::MissingArgument("[<ano> <mês>] <dia>")),
    }
}

/// Month currently shown in the report panel.
fn shown_month(view: &ReportView) -> Option<(i32, u32)> {
    match &view.panel {
        ReportPanel::Month(m) => Some((m.year, m.month)),
        _ => None,
    }
}

fn resolve_day(view: &ReportView, day: DayRef) -> Option<(i32, u32, u32)> {
    let (year, month) = day.month.or_else(|| shown_month(view))?;
    Some((year, month, day.day))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_cart(view: &CartView) -> String {
    let mut out = String::new();

    if let Some(results) = &view.results {
        let _ = writeln!(out, "Busca: {}", results.term);
        if results.not_found() {
            let _ = writeln!(out, "  Nenhum produto encontrado para \"{}\"", results.term);
        }
        for entry in &results.entries {
            let _ = writeln!(
                out,
                "  [{}] {} - {} (estoque: {})",
                entry.id, entry.name, entry.price, entry.stock
            );
        }
    }

    if let Some(name) = &view.selected {
        let subtotal = if view.subtotal.is_empty() {
            "-"
        } else {
            view.subtotal.as_str()
        };
        let _ = writeln!(
            out,
            "Selecionado: {name} | Qtd: {} | Subtotal: {subtotal}",
            view.quantity_input
        );
    }
    if view.just_added {
        let _ = writeln!(out, "✓ Adicionado!");
    }

    let _ = writeln!(out, "Carrinho:");
    if view.is_empty() {
        let _ = writeln!(out, "  (vazio)");
    }
    for line in &view.lines {
        let _ = writeln!(out, "  {}. {}  {}", line.index + 1, line.name, line.description());
    }
    let _ = writeln!(out, "Total: {}", view.total);

    if let Some(receipt) = &view.receipt {
        let _ = writeln!(
            out,
            "Venda #{} registrada em {} - Total {}",
            receipt.sale_id, receipt.date, receipt.total
        );
        let _ = writeln!(out, "{}", receipt.message);
    }
    out
}

fn tier_marker(tier: CardTier) -> &'static str {
    match tier {
        CardTier::High => "***",
        CardTier::Medium => "** ",
        CardTier::Low => "*  ",
        CardTier::Neutral => "   ",
    }
}

pub fn render_report(view: &ReportView) -> String {
    let mut out = String::new();

    if let Some(stats) = &view.quick_stats {
        let arrow = match stats.trend {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        };
        let _ = writeln!(
            out,
            "Hoje: {} | Mês: {} | Comparativo: {arrow} {}",
            stats.today, stats.month, stats.comparison
        );
    }
    if view.loading {
        let _ = writeln!(out, "Carregando...");
    }

    match &view.panel {
        ReportPanel::Empty => {}
        ReportPanel::Month(month) => {
            let _ = writeln!(
                out,
                "{} de {}: {} ({} dia(s) com vendas)",
                month.month_name, month.year, month.total, month.days_with_sales
            );
            if month.cards.is_empty() {
                let _ = writeln!(out, "  Nenhuma venda neste mês");
            }
            for card in &month.cards {
                let mut highlights = card.highlights.join(", ");
                if card.more_products {
                    highlights.push_str(", ...");
                }
                let _ = writeln!(
                    out,
                    "  {} {:02}/{:02}  {}  {} venda(s)  {highlights}",
                    tier_marker(card.tier),
                    card.day,
                    card.month,
                    card.total,
                    card.sale_count
                );
            }
        }
        ReportPanel::Error { message } => {
            let _ = writeln!(out, "Erro: {message} (digite 'recarregar' para tentar novamente)");
        }
    }

    if let Some(preview) = &view.preview {
        let _ = writeln!(out, "=== {} ===", preview.title);
        let _ = writeln!(out, "{}", preview.text);
        let _ = writeln!(out, "('pdf' baixa, 'fechar' ou 'esc' fecha)");
    }
    out
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Drive the sale register until `sair` or end of input.
pub async fn run_sale_console<B, R>(
    register: &mut SaleRegister<B, TerminalDialogs<R>>,
    terminal: &TerminalDialogs<R>,
) where
    B: SalesBackend,
    R: AsyncBufRead + Unpin + Send,
{
    println!("{SALE_HELP}");
    print!("{}", render_cart(&register.view()));
    let mut receipt_since: Option<Instant> = None;

    while let Some(line) = terminal.read_line("venda> ").await {
        if receipt_since.is_some_and(|shown| shown.elapsed() >= RECEIPT_DISPLAY) {
            register.dismiss_receipt();
            receipt_since = None;
        }

        let command = match SaleCommand::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!(?command, "Sale command");

        match command {
            SaleCommand::Search(term) => {
                register.search(&term);
            }
            SaleCommand::Select(id) => {
                if let Err(e) = register.select(id) {
                    println!("{e}");
                }
            }
            SaleCommand::Quantity(raw) => {
                register.set_quantity(&raw);
            }
            SaleCommand::Add => {
                if !register.add_line() {
                    println!("Selecione um produto e informe uma quantidade válida");
                }
            }
            SaleCommand::Edit(index) => {
                if let Err(e) = register.edit_quantity(index).await {
                    println!("{e}");
                }
            }
            SaleCommand::Remove(index) => {
                if let Err(e) = register.remove_line(index).await {
                    println!("{e}");
                }
            }
            SaleCommand::Clear => {
                register.clear_cart().await;
            }
            SaleCommand::Finalize => {
                if let FinalizeOutcome::Completed(receipt) = register.finalize().await {
                    info!(sale_id = receipt.sale_id, "Sale completed at the terminal");
                    receipt_since = Some(Instant::now());
                }
            }
            SaleCommand::Escape => register.clear_selection(),
            SaleCommand::Show => {}
            SaleCommand::Help => {
                println!("{SALE_HELP}");
                continue;
            }
            SaleCommand::Quit => break,
        }
        print!("{}", render_cart(&register.view()));
    }
}

/// Drive the report browser until `sair` or end of input. The quick stats
/// refresh task runs for the whole session and is stopped on exit.
pub async fn run_report_console<B, R>(
    browser: Arc<ReportBrowser<B, TerminalDialogs<R>>>,
    terminal: &TerminalDialogs<R>,
    refresh: Duration,
) where
    B: SalesBackend + 'static,
    R: AsyncBufRead + Unpin + Send + 'static,
{
    browser.open_initial(Local::now().date_naive()).await;
    let cancel = CancellationToken::new();
    let refresher = browser
        .clone()
        .start_quick_stats_refresh(refresh, cancel.clone());

    println!("{REPORT_HELP}");
    print!("{}", render_report(&browser.view()));

    while let Some(line) = terminal.read_line("relatorios> ").await {
        let command = match ReportCommand::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!(?command, "Report command");

        match command {
            ReportCommand::Month { year, month } => {
                browser.search_month(year, month).await;
            }
            ReportCommand::Preview(day) => {
                let Some((year, month, day)) = resolve_day(&browser.view(), day) else {
                    println!("Nenhum mês carregado; use 'dia <ano> <mês> <dia>'");
                    continue;
                };
                browser.preview_day(year, month, day).await;
            }
            ReportCommand::Close => {
                browser.close_preview(PreviewDismissal::CloseButton);
            }
            ReportCommand::Escape => {
                browser.close_preview(PreviewDismissal::Escape);
            }
            ReportCommand::Download(day) => {
                let Some((year, month, day)) = resolve_day(&browser.view(), day) else {
                    println!("Nenhum mês carregado; use 'pdf <ano> <mês> <dia>'");
                    continue;
                };
                if let Some(path) = browser.download_day(year, month, day).await {
                    println!("Salvo em {}", path.display());
                }
            }
            ReportCommand::DownloadMonth(month) => {
                let Some((year, month)) = month.or_else(|| shown_month(&browser.view())) else {
                    println!("Nenhum mês carregado; use 'pdf-mes <ano> <mês>'");
                    continue;
                };
                if let Some(path) = browser.download_month(year, month).await {
                    println!("Salvo em {}", path.display());
                }
            }
            ReportCommand::DownloadPreview => {
                if browser.view().preview.is_none() {
                    println!("Nenhum relatório aberto; use 'pdf <dia>'");
                    continue;
                }
                if let Some(path) = browser.download_from_preview().await {
                    println!("Salvo em {}", path.display());
                }
            }
            ReportCommand::Stats => {
                browser.load_quick_stats().await;
            }
            ReportCommand::Reload => {
                browser.open_initial(Local::now().date_naive()).await;
            }
            ReportCommand::Show => {}
            ReportCommand::Help => {
                println!("{REPORT_HELP}");
                continue;
            }
            ReportCommand::Quit => break,
        }
        print!("{}", render_report(&browser.view()));
    }

    cancel.cancel();
    if let Err(e) = refresher.await {
        warn!(error = %e, "Quick stats refresh task ended abnormally");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{
        DayCard, LineView, MonthView, PreviewModal, QuickStatsView, ReceiptView, SubmitState,
    };

    #[test]
    fn test_sale_command_parsing() {
        assert_eq!(
            SaleCommand::parse("b pão francês"),
            Ok(SaleCommand::Search("pão francês".to_string()))
        );
        assert_eq!(SaleCommand::parse("b"), Ok(SaleCommand::Search(String::new())));
        assert_eq!(SaleCommand::parse("  s 3 "), Ok(SaleCommand::Select(3)));
        assert_eq!(
            SaleCommand::parse("q 2abc"),
            Ok(SaleCommand::Quantity("2abc".to_string()))
        );
        assert_eq!(SaleCommand::parse("ADICIONAR"), Ok(SaleCommand::Add));
        assert_eq!(SaleCommand::parse("e 1"), Ok(SaleCommand::Edit(0)));
        assert_eq!(SaleCommand::parse("remover 2"), Ok(SaleCommand::Remove(1)));
        assert_eq!(SaleCommand::parse("f"), Ok(SaleCommand::Finalize));
        assert_eq!(SaleCommand::parse("sair"), Ok(SaleCommand::Quit));
    }

    #[test]
    fn test_sale_command_errors() {
        assert_eq!(SaleCommand::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            SaleCommand::parse("voar"),
            Err(CommandError::Unknown("voar".to_string()))
        );
        assert_eq!(
            SaleCommand::parse("s"),
            Err(CommandError::MissingArgument("id"))
        );
        assert_eq!(
            SaleCommand::parse("s abc"),
            Err(CommandError::InvalidNumber("abc".to_string()))
        );
        // Lines are numbered from 1 on screen.
        assert_eq!(
            SaleCommand::parse("e 0"),
            Err(CommandError::InvalidNumber("0".to_string()))
        );
    }

    #[test]
    fn test_report_command_parsing() {
        assert_eq!(
            ReportCommand::parse("mes 2024 3"),
            Ok(ReportCommand::Month { year: 2024, month: 3 })
        );
        assert_eq!(
            ReportCommand::parse("mes 2024 março"),
            Ok(ReportCommand::Month { year: 2024, month: 3 })
        );
        assert_eq!(
            ReportCommand::parse("dia 10"),
            Ok(ReportCommand::Preview(DayRef { month: None, day: 10 }))
        );
        assert_eq!(
            ReportCommand::parse("dia 2024 Dezembro 24"),
            Ok(ReportCommand::Preview(DayRef {
                month: Some((2024, 12)),
                day: 24
            }))
        );
        assert_eq!(ReportCommand::parse("pdf"), Ok(ReportCommand::DownloadPreview));
        assert_eq!(
            ReportCommand::parse("pdf 5"),
            Ok(ReportCommand::Download(DayRef { month: None, day: 5 }))
        );
        assert_eq!(
            ReportCommand::parse("pdf-mes"),
            Ok(ReportCommand::DownloadMonth(None))
        );
        assert_eq!(
            ReportCommand::parse("pdf-mes 2023 11"),
            Ok(ReportCommand::DownloadMonth(Some((2023, 11))))
        );
        assert_eq!(ReportCommand::parse("esc"), Ok(ReportCommand::Escape));
        assert_eq!(ReportCommand::parse("fechar"), Ok(ReportCommand::Close));
    }

    #[test]
    fn test_report_command_errors() {
        assert_eq!(
            ReportCommand::parse("mes 2024"),
            Err(CommandError::MissingArgument("<ano> <mês>"))
        );
        assert_eq!(
            ReportCommand::parse("mes 2024 13"),
            Err(CommandError::InvalidMonth("13".to_string()))
        );
        assert_eq!(
            ReportCommand::parse("mes 2024 brumário"),
            Err(CommandError::InvalidMonth("brumário".to_string()))
        );
        assert_eq!(
            ReportCommand::parse("dia 32"),
            Err(CommandError::InvalidNumber("32".to_string()))
        );
        assert_eq!(
            ReportCommand::parse("dia 2024 3"),
            Err(CommandError::MissingArgument("[<ano> <mês>] <dia>"))
        );
    }

    fn month_view() -> MonthView {
        MonthView {
            year: 2024,
            month: 3,
            month_name: "Março".to_string(),
            total: "R$ 130.00".to_string(),
            days_with_sales: 1,
            cards: vec![DayCard {
                year: 2024,
                month: 3,
                day: 10,
                date: "10/03/2024".to_string(),
                total: "R$ 130.00".to_string(),
                sale_count: 4,
                tier: CardTier::High,
                highlights: vec!["3x Café".to_string(), "2x Água".to_string()],
                more_products: true,
            }],
        }
    }

    #[test]
    fn test_resolve_day_uses_shown_month() {
        let mut view = ReportView::default();
        let day = DayRef { month: None, day: 10 };
        assert_eq!(resolve_day(&view, day), None);

        view.panel = ReportPanel::Month(month_view());
        assert_eq!(resolve_day(&view, day), Some((2024, 3, 10)));

        let explicit = DayRef {
            month: Some((2023, 1)),
            day: 2,
        };
        assert_eq!(resolve_day(&view, explicit), Some((2023, 1, 2)));
    }

    #[test]
    fn test_render_cart_lists_lines_and_receipt() {
        let view = CartView {
            search_term: String::new(),
            results: None,
            selected: None,
            quantity_input: String::new(),
            subtotal: String::new(),
            add_enabled: false,
            just_added: false,
            lines: vec![LineView {
                index: 0,
                product_id: 1,
                name: "Água".to_string(),
                quantity: 2,
                unit_price: "R$ 5.00".to_string(),
                subtotal: "R$ 10.00".to_string(),
            }],
            total: "R$ 10.00".to_string(),
            submit: SubmitState::Idle,
            receipt: Some(ReceiptView {
                sale_id: 42,
                date: "10/03/2024 14:00".to_string(),
                total: "R$ 10.00".to_string(),
                message: "Venda registrada".to_string(),
            }),
        };
        let text = render_cart(&view);
        assert!(text.contains("1. Água  2x R$ 5.00 = R$ 10.00"));
        assert!(text.contains("Total: R$ 10.00"));
        assert!(text.contains("Venda #42"));
        assert!(!text.contains("(vazio)"));
        assert!(!text.contains("Finalizando"));
    }

    #[test]
    fn test_render_report_month_and_preview() {
        let view = ReportView {
            quick_stats: Some(QuickStatsView {
                today: "R$ 42.50".to_string(),
                month: "R$ 1000.00".to_string(),
                comparison: "+R$ 5.00".to_string(),
                trend: Trend::Up,
            }),
            loading: false,
            panel: ReportPanel::Month(month_view()),
            preview: Some(PreviewModal {
                title: "Relatório de 10/03/2024".to_string(),
                text: "texto".to_string(),
                year: 2024,
                month: 3,
                day: 10,
            }),
        };
        let text = render_report(&view);
        assert!(text.contains("Comparativo: ↑ +R$ 5.00"));
        assert!(text.contains("Março de 2024: R$ 130.00"));
        assert!(text.contains("*** 10/03  R$ 130.00  4 venda(s)  3x Café, 2x Água, ..."));
        assert!(text.contains("=== Relatório de 10/03/2024 ==="));
    }

    #[test]
    fn test_render_report_error_panel_offers_retry() {
        let view = ReportView {
            panel: ReportPanel::Error {
                message: "Erro ao carregar relatórios".to_string(),
            },
            ..ReportView::default()
        };
        assert!(render_report(&view).contains("recarregar"));
    }

    #[tokio::test]
    async fn test_terminal_dialogs_answers() {
        let input: &[u8] = b"s\nn\n\n7\nx\n";
        let dialogs = TerminalDialogs::new(input);

        assert!(dialogs.confirm("Remover?").await);
        assert!(!dialogs.confirm("Remover?").await);
        // Empty answer accepts the default.
        assert_eq!(dialogs.prompt("Quantidade", "2").await, Some("2".to_string()));
        assert_eq!(dialogs.prompt("Quantidade", "2").await, Some("7".to_string()));
        assert_eq!(dialogs.prompt("Quantidade", "2").await, None);
        // End of input cancels and declines.
        assert_eq!(dialogs.prompt("Quantidade", "2").await, None);
        assert!(!dialogs.confirm("Finalizar?").await);
    }
}
