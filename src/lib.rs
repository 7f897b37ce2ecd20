//! Registro de Vendas - point-of-sale register and sales report browser.
//!
//! Two controllers sit on top of the sales server's HTTP endpoints:
//! [`sales::SaleRegister`] builds a cart from the product catalog and
//! submits it, and [`reports::ReportBrowser`] browses daily and monthly
//! sales and saves their PDFs. Both publish [`view`] snapshots and talk to
//! the user through the [`dialogs::Dialogs`] seam; the `registro-vendas`
//! binary hosts them on a terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod console;
pub mod diagnostics;
pub mod dialogs;
pub mod error;
pub mod models;
pub mod money;
pub mod months;
pub mod reports;
pub mod sales;
pub mod view;

#[cfg(test)]
mod testing;

use crate::api::HttpBackend;
use crate::config::{AppConfig, Overrides};
use crate::console::StdinDialogs;
use crate::reports::ReportBrowser;
use crate::sales::SaleRegister;

#[derive(Debug, Parser)]
#[command(name = "registro-vendas", version, about = "Registro de vendas e relatórios")]
pub struct Cli {
    /// Address of the sales server (overrides REGISTRO_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Where report PDFs are saved (overrides REGISTRO_DOWNLOAD_DIR)
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sale register: search products, build the cart, finalize
    Venda,
    /// Sales reports: quick stats, monthly days, previews and PDFs
    Relatorios,
}

/// Structured logging: console on stderr plus a daily rolling JSON file.
///
/// The returned guard flushes the file writer when dropped.
pub fn init_logging(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,registro_vendas_pos=debug"));

    // Prune old log files before setting up the appender
    diagnostics::prune_old_logs(log_dir);

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(diagnostics::LOG_FILE_PREFIX)
        .build(log_dir)
        .context("Failed to open rolling log file")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    // stdout belongs to the terminal host
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Binary entry point.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env_with(Overrides {
        base_url: cli.base_url.clone(),
        download_dir: cli.download_dir.clone(),
    })
    .context("Failed to load configuration")?;

    let _guard = init_logging(&config.log_dir)?;
    info!("Starting Registro de Vendas v{}", env!("CARGO_PKG_VERSION"));
    info!(about = %diagnostics::about_info(), log_dir = %config.log_dir.display(), "Build info");

    let backend = Arc::new(
        HttpBackend::new(&config.base_url, config.request_timeout)
            .context("Invalid sales server address")?,
    );
    info!(base_url = %backend.base_url(), command = ?cli.command, "Connecting to sales server");
    let terminal = Arc::new(StdinDialogs::stdin());

    match cli.command {
        Command::Venda => {
            let mut register = SaleRegister::open(backend, terminal.clone())
                .await
                .context("Failed to load the product catalog")?;
            info!(products = register.catalog().len(), "Sale register ready");
            console::run_sale_console(&mut register, &terminal).await;
        }
        Command::Relatorios => {
            let browser = Arc::new(ReportBrowser::new(
                backend,
                terminal.clone(),
                config.download_dir.clone(),
            ));
            console::run_report_console(browser, &terminal, config.stats_refresh).await;
        }
    }

    info!("Registro de Vendas stopped");
    Ok(())
}
