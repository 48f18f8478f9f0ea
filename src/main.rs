use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stepquill::config::Config;
use stepquill::document::content::{ContentItem, ExperimentInfo, ParamKind, ParamValue, Parameter};
use stepquill::document::step::Step;
use stepquill::document::tree::Document;
use stepquill::editor::session::EditorSession;
use stepquill::input::{parse_command, CommandHandler, Reply};
use stepquill::ui::render_outline;
use stepquill::view::{RecordingView, ViewAdapter};

/// StepQuill - A line-oriented editor for hierarchical lab protocols
#[derive(Parser)]
#[command(name = "stepquill")]
#[command(version)]
#[command(about = "A line-oriented editor for hierarchical lab protocols", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/stepquill/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from a template (no experiment info) instead of a run
    #[arg(long)]
    template: bool,
}

/// Installs a stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// A small fixation protocol to start editing from.
fn sample_document(template: bool) -> Result<Document> {
    let mut doc = Document::new(Step::named("Immunostaining"));
    let root = doc.root();

    let fix = doc.append_new(
        root,
        Step::named("Fix").with_content([
            ContentItem::text("Incubate in 4% PFA for"),
            ContentItem::Parameter(
                Parameter::new(
                    "Time",
                    ParamKind::Number {
                        units: Some("min".to_string()),
                    },
                )
                .with_values([ParamValue::Number(15.0)]),
            ),
        ]),
    )?;
    doc.append_new(
        fix,
        Step::named("Rinse").with_content([ContentItem::text("Rinse twice in PBS")]),
    )?;
    doc.append_new(
        root,
        Step::named("Block").with_content([ContentItem::Parameter(
            Parameter::new("Buffer", ParamKind::Text)
                .with_values([ParamValue::Text("5% BSA".to_string())]),
        )]),
    )?;

    if !template {
        doc.set_experiment_info(Some(ExperimentInfo::new()))?;
    }
    Ok(doc)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    init_logging(&config);

    let document = sample_document(cli.template).context("Failed to build sample protocol")?;
    let mut session = EditorSession::new(document, RecordingView::new(), &config);
    let mut handler = CommandHandler::new();

    let interactive = io::stdin().is_terminal();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", render_outline(session.document(), &[]))?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read input")?;

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {}", err)?;
                continue;
            }
        };

        match handler.execute(command, &mut session) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Message(message)) => writeln!(out, "{}", message.trim_end())?,
            Err(err) => writeln!(out, "error: {:#}", err)?,
        }
        // The line driver has no consumer for view events; only count them.
        let events = session.view_mut().take_events();
        tracing::trace!(events = events.len(), "view notified");
    }

    let selection = session.view().selected_steps();
    tracing::debug!(selected = selection.len(), edits = session.history().len(), "exiting");
    Ok(())
}
