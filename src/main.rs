use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ratatui::DefaultTerminal;
use usergrid::controller::Controller;
use usergrid::dataset::{Dataset, expand_path};
use usergrid::domain::{GridConfig, GridError, Message};
use usergrid::engine::PageSize;
use usergrid::model::{Model, Status};
use usergrid::ui::GridUI;

/// Browse the user table in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// User dataset (.json or .csv). The bundled users are shown when omitted.
    #[arg(short, long)]
    data: Option<String>,

    /// Rows per page: 10, 30 or 50.
    #[arg(short, long, default_value_t = 10)]
    page_size: usize,

    /// Write a trace log to this file. Verbosity is controlled by RUST_LOG.
    #[arg(long)]
    log: Option<String>,

    /// Milliseconds to wait for input before redrawing.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

impl Args {
    fn into_config(self) -> Result<GridConfig, GridError> {
        Ok(GridConfig {
            event_poll_time: self.poll_ms,
            page_size: PageSize::try_from(self.page_size)?,
            data_path: self.data.as_deref().map(expand_path).transpose()?,
            log_path: self.log.as_deref().map(expand_path).transpose()?,
        })
    }
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &Path) -> Result<(), GridError> {
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("usergrid=debug")))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), GridError> {
    let config = Args::parse().into_config()?;
    if let Some(path) = &config.log_path {
        init_logging(path)?;
    }

    let dataset = match &config.data_path {
        Some(path) => Dataset::load(path)?,
        None => Dataset::builtin()?,
    };
    let mut model = Model::new(dataset, &config);
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
) -> Result<(), GridError> {
    let ui = GridUI;
    let size = terminal.size()?;
    model.update(Some(Message::Resize(
        size.width as usize,
        size.height as usize,
    )))?;

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }

    Ok(())
}
