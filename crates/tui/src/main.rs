mod app;
mod client;
mod config;
mod error;
mod report;
mod ui;

use std::sync::Mutex;

use crate::{
    config::{AppConfig, Command},
    error::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    match command {
        Some(Command::Report { input, year }) => {
            init_tracing(&config, false)?;
            report::run(&config, &input, year)
        }
        None => {
            // The terminal belongs to the UI, so logs go to a file.
            init_tracing(&config, true)?;
            let mut app = app::App::new(config)?;
            app.run().await
        }
    }
}

fn init_tracing(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = format!(
        "finboard={level},engine={level}",
        level = config.log_level
    );
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        subscriber
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }
    Ok(())
}
