//! folio - portfolio dashboard widget layout and response cache
//!
//! A command-line front end over the persisted widget layout, the expiring
//! response cache, and the cached stock and sports feeds.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use folio::app::App;
use folio::cli::{Cli, StartupConfig};
use folio::session::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli);

    // Logs go to stderr so command output stays clean
    FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let session = Session::open(config.data_dir.clone());
    let mut app = App::new(session, &config);

    let mut stdout = io::stdout().lock();
    if let Err(e) = app.run(cli.command, &mut stdout).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    stdout.flush()?;

    Ok(())
}
