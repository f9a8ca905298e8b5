//! Command dispatch for folio
//!
//! This module runs a parsed command against the session's stores and
//! writes human-readable results to the given output.

use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheError;
use crate::cli::{
    parse_json_arg, parse_size_arg, parse_sport_arg, CacheCommand, CliError, Command,
    LayoutCommand, StartupConfig,
};
use crate::feeds::{format_price, FeedError, Score, SportsClient, StockClient};
use crate::layout::{validate_layouts, LayoutError, WidgetLayout};
use crate::session::Session;

/// Anything that can stop a command
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Main application struct tying the session to its configuration
pub struct App {
    session: Session,
    api_base_url: String,
}

impl App {
    pub fn new(session: Session, config: &StartupConfig) -> Self {
        Self {
            session,
            api_base_url: config.api_base_url.clone(),
        }
    }

    /// Gives access to the stores, e.g. for inspection after a command
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs one command, writing its results to `out`
    pub async fn run(&mut self, command: Command, out: &mut impl Write) -> Result<(), AppError> {
        match command {
            Command::Layout(cmd) => self.run_layout(cmd, out),
            Command::Cache(cmd) => self.run_cache(cmd, out),
            Command::Stocks { symbols } => self.run_stocks(&symbols, out).await,
            Command::Sports { sport } => self.run_sports(&sport, out).await,
        }
    }

    fn run_layout(&mut self, command: LayoutCommand, out: &mut impl Write) -> Result<(), AppError> {
        let store = &mut self.session.layouts;

        match command {
            LayoutCommand::Show { json } => {
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(store.layouts())?)?;
                } else {
                    write_layout_table(store.layouts(), out)?;
                }
            }
            LayoutCommand::Reset => {
                store.reset_layouts();
                writeln!(out, "Layout reset to default")?;
            }
            LayoutCommand::Resize { id, size } => {
                let size = parse_size_arg(&size)?;
                if store.update_widget_size(&id, size) {
                    let (w, h) = size.dimensions();
                    writeln!(out, "Resized {} to {} ({}x{})", id, size, w, h)?;
                } else {
                    writeln!(out, "No widget named '{}'; layout unchanged", id)?;
                }
            }
            LayoutCommand::Move { id, x, y } => {
                let mut layouts = store.layouts().to_vec();
                let layout = layouts
                    .iter_mut()
                    .find(|layout| layout.id == id)
                    .ok_or_else(|| LayoutError::UnknownWidget(id.clone()))?;
                layout.x = x;
                layout.y = y;

                validate_layouts(&layouts)?;
                store.update_layouts(layouts);
                writeln!(out, "Moved {} to ({}, {})", id, x, y)?;
            }
        }
        Ok(())
    }

    fn run_cache(&self, command: CacheCommand, out: &mut impl Write) -> Result<(), AppError> {
        let cache = &self.session.cache;

        match command {
            CacheCommand::Get { key, ttl_ms } => {
                let ttl = ttl_ms.map(Duration::from_millis).unwrap_or(Duration::MAX);
                match cache.entry::<serde_json::Value>(&key, ttl) {
                    Some(hit) => {
                        writeln!(out, "{}", serde_json::to_string_pretty(&hit.data)?)?;
                    }
                    None => writeln!(out, "(no value)")?,
                }
            }
            CacheCommand::Set { key, value } => {
                let value = parse_json_arg(&value)?;
                cache.set(&key, &value)?;
                writeln!(out, "Stored {}", key)?;
            }
            CacheCommand::Remove { key } => {
                cache.remove(&key)?;
                writeln!(out, "Removed {}", key)?;
            }
            CacheCommand::Clear => {
                cache.clear()?;
                writeln!(out, "Cache cleared")?;
            }
            CacheCommand::List => {
                for key in cache.keys()? {
                    writeln!(out, "{}", key)?;
                }
            }
        }
        Ok(())
    }

    async fn run_stocks(&self, symbols: &[String], out: &mut impl Write) -> Result<(), AppError> {
        let client = StockClient::new(&self.session.cache).with_base_url(self.api_base_url.as_str());

        for (symbol, result) in symbols.iter().zip(client.quotes(symbols).await) {
            match result {
                Ok(quote) => writeln!(
                    out,
                    "{:<6} {:>10} {:>+8.2} ({:+.2}%)",
                    quote.symbol,
                    format_price(quote.price),
                    quote.change,
                    quote.change_percent
                )?,
                Err(e) => writeln!(out, "{:<6} unavailable: {}", symbol.to_uppercase(), e)?,
            }
        }
        Ok(())
    }

    async fn run_sports(&self, sport: &str, out: &mut impl Write) -> Result<(), AppError> {
        let sport = parse_sport_arg(sport)?;
        let client = SportsClient::new(&self.session.cache).with_base_url(self.api_base_url.as_str());
        let games = client.games(sport).await?;

        if games.is_empty() {
            writeln!(out, "No {} games today", sport)?;
            return Ok(());
        }

        let favorite = sport.favorite_team();
        for game in &games {
            let marker = if game.involves(favorite) { '*' } else { ' ' };
            let score = |score: &Option<Score>| {
                score.as_ref().map_or_else(|| "-".to_string(), |s| s.to_string())
            };
            writeln!(
                out,
                "{} {:<4} {:>3} @ {:<4} {:>3}  {}",
                marker,
                game.away_team,
                score(&game.away_team_score),
                game.home_team,
                score(&game.home_team_score),
                game.status
            )?;
        }
        Ok(())
    }
}

fn write_layout_table(layouts: &[WidgetLayout], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:<10} {:>3} {:>3} {:>3} {:>3}", "WIDGET", "X", "Y", "W", "H")?;
    for layout in layouts {
        writeln!(
            out,
            "{:<10} {:>3} {:>3} {:>3} {:>3}",
            layout.id, layout.x, layout.y, layout.w, layout.h
        )?;
    }
    Ok(())
}
