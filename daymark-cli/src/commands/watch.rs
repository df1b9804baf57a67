//! Live month view: re-renders whenever availability, sync progress or the
//! push channel change, and reads navigation commands from stdin.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use daymark_core::{AvailabilitySession, ChannelState, DayStamp, MonthKey, SyncSettings};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::today;
use crate::render::{Render, render_month};
use crate::utils::tui::clear_screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Today,
    Refresh,
    Quit,
    Select(u32),
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Command {
        match line.trim() {
            "n" | "next" => Command::Next,
            "p" | "prev" => Command::Prev,
            "t" | "today" => Command::Today,
            "r" | "refresh" => Command::Refresh,
            "q" | "quit" => Command::Quit,
            other => other.parse().map(Command::Select).unwrap_or(Command::Unknown),
        }
    }
}

pub async fn run(settings: SyncSettings, month: MonthKey) -> Result<()> {
    let session = AvailabilitySession::new(settings)?;

    let selected: Arc<Mutex<Option<DayStamp>>> = Arc::new(Mutex::new(None));
    let on_select = Arc::clone(&selected);
    session.on_day_selected(move |day| {
        if let Ok(mut selected) = on_select.lock() {
            *selected = Some(day.clone());
        }
    });

    session.show_month(month)?;

    let mut revisions = session.cache().subscribe();
    let mut status = session.tracker().subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut channel = session.channel_state();
    let mut notice: Option<String> = None;

    redraw(&session, &selected, notice.as_deref());

    loop {
        tokio::select! {
            changed = revisions.changed() => changed.context("availability cache dropped")?,
            changed = status.changed() => changed.context("sync tracker dropped")?,
            _ = ticker.tick() => {
                let state = session.channel_state();
                if state == channel {
                    continue;
                }
                channel = state;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                notice = None;
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Next => {
                        session.next_month()?;
                    }
                    Command::Prev => {
                        session.prev_month()?;
                    }
                    Command::Today => {
                        session.show_month(MonthKey::from_date(today()))?;
                    }
                    Command::Refresh => {
                        session.refresh();
                    }
                    Command::Select(number) => {
                        let day = session
                            .visible_month()
                            .and_then(|month| month.day(number))
                            .map(DayStamp::from_date);
                        let picked = day.as_ref().is_some_and(|day| session.select_day(day));
                        if !picked {
                            notice = Some(format!("No data on day {number}"));
                        }
                    }
                    Command::Unknown => {
                        notice = Some(format!("Unknown command '{}'", line.trim()));
                    }
                }
            }
        }

        redraw(&session, &selected, notice.as_deref());
    }

    session.shutdown().await;
    Ok(())
}

fn redraw(session: &AvailabilitySession, selected: &Mutex<Option<DayStamp>>, notice: Option<&str>) {
    let Some(month) = session.visible_month() else {
        return;
    };
    let Some(cells) = session.grid(today()) else {
        return;
    };
    let settings = session.settings();

    clear_screen();
    println!(
        "{}",
        render_month(month, &cells, settings.week_start, settings.namespaces.named())
    );
    println!();
    println!("{}", session.sync_status().render());

    let channel = session.channel_state();
    if channel != ChannelState::Connected {
        println!("{}", channel.render());
    }

    if let Some(day) = selected.lock().ok().and_then(|s| s.clone()) {
        println!("Selected {}", day.to_string().bold());
    }
    if let Some(notice) = notice {
        println!("{}", notice.yellow());
    }
    println!();
    println!(
        "{}",
        "n next · p previous · t today · r refresh · <day> select · q quit".dimmed()
    );
}
