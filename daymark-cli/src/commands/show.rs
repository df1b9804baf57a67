use anyhow::Result;
use daymark_core::{CalendarGridProjector, MonthKey, SyncSettings};
use owo_colors::OwoColorize;

use super::{load_month, today};
use crate::render::render_month;

pub async fn run(settings: SyncSettings, month: MonthKey) -> Result<()> {
    let loaded = load_month(&settings, month).await?;

    let projector = CalendarGridProjector::new(settings.namespaces.clone(), settings.week_start);
    let cells = projector.project(loaded.month, &loaded.cache, today());
    println!(
        "{}",
        render_month(month, &cells, settings.week_start, settings.namespaces.named())
    );

    if loaded.failed() {
        println!();
        println!(
            "{}",
            format!("Could not load availability from {}", settings.base_url).red()
        );
    }

    Ok(())
}
