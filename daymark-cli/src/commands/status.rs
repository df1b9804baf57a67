use anyhow::Result;
use daymark_core::{MonthKey, NamespaceKey, SyncSettings};
use owo_colors::OwoColorize;

use super::load_month;
use crate::render::{Render, pluralize};

pub async fn run(settings: SyncSettings, month: MonthKey) -> Result<()> {
    let loaded = load_month(&settings, month).await?;

    if loaded.failed() {
        anyhow::bail!("Could not load {month} from {}", settings.base_url);
    }

    println!("{}", loaded.tracker.current().render());
    println!();

    let union = loaded.cache.days(month, &NamespaceKey::union());
    println!(
        "{} {} with data in {}",
        union.len(),
        pluralize("day", union.len()),
        month.to_string().bold()
    );
    for namespace in settings.namespaces.named() {
        let days = loaded.cache.days(month, namespace).len();
        println!("   {}  {}", namespace.as_str().cyan(), days);
    }

    Ok(())
}
