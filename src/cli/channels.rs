//! Channel listing command

use colored::Colorize;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::Result;
use crate::models::ChannelDisplay;
use crate::output;
use crate::playlist::fetch_channels;

/// Run the channels command
pub async fn run(opts: &GlobalOptions, url: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let channels = fetch_channels(ctx.fetcher.as_ref(), url).await;
    let rows: Vec<ChannelDisplay> = channels.iter().map(ChannelDisplay::from).collect();

    output::print_rows(&rows, ctx.format)?;

    if ctx.format == OutputFormat::Pretty && !rows.is_empty() {
        let groups: std::collections::BTreeSet<&str> =
            channels.iter().map(|c| c.group.as_str()).collect();
        println!(
            "{}",
            format!("{} channels in {} groups", rows.len(), groups.len()).dimmed()
        );
    }

    Ok(())
}
