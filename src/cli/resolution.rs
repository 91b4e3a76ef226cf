//! Resolution probing command

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;
use crate::models::ResolutionDisplay;
use crate::output;

/// Run the resolution command
pub async fn run(opts: &GlobalOptions, urls: &[String], concurrency: usize) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let labels = ctx.resolver.resolve_all(urls, concurrency).await;
    let rows: Vec<ResolutionDisplay> = urls
        .iter()
        .zip(labels)
        .map(|(url, label)| ResolutionDisplay::new(url.as_str(), label))
        .collect();

    output::print_rows(&rows, ctx.format)
}
