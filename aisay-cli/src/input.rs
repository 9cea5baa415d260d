use anyhow::{Context, Result};
use std::io::IsTerminal;
use tokio::io::AsyncReadExt;

/// Text from trailing arguments, or from piped stdin when there are none.
/// An interactive stdin is never read.
pub async fn resolve_text(args: Vec<String>) -> Result<String> {
    let text = args.join(" ");
    if !text.is_empty() || std::io::stdin().is_terminal() {
        return Ok(text);
    }

    let mut piped = String::new();
    tokio::io::stdin()
        .read_to_string(&mut piped)
        .await
        .context("failed to read standard input")?;
    Ok(piped.trim().to_string())
}
