//! `interplay serve --stdio`

use anyhow::Result;
use interplay_bridge::transport::stdio::serve_stdio;
use interplay_bridge::PreviewHost;

pub fn run_stdio() -> Result<()> {
    let host = serve_stdio(PreviewHost::new())?;
    tracing::info!(
        events = host.events.len(),
        chat = host.chat_log.len(),
        "stdio host finished"
    );
    Ok(())
}
