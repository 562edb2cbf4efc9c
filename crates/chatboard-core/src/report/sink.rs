//! Where rendered reports go.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use super::Ranking;

/// Destination for rendered report text.
pub trait ReportSink: Send + Sync {
    fn publish(&self, text: &str) -> Result<()>;
}

/// Prints reports to stdout, one blank line between them.
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn publish(&self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", text).context("Failed to write report")?;
        out.flush().context("Failed to write report")
    }
}

/// Send every non-empty ranking to `sink`. Returns how many were sent.
pub fn publish_rankings(sink: &dyn ReportSink, rankings: &[Ranking]) -> Result<usize> {
    let mut sent = 0;
    for ranking in rankings {
        if ranking.is_empty() {
            debug!("Skipping empty report: {}", ranking.title);
            continue;
        }
        sink.publish(&ranking.render())?;
        sent += 1;
    }
    Ok(sent)
}
