// ============================================================
// Layer 6 — Tracing Setup
// ============================================================
// RUST_LOG still wins for anything it names; this crate logs
// at info by default.

use anyhow::{Context, Result};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// `RUST_LOG` plus `char_mgru_rte=info`.
fn default_filter() -> Result<EnvFilter> {
    let directive = "char_mgru_rte=info"
        .parse::<Directive>()
        .context("Invalid default tracing directive")?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` plus `char_mgru_rte=info`.
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter()?)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Cannot install tracing subscriber: {e}"))
}
