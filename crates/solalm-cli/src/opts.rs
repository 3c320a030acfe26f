//! Global CLI options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use solalm_core::SessionConfig;

/// Options shared by every command. Most can also be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Directory holding the featured verse snapshot (env: SOLALM_STATE_DIR)
    #[arg(long, global = true, env = "SOLALM_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalOpts {
    pub fn wants_json(&self) -> bool {
        self.json || self.pretty
    }

    /// `SOLALM_*` environment settings with command-line overrides applied.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::from_env().context("read session configuration")?;
        if let Some(dir) = &self.state_dir {
            config.state_dir = Some(dir.clone());
        }
        Ok(config)
    }
}
