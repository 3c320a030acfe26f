use std::sync::Arc;

use anyhow::{Context, Result};
use solalm_core::Session;
use solalm_llm::GeminiAdapter;
use tracing_subscriber::EnvFilter;

use crate::opts::GlobalOpts;

/// Load `.env` from the working directory without overriding existing
/// environment variables.
pub fn load_dotenv() -> Result<()> {
    let env_path = std::env::current_dir()
        .context("get current directory")?
        .join(".env");
    if env_path.exists() {
        for item in dotenvy::from_path_iter(&env_path).context("load .env")? {
            let (key, val) = item.context("parse .env")?;
            if std::env::var_os(&key).is_none() {
                // SAFETY: called from `main` before any other thread is spawned.
                unsafe {
                    std::env::set_var(&key, &val);
                }
            }
        }
    }
    Ok(())
}

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();
}

/// Build a session backed by the Gemini adapter for both providers.
pub fn open_session(opts: &GlobalOpts) -> Result<Session> {
    let config = opts.session_config()?;
    let adapter = Arc::new(GeminiAdapter::from_env().context("configure Gemini client")?);
    tracing::debug!(?adapter, "gemini adapter configured");
    Session::builder(adapter.clone(), adapter)
        .config(config)
        .build()
        .context("open session state")
}

/// Display form used for every amount and total.
pub fn sol(amount: f64) -> String {
    format!("{amount:.4} SOL")
}
