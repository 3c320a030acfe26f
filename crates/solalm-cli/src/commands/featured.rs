//! `solalm featured` command.

use anyhow::Result;
use serde_json::json;
use solalm_core::{Session, TextFragment};

use crate::opts::GlobalOpts;
use crate::output::print_success;
use crate::util::open_session;

pub async fn cmd_featured(opts: &GlobalOpts) -> Result<()> {
    let session = open_session(opts)?;
    report_featured(opts, &session).await
}

/// Print the featured fragment and when it was fetched.
pub async fn report_featured(opts: &GlobalOpts, session: &Session) -> Result<()> {
    let fragment = session.featured().await;
    let fetched_at = session.featured_fetched_at_ms();
    print_success(
        opts,
        json!({ "featured": fragment, "fetchedAtEpochMs": fetched_at }),
        Some(render_fragment(&fragment)),
        vec![],
    )
}

pub fn render_fragment(fragment: &TextFragment) -> String {
    format!("\"{}\"\n    {}", fragment.text, fragment.reference)
}
