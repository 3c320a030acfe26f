//! `solalm info` command.

use anyhow::Result;
use serde_json::json;
use solalm_core::{Address, PRESET_AMOUNTS};
use solalm_llm::GeminiAdapterConfig;

use crate::opts::GlobalOpts;
use crate::output::print_success;
use crate::util::sol;

pub fn cmd_info(opts: &GlobalOpts) -> Result<()> {
    let config = opts.session_config()?;
    let mut warnings = vec![];

    let gemini = GeminiAdapterConfig::from_env();
    if gemini.is_none() {
        warnings.push("GEMINI_API_KEY is not set; featured, donate and run will fail".into());
    }

    let donation_address = Address::new(config.donation_address.clone());
    let data = json!({
        "donationAddress": donation_address,
        "presets": PRESET_AMOUNTS,
        "featuredTtlSecs": config.featured_ttl.as_secs(),
        "settleDelayMs": config.settle_delay.as_millis() as u64,
        "stateDir": config.state_dir,
        "gemini": gemini.as_ref().map(|g| json!({
            "baseUrl": g.base_url,
            "textModel": g.text_model,
            "imageModel": g.image_model,
        })),
    });

    let presets: Vec<String> = PRESET_AMOUNTS.iter().map(|p| sol(*p)).collect();
    let mut human = format!(
        "Donation address: {} ({})\nPresets: {}\nFeatured verse refresh: every {}s\n",
        donation_address,
        donation_address.short(),
        presets.join(", "),
        config.featured_ttl.as_secs(),
    );
    match &config.state_dir {
        Some(dir) => human.push_str(&format!("State dir: {}", dir.display())),
        None => human.push_str("State dir: none (featured verse kept in memory)"),
    }

    print_success(opts, data, Some(human), warnings)
}
