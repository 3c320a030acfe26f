//! `solalm donate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::json;
use solalm_core::{Amount, Donation, PRESET_AMOUNTS, Session};

use crate::commands::featured::render_fragment;
use crate::opts::GlobalOpts;
use crate::output::print_success;
use crate::util::{open_session, sol};

#[derive(Args, Debug)]
pub struct DonateArgs {
    /// Amount in SOL, greater than zero
    #[arg(required_unless_present = "preset", conflicts_with = "preset")]
    pub amount: Option<Amount>,

    /// Use a preset amount: 1 = 0.1, 2 = 0.5, 3 = 1, 4 = 2.5
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub preset: Option<u8>,

    /// Write the generated image to this file
    #[arg(long)]
    pub save_image: Option<PathBuf>,
}

impl DonateArgs {
    fn resolve_amount(&self) -> Result<Amount> {
        if let Some(amount) = self.amount {
            return Ok(amount);
        }
        let index = self
            .preset
            .ok_or_else(|| anyhow!("pass an amount or --preset"))?;
        preset_amount(index)
    }
}

pub fn preset_amount(index: u8) -> Result<Amount> {
    let value = usize::from(index)
        .checked_sub(1)
        .and_then(|i| PRESET_AMOUNTS.get(i))
        .ok_or_else(|| anyhow!("preset must be between 1 and {}", PRESET_AMOUNTS.len()))?;
    Ok(Amount::new(*value)?)
}

pub async fn cmd_donate(opts: &GlobalOpts, args: &DonateArgs) -> Result<()> {
    let amount = args.resolve_amount()?;
    let session = open_session(opts)?;
    donate_and_report(opts, &session, amount, args.save_image.as_deref()).await
}

/// Run one donation against `session` and print the outcome.
pub async fn donate_and_report(
    opts: &GlobalOpts,
    session: &Session,
    amount: Amount,
    save_image: Option<&Path>,
) -> Result<()> {
    if !opts.wants_json() && !opts.quiet {
        eprintln!(
            "Sending {} to {}...",
            sol(amount.value()),
            solalm_core::Address::new(session.config().donation_address.clone()).short()
        );
    }
    let donation = session.donate(amount).await?;

    let image_bytes = donation
        .reward
        .image
        .decode_bytes()
        .context("decode generated image")?;
    if let Some(path) = save_image {
        std::fs::write(path, &image_bytes)
            .with_context(|| format!("write image to {}", path.display()))?;
    }
    report_donation(opts, &donation, image_bytes.len(), save_image)
}

fn report_donation(
    opts: &GlobalOpts,
    donation: &Donation,
    image_len: usize,
    saved_to: Option<&Path>,
) -> Result<()> {
    let contribution = &donation.contribution;
    let image = &donation.reward.image;
    let data = json!({
        "contribution": contribution,
        "fragment": donation.reward.fragment,
        "image": {
            "mimeType": image.mime_type,
            "bytes": image_len,
            "savedTo": saved_to,
        },
        "standing": donation.standing,
        "adoptedIdentity": donation.adopted_identity,
    });

    let mut human = format!(
        "Thank you! {} from {} recorded.\n{}\nImage: {}, {} bytes",
        sol(contribution.amount.value()),
        contribution.address.short(),
        render_fragment(&donation.reward.fragment),
        image.mime_type,
        image_len,
    );
    if let Some(path) = saved_to {
        human.push_str(&format!(" (saved to {})", path.display()));
    }
    human.push_str(&format!(
        "\nTotal from {}: {}",
        donation.standing.address.short(),
        sol(donation.standing.total_amount.value())
    ));
    if donation.adopted_identity {
        human.push_str(&format!(
            "\nConnected as {}",
            donation.standing.address.short()
        ));
    }

    print_success(opts, data, Some(human), vec![])
}
