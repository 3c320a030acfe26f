//! `solalm connect` command.

use anyhow::Result;
use serde_json::json;
use solalm_core::{Address, AddressGenerator, RandomAddressGenerator};

use crate::opts::GlobalOpts;
use crate::output::print_success;

/// Mint a standalone contributor address. Inside `solalm run` the address
/// becomes the session identity instead.
pub fn cmd_connect(opts: &GlobalOpts) -> Result<()> {
    let address = RandomAddressGenerator::new().generate();
    report_identity(opts, Some(&address))
}

pub fn report_identity(opts: &GlobalOpts, address: Option<&Address>) -> Result<()> {
    let human = match address {
        Some(address) => format!("Connected as {} ({})", address.short(), address),
        None => "Not connected".to_string(),
    };
    print_success(
        opts,
        json!({
            "address": address,
            "short": address.map(Address::short),
        }),
        Some(human),
        vec![],
    )
}
