//! `solalm run` command: a line-oriented interactive session.

use std::io::Write;

use anyhow::{Context, Result, bail};
use serde_json::json;
use solalm_core::{Amount, Session, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::connect::report_identity;
use super::donate::{donate_and_report, preset_amount};
use super::featured::report_featured;
use crate::opts::GlobalOpts;
use crate::output::print_success;
use crate::util::{open_session, sol};

const HELP: &str = "\
commands:
  donate <amount>   donate an amount in SOL
  preset <1-4>      donate a preset amount (0.1, 0.5, 1, 2.5)
  connect           mint a new contributor address
  disconnect        forget the current address
  whoami            show the current address
  leaderboard       totals per address, largest first
  ledger            every recorded donation, oldest first
  featured          show the featured verse
  help              show this message
  quit              leave the session";

#[derive(Debug, Clone, PartialEq)]
enum SessionCommand {
    Donate(Amount),
    Connect,
    Disconnect,
    WhoAmI,
    Leaderboard,
    Ledger,
    Featured,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse one input line. Blank lines yield `None`.
    fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("too many arguments to '{head}'");
        }
        let command = match (head.to_ascii_lowercase().as_str(), arg) {
            ("donate", Some(raw)) => SessionCommand::Donate(raw.parse()?),
            ("donate", None) => bail!("usage: donate <amount>"),
            ("preset", Some(raw)) => {
                let index: u8 = raw
                    .parse()
                    .with_context(|| format!("'{raw}' is not a preset number"))?;
                SessionCommand::Donate(preset_amount(index)?)
            }
            ("preset", None) => bail!("usage: preset <1-4>"),
            ("connect", None) => SessionCommand::Connect,
            ("disconnect", None) => SessionCommand::Disconnect,
            ("whoami", None) => SessionCommand::WhoAmI,
            ("leaderboard", None) => SessionCommand::Leaderboard,
            ("ledger", None) => SessionCommand::Ledger,
            ("featured", None) => SessionCommand::Featured,
            ("help", None) => SessionCommand::Help,
            ("quit" | "exit", None) => SessionCommand::Quit,
            (_, Some(_)) => bail!("'{head}' takes no arguments"),
            (other, None) => bail!("unknown command '{other}'; type 'help'"),
        };
        Ok(Some(command))
    }
}

pub async fn cmd_run(opts: &GlobalOpts) -> Result<()> {
    let session = open_session(opts)?;
    let timer = session.spawn_refresh_timer();
    tracing::info!(ttl = ?session.config().featured_ttl, "featured verse refresh timer started");

    report_featured(opts, &session).await?;
    if !opts.wants_json() && !opts.quiet {
        eprintln!("type 'help' for commands");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !opts.wants_json() {
            print!("> ");
            std::io::stdout().flush().context("flush stdout")?;
        }
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down...");
                break;
            }
            line = lines.next_line() => line.context("read stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        let command = match SessionCommand::parse(&line) {
            Ok(Some(SessionCommand::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("error: {err:#}");
                continue;
            }
        };
        if let Err(err) = execute(opts, &session, command).await {
            eprintln!("error: {err:#}");
            if let Some(hint) = retry_hint(&err) {
                eprintln!("{hint}");
            }
        }
    }

    timer.abort();
    Ok(())
}

async fn execute(opts: &GlobalOpts, session: &Session, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Donate(amount) => donate_and_report(opts, session, amount, None).await,
        SessionCommand::Connect => report_identity(opts, Some(&session.connect())),
        SessionCommand::Disconnect => {
            session.disconnect();
            report_identity(opts, None)
        }
        SessionCommand::WhoAmI => report_identity(opts, session.identity().as_ref()),
        SessionCommand::Leaderboard => report_leaderboard(opts, session),
        SessionCommand::Ledger => report_ledger(opts, session),
        SessionCommand::Featured => report_featured(opts, &session).await,
        SessionCommand::Help => print_success(opts, json!(HELP), None, vec![]),
        SessionCommand::Quit => Ok(()),
    }
}

/// Suggest another attempt when the failure came from a transient provider error.
fn retry_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::Pipeline(failure)) if failure.retryable() => {
            Some("nothing was recorded; the service may recover, try again")
        }
        _ => None,
    }
}

fn report_leaderboard(opts: &GlobalOpts, session: &Session) -> Result<()> {
    let entries = session.leaderboard();
    let human = if entries.is_empty() {
        "No donations yet".to_string()
    } else {
        entries
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                format!(
                    "{:>3}. {}  {}",
                    rank + 1,
                    entry.address.short(),
                    sol(entry.total_amount.value())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    print_success(opts, json!({ "leaderboard": entries }), Some(human), vec![])
}

fn report_ledger(opts: &GlobalOpts, session: &Session) -> Result<()> {
    let contributions = session.contributions();
    let human = if contributions.is_empty() {
        "No donations yet".to_string()
    } else {
        contributions
            .iter()
            .map(|c| format!("{}  {}  {}", c.id, c.address.short(), sol(c.amount.value())))
            .collect::<Vec<_>>()
            .join("\n")
    };
    print_success(opts, json!({ "contributions": contributions }), Some(human), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<SessionCommand> {
        SessionCommand::parse(line).unwrap()
    }

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(parse("  "), None);
        assert_eq!(parse("LEADERBOARD"), Some(SessionCommand::Leaderboard));
        assert_eq!(parse("exit"), Some(SessionCommand::Quit));
        assert_eq!(
            parse("donate 0.5"),
            Some(SessionCommand::Donate(Amount::new(0.5).unwrap()))
        );
        assert_eq!(
            parse("preset 4"),
            Some(SessionCommand::Donate(Amount::new(2.5).unwrap()))
        );
    }

    #[test]
    fn retry_hint_only_for_transient_provider_failures() {
        use solalm_core::PipelineError;
        use solalm_llm::{LlmError, NoObjectGeneratedError, ProviderError, ProviderErrorKind};

        let transient = anyhow::Error::new(SessionError::Pipeline(PipelineError::FragmentFetch(
            LlmError::Provider(ProviderError::new("gemini", ProviderErrorKind::Server, "boom")),
        )));
        assert!(retry_hint(&transient).is_some());

        let permanent = anyhow::Error::new(SessionError::Pipeline(
            PipelineError::ImageGeneration(LlmError::NoObjectGenerated(
                NoObjectGeneratedError::new("No image was generated."),
            )),
        ));
        assert!(retry_hint(&permanent).is_none());
        assert!(retry_hint(&anyhow::anyhow!("other")).is_none());
    }

    #[test]
    fn rejects_bad_amounts_and_arguments() {
        assert!(SessionCommand::parse("donate 0").is_err());
        assert!(SessionCommand::parse("donate lots").is_err());
        assert!(SessionCommand::parse("donate").is_err());
        assert!(SessionCommand::parse("preset 9").is_err());
        assert!(SessionCommand::parse("whoami now").is_err());
        assert!(SessionCommand::parse("dance").is_err());
    }
}
