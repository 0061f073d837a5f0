//! Deskboard CLI - an encrypted, single-file business dashboard
//!
//! This is the command-line interface for Deskboard. It parses arguments,
//! opens the store for the session user and hands off to the command
//! handlers, which call into `deskboard-core`.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use deskboard_core::VERSION;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{
    dashboard, gtci, init, leave, maintenance, matters, meetings, misc, networth, notes, projects,
    records, users, workflow,
};
use crate::errors::{exit_code_for, CliError};
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context(false, None);
        let (message, hint) = split_error(&e);
        print_error(&ui_ctx, &message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

/// Logs go to stderr. `DESKBOARD_LOG` takes env_logger filter syntax;
/// `--verbose` forces debug.
fn init_logging(verbose: bool) {
    let env = env_logger::Env::new().filter_or("DESKBOARD_LOG", "warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

/// Separate the message from its hint so the hint is printed once.
fn split_error(err: &anyhow::Error) -> (String, Option<String>) {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        match cli {
            CliError::NotFound { message, hint } => {
                return (message.clone(), Some(hint.clone()));
            }
            CliError::AuthFailed { message, hint } => return (message.clone(), hint.clone()),
            _ => {}
        }
    }
    let text = format!("{:#}", err);
    match text.find("\nHint:") {
        Some(idx) => (text[..idx].to_string(), Some(text[idx + 1..].to_string())),
        None => {
            let hint = extract_error_hint(&text);
            (text, hint)
        }
    }
}

/// Contextual hints for common errors that carry none of their own.
fn extract_error_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("matter") && error_lower.contains("not found") {
        return Some("Hint: Run `deskboard matter list` to find matter IDs.".to_string());
    }

    if error_lower.contains("project") && error_lower.contains("not found") {
        return Some("Hint: Run `deskboard project list` to find project IDs.".to_string());
    }

    if error_lower.contains("invalid date") {
        return Some(
            "Hint: Dates are YYYY-MM-DD, or one of today, yesterday, tomorrow.".to_string(),
        );
    }

    if error_lower.contains("incorrect passphrase") || error_lower.contains("decryption failed") {
        return Some(
            "Hint: Check your passphrase, or set DESKBOARD_PASSPHRASE for scripted use."
                .to_string(),
        );
    }

    if error_lower.contains("integrity") && error_lower.contains("failed") {
        return Some(
            "Hint: Restore from a backup made with `deskboard backup <DEST>`.".to_string(),
        );
    }

    if error_lower.contains("timezone") {
        return Some(
            "Hint: Use an IANA name such as Europe/London or America/New_York.".to_string(),
        );
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args)?,
        Some(Commands::User(command)) => users::handle(ctx, command)?,
        Some(Commands::Matter(command)) => matters::handle(ctx, command)?,
        Some(Commands::Leave(command)) => leave::handle(ctx, command)?,
        Some(Commands::Meeting(command)) => meetings::handle(ctx, command)?,
        Some(Commands::Note(command)) => notes::handle(ctx, command)?,
        Some(Commands::NetWorth(command)) => networth::handle(ctx, command)?,
        Some(Commands::Project(command)) => projects::handle(ctx, command)?,
        Some(Commands::Workflow(command)) => workflow::handle(ctx, command)?,
        Some(Commands::Gtci(command)) => gtci::handle(ctx, command)?,
        Some(Commands::Dashboard(output)) => dashboard::handle_dashboard(ctx, output)?,
        Some(Commands::Search {
            query,
            kind,
            limit,
            output,
        }) => records::handle_search(ctx, query, kind.as_deref(), *limit, output)?,
        Some(Commands::Export { format, kind }) => {
            records::handle_export(ctx, *format, kind.as_deref())?
        }
        Some(Commands::Check) => maintenance::handle_check(ctx)?,
        Some(Commands::Backup { destination }) => maintenance::handle_backup(ctx, destination)?,
        Some(Commands::Completions { shell }) => misc::handle_completions(*shell)?,
        None => {
            println!("Deskboard v{}", VERSION);
            println!("\nQuickstart:");
            println!("  deskboard init");
            println!("  deskboard matter add M-001 \"Acme Ltd\"");
            println!("  deskboard networth add asset Brokerage 1200.00");
            println!("  deskboard dashboard");
            println!("\nRun `deskboard --help` for full usage.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_error_keeps_hint_out_of_message() {
        let err: anyhow::Error = CliError::not_found("No store found", "Hint: Run init.").into();
        let (message, hint) = split_error(&err);
        assert_eq!(message, "No store found");
        assert_eq!(hint.as_deref(), Some("Hint: Run init."));
    }

    #[test]
    fn test_split_error_finds_inline_hint() {
        let err = anyhow::anyhow!("Something broke\nHint: Try again.");
        let (message, hint) = split_error(&err);
        assert_eq!(message, "Something broke");
        assert_eq!(hint.as_deref(), Some("Hint: Try again."));
    }

    #[test]
    fn test_contextual_hint_for_bad_date() {
        let hint = extract_error_hint("Invalid date (expected YYYY-MM-DD): 2025-13-01");
        assert!(hint.is_some_and(|h| h.contains("YYYY-MM-DD")));
    }
}
