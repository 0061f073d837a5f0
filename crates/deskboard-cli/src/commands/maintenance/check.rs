use deskboard_core::StorageEngine;

use crate::app::AppContext;
use crate::errors::CliError;
use crate::ui::{badge, hint, print, Badge, OutputMode};

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let (storage, _passphrase) = ctx.open_storage()?;
    let ui = ctx.ui_context(false, None);

    match storage.check_integrity() {
        Ok(()) => {
            if !ctx.quiet() {
                match ui.mode {
                    OutputMode::Pretty => {
                        print(&ui, &badge(&ui, Badge::Ok, "Integrity check: OK"));
                    }
                    OutputMode::Plain | OutputMode::Json => println!("status=ok"),
                }
            }
            Ok(())
        }
        Err(err) => {
            log::debug!("integrity check failed: {}", err);
            if ui.mode.is_pretty() {
                print(&ui, &badge(&ui, Badge::Err, "Integrity check failed"));
                print(
                    &ui,
                    &hint(&ui, "Restore from a backup or export your records before retrying."),
                );
            } else {
                eprintln!("status=failed");
            }
            Err(CliError::IntegrityFailed(err.to_string()).into())
        }
    }
}
