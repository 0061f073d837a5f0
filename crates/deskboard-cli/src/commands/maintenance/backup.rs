use std::path::Path;

use crate::app::{missing_store_error, AppContext};
use crate::output::print_receipt;
use crate::ui::{badge, print, Badge};

pub fn handle_backup(ctx: &AppContext, destination: &str) -> anyhow::Result<()> {
    let source = ctx.store_path()?;
    if !source.exists() {
        return Err(missing_store_error(&source).into());
    }

    let ui = ctx.ui_context(false, None);

    if ctx.interactive() && !ctx.quiet() {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!("Back up the store to {}?", destination))
            .default(true)
            .interact()?;
        if !proceed {
            print(&ui, &badge(&ui, Badge::Warn, "Backup cancelled"));
            return Err(anyhow::anyhow!("Backup cancelled"));
        }
    }

    let destination_path = Path::new(destination);
    let bytes = deskboard_core::fs::copy_atomic(&source, destination_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to back up {} to {}: {}",
            source.display(),
            destination_path.display(),
            e
        )
    })?;
    if bytes == 0 {
        return Err(anyhow::anyhow!("Backup failed: zero bytes written"));
    }
    log::debug!("backed up {} bytes to {}", bytes, destination_path.display());

    let bytes = bytes.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Backup written",
        &[("Destination", destination), ("Bytes", &bytes)],
    );
    Ok(())
}
