use anyhow::{Context, Result};

use handheld::layout::{PAGE_SIZE, SETTINGS_PAGE};
use handheld::settings::{CreditsEncoding, SettingsPage};
use handheld::volume::Volume;
use handheld::Handheld;

/// Overwrite the credits counter, leaving the rest of the settings page
/// untouched. The page is read, patched, and written back whole.
pub fn run<V: Volume>(
    handheld: &mut Handheld<V>,
    value: u32,
    encoding: CreditsEncoding,
) -> Result<()> {
    let mut page = vec![0u8; PAGE_SIZE];
    handheld
        .read_page(SETTINGS_PAGE, &mut page)
        .context("failed to read the settings page")?;
    let mut settings =
        SettingsPage::from_bytes(page).context("settings page has the wrong size")?;
    settings.set_credits(value, encoding);
    handheld
        .write_page(SETTINGS_PAGE, settings.as_bytes())
        .context("failed to write the settings page back")?;
    println!("Credits set to {value}.");
    Ok(())
}
