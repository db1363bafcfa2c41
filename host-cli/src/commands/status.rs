use std::io::{self, Write};

use anyhow::{Context, Result};

use handheld::layout::{PAGE_SIZE, SETTINGS_PAGE};
use handheld::settings::SettingsPage;
use handheld::volume::Volume;
use handheld::Handheld;

use crate::discovery;

/// List every connected handheld with its firmware version and character.
pub fn run() -> Result<()> {
    let handhelds = discovery::discover_handhelds()?;
    report(handhelds, &mut io::stdout(), &mut io::stderr())
}

/// Write one line per device to `out`. The count goes to `err` so the
/// per-device lines stay easy to process with shell pipelines.
pub fn report<V: Volume>(
    mut handhelds: Vec<Handheld<V>>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    writeln!(err, "Handhelds connected: {}", handhelds.len())?;
    for handheld in &mut handhelds {
        match describe(handheld) {
            Ok(line) => writeln!(out, "{line}")?,
            // One unreadable device should not hide the others.
            Err(error) => writeln!(err, "{}: {error:#}", handheld.path())?,
        }
    }
    Ok(())
}

/// One status line for a single device, read from its settings page.
pub fn describe<V: Volume>(handheld: &mut Handheld<V>) -> Result<String> {
    let mut page = vec![0u8; PAGE_SIZE];
    handheld
        .read_page(SETTINGS_PAGE, &mut page)
        .context("failed to read the settings page")?;
    let settings = SettingsPage::from_bytes(page).context("settings page has the wrong size")?;
    let (major, minor) = settings.version();
    Ok(format!(
        "Device: {}; Version: {major}.{minor:02}; Character: {}",
        handheld.path(),
        settings.unit_name()
    ))
}
