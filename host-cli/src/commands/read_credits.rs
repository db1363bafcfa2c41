use anyhow::{Context, Result};

use handheld::layout::{PAGE_SIZE, SETTINGS_PAGE};
use handheld::settings::{CreditsEncoding, SettingsPage};
use handheld::volume::Volume;
use handheld::Handheld;

/// Print the stored credits counter.
pub fn run<V: Volume>(handheld: &mut Handheld<V>, encoding: CreditsEncoding) -> Result<()> {
    println!("{}", read(handheld, encoding)?);
    Ok(())
}

/// Fetch the settings page and decode the credits field.
pub fn read<V: Volume>(handheld: &mut Handheld<V>, encoding: CreditsEncoding) -> Result<u32> {
    let mut page = vec![0u8; PAGE_SIZE];
    handheld
        .read_page(SETTINGS_PAGE, &mut page)
        .context("failed to read the settings page")?;
    let settings = SettingsPage::from_bytes(page).context("settings page has the wrong size")?;
    Ok(settings.credits(encoding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use handheld::settings::CREDITS_OFFSET;
    use handheld::sim::LoopbackVolume;

    #[test]
    fn reads_a_little_endian_hcd_counter() {
        let mut volume = LoopbackVolume::new();
        let start = SETTINGS_PAGE as usize * PAGE_SIZE + CREDITS_OFFSET;
        volume.flash[start..start + 4].copy_from_slice(&[0x78, 0x56, 0x34, 0x12]);
        let mut handheld = Handheld::with_volume("/dev/sim", volume);

        let credits =
            read(&mut handheld, CreditsEncoding::HcdLittleEndian).expect("settings readable");
        assert_eq!(credits, 12_345_678);
    }

    #[test]
    fn the_encodings_read_the_same_bytes_differently() {
        let mut volume = LoopbackVolume::new();
        let start = SETTINGS_PAGE as usize * PAGE_SIZE + CREDITS_OFFSET;
        volume.flash[start..start + 4].copy_from_slice(&[0x00, 0x00, 0x00, 0x42]);
        let mut handheld = Handheld::with_volume("/dev/sim", volume);

        assert_eq!(
            read(&mut handheld, CreditsEncoding::HcdLittleEndian).expect("readable"),
            42_000_000
        );
        assert_eq!(
            read(&mut handheld, CreditsEncoding::HcdBigEndian).expect("readable"),
            42
        );
    }
}
