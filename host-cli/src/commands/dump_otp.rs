use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use handheld::otp;
use handheld::volume::Volume;
use handheld::Handheld;

/// Dump the one-time-programmable region to `outfile`, already rotated
/// into its linear layout.
pub fn run<V: Volume>(handheld: &mut Handheld<V>, outfile: &Path, checksum: bool) -> Result<()> {
    let image = handheld
        .read_otp()
        .context("failed to read the OTP region")?;
    fs::write(outfile, &image)
        .with_context(|| format!("unable to write {}", outfile.display()))?;
    if checksum {
        println!("Checksum: {:X}", otp::byte_checksum(&image));
    }
    Ok(())
}
