//! Finding connected handhelds among the system's block devices.

use std::fs::File;

use anyhow::{bail, Context, Result};
use handheld::volume::Volume;
use handheld::Handheld;

/// Open every candidate block device and keep those that pass the identity
/// probe. Candidates that cannot be opened (no permission, gone again) are
/// silently skipped.
pub fn discover_handhelds() -> Result<Vec<Handheld<File>>> {
    let mut found = Vec::new();
    for path in candidate_paths()? {
        let Ok(mut candidate) = Handheld::open(path) else {
            continue;
        };
        if candidate.is_handheld() {
            found.push(candidate);
        }
    }
    Ok(found)
}

/// SCSI disks, whole devices and partitions alike.
#[cfg(unix)]
fn candidate_paths() -> Result<Vec<String>> {
    let entries = glob::glob("/dev/sd*").context("failed to enumerate SCSI disks")?;
    Ok(entries
        .flatten()
        .map(|path| path.to_string_lossy().into_owned())
        .collect())
}

/// Raw volume paths for every possible drive letter; letters without a
/// mounted volume simply fail to open and are skipped by the caller.
#[cfg(windows)]
fn candidate_paths() -> Result<Vec<String>> {
    Ok(('A'..='Z').map(|letter| format!(r"\\.\{letter}:")).collect())
}

/// Pick the handheld an operation should target. With several connected the
/// caller must name one; with exactly one, no selection is needed.
pub fn select_target<V: Volume>(
    mut handhelds: Vec<Handheld<V>>,
    device: Option<&str>,
) -> Result<Handheld<V>> {
    if handhelds.is_empty() {
        bail!("No handhelds are connected.");
    }

    match device {
        Some(path) => {
            let index = handhelds
                .iter()
                .position(|handheld| handheld.path() == path)
                .with_context(|| format!("No handheld was found at {path}."))?;
            Ok(handhelds.swap_remove(index))
        }
        None if handhelds.len() == 1 => Ok(handhelds.remove(0)),
        None => bail!(
            "{} handhelds are connected. Specify one with --device.",
            handhelds.len()
        ),
    }
}

/// Discover and select in one step.
pub fn find_target(device: Option<&str>) -> Result<Handheld<File>> {
    select_target(discover_handhelds()?, device)
}
