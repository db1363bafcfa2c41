use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use handheld::layout::{FLASH_SIZE, PAGE_COUNT, PAGE_SIZE};
use handheld::volume::Volume;
use handheld::Handheld;

use super::retry_page_op;
use crate::progress::ProgressLine;

/// Write a full flash image to the device, page by page.
///
/// A mirror file holding a known copy of the device's flash lets us skip
/// pages that cannot have changed; `check_changes` does the same by reading
/// each page back first, trading reads for writes. After a complete load
/// the mirror is brought up to date with the image just written.
pub fn run<V: Volume>(
    handheld: &mut Handheld<V>,
    infile: &Path,
    mirror: Option<&Path>,
    check_changes: bool,
) -> Result<()> {
    let image = fs::read(infile)
        .with_context(|| format!("unable to read flash image {}", infile.display()))?;
    if image.len() != FLASH_SIZE {
        bail!(
            "{} is {} bytes; a flash image must be exactly {FLASH_SIZE} bytes",
            infile.display(),
            image.len()
        );
    }

    let mirror_image = match mirror {
        Some(path) => match fs::read(path) {
            Ok(bytes) if bytes.len() == FLASH_SIZE => Some(bytes),
            Ok(bytes) => bail!(
                "mirror {} is {} bytes; expected {FLASH_SIZE}",
                path.display(),
                bytes.len()
            ),
            // A missing mirror just means every page gets written.
            Err(_) => None,
        },
        None => None,
    };

    let progress = ProgressLine::new();
    let mut readback = vec![0u8; PAGE_SIZE];

    for page in 0..PAGE_COUNT {
        progress.update("Writing", page, PAGE_COUNT);

        let start = page as usize * PAGE_SIZE;
        let payload = &image[start..start + PAGE_SIZE];

        if let Some(known) = &mirror_image {
            if &known[start..start + PAGE_SIZE] == payload {
                continue;
            }
        }

        retry_page_op("Writing", page, || {
            if check_changes {
                handheld.read_page(page, &mut readback)?;
                if readback == payload {
                    return Ok(());
                }
            }
            handheld.write_page(page, payload)?;
            Ok(())
        })
        .with_context(|| format!("writing page {page} failed too many times"))?;
    }

    progress.finish();

    if let Some(path) = mirror {
        fs::write(path, &image)
            .with_context(|| format!("failed to update mirror {}", path.display()))?;
    }

    Ok(())
}
