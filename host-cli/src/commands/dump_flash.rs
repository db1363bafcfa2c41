use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use handheld::layout::{PAGE_COUNT, PAGE_SIZE};
use handheld::volume::Volume;
use handheld::Handheld;

use super::retry_page_op;
use crate::progress::ProgressLine;

/// Read the full flash, page by page, into `outfile`.
pub fn run<V: Volume>(handheld: &mut Handheld<V>, outfile: &Path) -> Result<()> {
    let mut out = File::create(outfile)
        .with_context(|| format!("unable to open {} for writing", outfile.display()))?;

    let progress = ProgressLine::new();
    let mut page_buf = vec![0u8; PAGE_SIZE];

    for page in 0..PAGE_COUNT {
        progress.update("Reading", page, PAGE_COUNT);
        retry_page_op("Reading", page, || handheld.read_page(page, &mut page_buf))
            .with_context(|| format!("reading page {page} failed too many times"))?;
        out.write_all(&page_buf)
            .with_context(|| format!("failed to write page {page} to the image"))?;
    }

    progress.finish();
    Ok(())
}
