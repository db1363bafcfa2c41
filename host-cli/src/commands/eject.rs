use anyhow::{bail, Result};

use crate::discovery;

/// Detach handhelds from the bus. With `--device` only that one is ejected;
/// otherwise every connected handheld is.
pub fn run(device: Option<&str>) -> Result<()> {
    let handhelds = discovery::discover_handhelds()?;
    if handhelds.is_empty() {
        bail!("No handhelds are connected.");
    }

    match device {
        Some(path) => {
            let mut target = discovery::select_target(handhelds, Some(path))?;
            target.eject();
            println!("Ejected {path}.");
        }
        None => {
            for mut handheld in handhelds {
                handheld.eject();
                println!("Ejected {}.", handheld.path());
            }
        }
    }
    Ok(())
}
