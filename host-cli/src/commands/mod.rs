use anyhow::Result;

use handheld::DeviceError;

use crate::discovery;
use crate::{Cli, Command};

pub mod dump_flash;
pub mod dump_otp;
pub mod eject;
pub mod load_flash;
pub mod read_credits;
pub mod set_credits;
pub mod status;

/// How often a failed page operation is attempted before the whole
/// transfer is aborted.
pub const PAGE_RETRY_LIMIT: u32 = 5;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::DumpFlash(args) => {
            let mut handheld = discovery::find_target(args.target.device.as_deref())?;
            dump_flash::run(&mut handheld, &args.outfile)
        }
        Command::LoadFlash(args) => {
            let mut handheld = discovery::find_target(args.target.device.as_deref())?;
            load_flash::run(
                &mut handheld,
                &args.infile,
                args.mirror.as_deref(),
                args.check_changes,
            )
        }
        Command::DumpOtp(args) => {
            let mut handheld = discovery::find_target(args.target.device.as_deref())?;
            dump_otp::run(&mut handheld, &args.outfile, args.checksum)
        }
        Command::Status => status::run(),
        Command::ReadCredits(args) => {
            let mut handheld = discovery::find_target(args.target.device.as_deref())?;
            read_credits::run(&mut handheld, args.encoding.into())
        }
        Command::SetCredits(args) => {
            let mut handheld = discovery::find_target(args.target.device.as_deref())?;
            set_credits::run(&mut handheld, args.value, args.encoding.into())
        }
        Command::Eject(args) => eject::run(args.device.as_deref()),
    }
}

/// Run a page operation up to [`PAGE_RETRY_LIMIT`] times, reporting each
/// failed attempt, and surface the last error once the budget is spent.
pub(crate) fn retry_page_op<T>(
    what: &str,
    page: u32,
    mut op: impl FnMut() -> Result<T, DeviceError>,
) -> Result<T, DeviceError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < PAGE_RETRY_LIMIT => {
                eprintln!("\r{what} page {page} failed, retrying: {err}");
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn retry_returns_the_first_success() {
        let mut attempts = 0;
        let result = retry_page_op("Reading", 0, || {
            attempts += 1;
            if attempts < 3 {
                Err(DeviceError::Io(io::Error::other("transient")))
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result.expect("third attempt succeeds"), 3);
    }

    #[test]
    fn retry_gives_up_after_the_limit() {
        let mut attempts = 0;
        let result: Result<(), DeviceError> = retry_page_op("Writing", 7, || {
            attempts += 1;
            Err(DeviceError::Io(io::Error::other("persistent")))
        });
        assert!(result.is_err());
        assert_eq!(attempts, PAGE_RETRY_LIMIT);
    }
}
