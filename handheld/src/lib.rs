//! Host-side protocol for Sitronix-based handheld toy devices.
//!
//! The devices enumerate as USB mass-storage disks, but their flash memory
//! and command interface are only reachable through raw sector reads and
//! writes at reserved sector addresses. This crate turns that fixed-size
//! sector I/O into a page-addressable flash interface: it frames the
//! pseudo-SCSI commands, enforces the post-write settling delay the hardware
//! requires, keeps transfer buffers aligned for direct I/O, and provides the
//! codecs for the byte encodings the device mixes (big-endian command
//! fields, little-endian stored values, hex-coded decimal counters).
//!
//! All protocol logic is generic over [`volume::Volume`], so tests can run
//! against [`sim::LoopbackVolume`] instead of real hardware.

pub mod buffer;
pub mod codec;
pub mod commands;
pub mod device;
pub mod error;
pub mod layout;
pub mod otp;
pub mod settings;
pub mod sim;
pub mod volume;

pub use device::{Handheld, SettlePolicy};
pub use error::DeviceError;
