//! Type-safe tool argument modules.
//!
//! Each struct maps Rust fields to the exact flags expected by the
//! corresponding md or LVM command.

pub mod lvm;
pub mod mdadm;
