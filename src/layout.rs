//! Layout resolution
//!
//! Validates a layout string against the grammar accepted for a RAID level and
//! returns the form passed to `mdadm --layout=`.
//!
//! | Level | Accepted | Canonical |
//! |-------|----------|-----------|
//! | 0, 1  | anything (ignored) | unset |
//! | 5     | `left-asymmetric`, `left-symmetric`, `right-asymmetric`, `right-symmetric` | unchanged |
//! | 10    | `near=N`, `far=N`, `offset=N` with N >= 1 | `nN`, `fN`, `oN` |
//!
//! `mdadm --detail` already reports RAID10 layouts in the long form, so the
//! same resolver serves both operator input and discovered layouts.

use crate::error::{RaidError, Result};
use crate::types::{Raid10Placement, Raid5Layout, RaidLevel};

/// Resolve `raw` for `level`.
///
/// Returns `Ok(None)` for levels without a layout.
pub fn resolve(level: RaidLevel, raw: &str) -> Result<Option<String>> {
    let raw = raw.trim();
    match level {
        RaidLevel::Raid0 | RaidLevel::Raid1 => Ok(None),
        RaidLevel::Raid5 => raw
            .parse::<Raid5Layout>()
            .map(|layout| Some(layout.to_string()))
            .map_err(|_| {
                RaidError::layout(format!(
                    "'{}' is not a RAID5 layout (left-asymmetric, left-symmetric, right-asymmetric, right-symmetric)",
                    raw
                ))
            }),
        RaidLevel::Raid10 => resolve_raid10(raw).map(Some),
    }
}

/// Resolve an optional layout; an absent layout stays absent.
pub fn resolve_optional(level: RaidLevel, raw: Option<&str>) -> Result<Option<String>> {
    match raw {
        Some(raw) => resolve(level, raw),
        None => Ok(None),
    }
}

fn resolve_raid10(raw: &str) -> Result<String> {
    let invalid = || {
        RaidError::layout(format!(
            "'{}' is not a RAID10 layout (expected near=N, far=N or offset=N with N >= 1)",
            raw
        ))
    };

    let (kind, copies) = raw.split_once('=').ok_or_else(invalid)?;
    let placement: Raid10Placement = kind.trim().parse().map_err(|_| invalid())?;
    let copies = copies.trim();
    if copies.is_empty() || !copies.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let copies: u32 = copies.parse().map_err(|_| invalid())?;
    if copies < 1 {
        return Err(invalid());
    }

    Ok(format!("{}{}", placement.short(), copies))
}
