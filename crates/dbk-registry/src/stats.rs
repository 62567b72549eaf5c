//! Storage-usage rollup.
//!
//! Sizes are stored as byte counts in string form. The rollup sums them
//! across an owner's records (de-duplicated by id), picks the largest of
//! B/KB/MB/GB that keeps the displayed magnitude ≥ 1, and reports the
//! share of the quota in use, capped at 100.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::SizeEntry;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeUnit::Bytes => write!(f, "bytes"),
            SizeUnit::Kb => write!(f, "KB"),
            SizeUnit::Mb => write!(f, "MB"),
            SizeUnit::Gb => write!(f, "GB"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Used size expressed in `used_unit`, rounded to two decimals.
    pub used_size: f64,
    pub used_unit: SizeUnit,
    pub quota_gb: u64,
    /// Share of the quota in use, 0–100.
    pub percentage: f64,
    pub document_count: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn storage_rollup(entries: &[SizeEntry], quota_gb: u64) -> StorageUsage {
    let mut seen = HashSet::new();
    let mut total_bytes = 0.0_f64;
    let mut document_count = 0_u64;

    for (id, size) in entries {
        if !seen.insert(*id) {
            continue;
        }
        document_count += 1;
        total_bytes += size.parse::<f64>().unwrap_or(0.0);
    }

    let (used_size, used_unit) = if total_bytes >= GIB {
        (total_bytes / GIB, SizeUnit::Gb)
    } else if total_bytes >= MIB {
        (total_bytes / MIB, SizeUnit::Mb)
    } else if total_bytes >= KIB {
        (total_bytes / KIB, SizeUnit::Kb)
    } else {
        (total_bytes, SizeUnit::Bytes)
    };

    let quota_bytes = quota_gb as f64 * GIB;
    let percentage = if total_bytes <= 0.0 {
        0.0
    } else if quota_bytes <= 0.0 {
        100.0
    } else {
        (total_bytes / quota_bytes * 100.0).min(100.0)
    };

    StorageUsage {
        used_size: round2(used_size),
        used_unit,
        quota_gb,
        percentage,
        document_count,
    }
}
