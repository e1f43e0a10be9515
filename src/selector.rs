//! Operation mix: the three operation kinds and the weighted selector
//!
//! A uniform draw in `[0, 1)` is classified against the cumulative
//! normalized ratios. Draws below `set` are SET, draws below `set + get`
//! are GET, everything else is DEL, so floating-point residue always lands
//! on DEL.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::RATIO_EPSILON;

/// The three operation kinds issued against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Set,
    Get,
    Del,
}

impl OpKind {
    /// All kinds in report order
    pub const ALL: [OpKind; 3] = [OpKind::Set, OpKind::Get, OpKind::Del];

    /// Dense index used for per-kind arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            OpKind::Set => 0,
            OpKind::Get => 1,
            OpKind::Del => 2,
        }
    }

    /// Upper-case label used in reports ("SET", "GET", "DEL")
    pub fn label(self) -> &'static str {
        match self {
            OpKind::Set => "SET",
            OpKind::Get => "GET",
            OpKind::Del => "DEL",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized operation proportions (always sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpRatios {
    pub set: f64,
    pub get: f64,
    pub del: f64,
}

impl OpRatios {
    /// Normalize raw weights so that `set + get + del == 1.0`.
    ///
    /// Rejects negative or non-finite weights and an all-zero mix, since the
    /// latter leaves the proportions undefined.
    pub fn normalize(set: f64, get: f64, del: f64) -> Result<Self> {
        for (name, v) in [("set", set), ("get", get), ("del", del)] {
            if !v.is_finite() || v < 0.0 {
                bail!("{} ratio must be a finite, non-negative number (got {})", name, v);
            }
        }
        let total = set + get + del;
        if total <= 0.0 {
            bail!("operation ratios sum to zero; at least one of set/get/del must be positive");
        }
        Ok(Self {
            set: set / total,
            get: get / total,
            del: del / total,
        })
    }

    /// Classify a uniform draw in `[0, 1)` into an operation kind
    #[inline]
    pub fn select(&self, draw: f64) -> OpKind {
        select(draw, self.set, self.get, self.del)
    }

    /// Sum of the three proportions, 1.0 within [`RATIO_EPSILON`]
    pub fn is_normalized(&self) -> bool {
        ((self.set + self.get + self.del) - 1.0).abs() <= RATIO_EPSILON
    }
}

/// Classify `draw` against cumulative ratios.
///
/// `del` is accepted for symmetry; DEL owns whatever remains above
/// `set + get`.
#[inline]
pub fn select(draw: f64, set: f64, get: f64, _del: f64) -> OpKind {
    if draw < set {
        OpKind::Set
    } else if draw < set + get {
        OpKind::Get
    } else {
        OpKind::Del
    }
}
