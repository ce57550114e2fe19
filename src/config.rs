//! Runtime configuration for [`CellThermoCompute`](crate::compute::CellThermoCompute).
//!
//! The config is plain data (`serde`-serializable) so it can be embedded in a
//! simulation's own settings file. Group sizes are requests; the launcher
//! clamps them to its per-pass maximum.

use std::fmt;

use crate::algs::launch::{Launcher, Pass};
use crate::thermo_error::ThermoError;

/// Spatial dimensionality used as degrees of freedom in the equipartition relation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dimensionality {
    Two,
    Three,
}

impl Dimensionality {
    #[inline]
    pub const fn degrees_of_freedom(self) -> f64 {
        match self {
            Dimensionality::Two => 2.0,
            Dimensionality::Three => 3.0,
        }
    }
}

impl TryFrom<u32> for Dimensionality {
    type Error = ThermoError;

    fn try_from(d: u32) -> Result<Self, Self::Error> {
        match d {
            2 => Ok(Dimensionality::Two),
            3 => Ok(Dimensionality::Three),
            other => Err(ThermoError::InvalidDimensionality(other)),
        }
    }
}

impl From<Dimensionality> for u32 {
    fn from(d: Dimensionality) -> u32 {
        match d {
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", u32::from(*self))
    }
}

/// Settings for one thermo compute instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ThermoConfig {
    pub dimensions: Dimensionality,
    pub accumulate_block: usize,
    pub finalize_block: usize,
    pub stage_block: usize,
    pub reduce_block: usize,
    pub pack_block: usize,
    /// Dedicated worker threads; `None` runs on the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for ThermoConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensionality::Three,
            accumulate_block: 128,
            finalize_block: 128,
            stage_block: 128,
            reduce_block: 256,
            pack_block: 128,
            threads: None,
        }
    }
}

impl ThermoConfig {
    /// Requested worker-group size of `pass`.
    pub fn block(&self, pass: Pass) -> usize {
        match pass {
            Pass::Accumulate => self.accumulate_block,
            Pass::Finalize => self.finalize_block,
            Pass::Stage => self.stage_block,
            Pass::Reduce => self.reduce_block,
            Pass::Pack | Pass::Unpack => self.pack_block,
        }
    }

    /// Reject group sizes of zero.
    pub fn validate(&self) -> Result<(), ThermoError> {
        for pass in [
            Pass::Accumulate,
            Pass::Finalize,
            Pass::Stage,
            Pass::Reduce,
            Pass::Pack,
        ] {
            if self.block(pass) == 0 {
                return Err(ThermoError::ZeroBlockSize(pass));
            }
        }
        Ok(())
    }

    /// Launcher matching `threads`.
    pub fn launcher(&self) -> Result<Launcher, ThermoError> {
        match self.threads {
            Some(n) => Launcher::with_threads(n),
            None => Ok(Launcher::global()),
        }
    }
}
