//! Execution backend for the per-cell passes.
//!
//! Every pass is data-parallel: one logical worker per cell (or per buffer
//! slot), grouped into worker groups of `block` consecutive items. A group is
//! the unit handed to a `rayon` task. The launcher exposes the maximum group
//! size per pass, clamps requested sizes to it, and turns a failed pass (a
//! panicking worker, a pool that could not be built) into a [`ThermoError`]
//! instead of unwinding through the caller.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rayon::ThreadPool;

use crate::thermo_error::ThermoError;

/// Upper bound on the worker-group size of most passes.
pub const DEFAULT_MAX_BLOCK: usize = 1024;
/// The reduction keeps one partial per group in scratch memory; larger groups
/// only trade scratch for serial work inside a group.
pub const MAX_REDUCE_BLOCK: usize = 512;

/// The passes a [`Launcher`] runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Pass {
    Accumulate,
    Finalize,
    Stage,
    Reduce,
    Pack,
    Unpack,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::Accumulate => "accumulate",
            Pass::Finalize => "finalize",
            Pass::Stage => "stage",
            Pass::Reduce => "reduce",
            Pass::Pack => "pack",
            Pass::Unpack => "unpack",
        };
        f.write_str(name)
    }
}

/// Runs passes on the global `rayon` pool or on a dedicated one.
#[derive(Clone)]
pub struct Launcher {
    pool: Option<Arc<ThreadPool>>,
    max_block: usize,
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("threads", &self.num_threads())
            .field("max_block", &self.max_block)
            .finish()
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::global()
    }
}

impl Launcher {
    /// Use the global `rayon` pool.
    pub fn global() -> Self {
        Self {
            pool: None,
            max_block: DEFAULT_MAX_BLOCK,
        }
    }

    /// Build a dedicated pool with `threads` workers (`0` lets rayon decide).
    pub fn with_threads(threads: usize) -> Result<Self, ThermoError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cell-thermo-{i}"))
            .build()
            .map_err(|e| ThermoError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
            max_block: DEFAULT_MAX_BLOCK,
        })
    }

    /// Override the hardware limit on worker-group size.
    pub fn with_max_block(mut self, max_block: usize) -> Self {
        self.max_block = max_block.max(1);
        self
    }

    /// Number of worker threads passes run on.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Largest worker-group size `pass` may be launched with.
    pub fn max_block_size(&self, pass: Pass) -> usize {
        match pass {
            Pass::Reduce => self.max_block.min(MAX_REDUCE_BLOCK),
            _ => self.max_block,
        }
    }

    /// Clamp a caller-chosen group size to the limit of `pass`.
    pub fn clamp_block(&self, pass: Pass, requested: usize) -> Result<usize, ThermoError> {
        if requested == 0 {
            return Err(ThermoError::ZeroBlockSize(pass));
        }
        let max = self.max_block_size(pass);
        let block = if requested > max {
            log::warn!("{pass}: worker-group size {requested} clamped to {max}");
            max
        } else {
            requested
        };
        log::trace!("{pass}: worker groups of {block}");
        Ok(block)
    }

    /// Run one pass to completion and report its status.
    pub fn run<R, F>(&self, pass: Pass, f: F) -> Result<R, ThermoError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        log::trace!("launching pass {pass}");
        let result = match &self.pool {
            Some(pool) => catch_unwind(AssertUnwindSafe(|| pool.install(f))),
            None => catch_unwind(AssertUnwindSafe(f)),
        };
        result.map_err(|payload| ThermoError::Launch {
            pass,
            reason: panic_message(payload.as_ref()),
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
