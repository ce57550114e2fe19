//! Halo exchange: generic pack/unpack of boundary cells and the per-axis driver.

pub mod exchange;
pub mod pack;
pub mod pack_op;

pub use exchange::{AxisNeighbors, exchange_halo, fold_ghosts, mirror_ghosts};
pub use pack::{pack_cell_buffer, unpack_cell_buffer};
pub use pack_op::{Accumulate, AddPack, CopyPack, EnergyPack, MergeRule, Overwrite, PackOp, VelocityMassPack};
