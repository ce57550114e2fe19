//! Data module: particle views, per-cell observables and storage precision

pub mod cell_data;
pub mod particles;
pub mod scalar;

pub use cell_data::{CellEnergy, CellThermoArrays, CellVelocity};
pub use particles::{CellList, EmbeddedParticles, ParticleRef, ParticleSet};
pub use scalar::Scalar;
