//! Transport seam between sub-domain owners.

pub mod allreduce;
pub mod communicator;
pub mod wire;

pub use allreduce::allreduce_thermo;
pub use communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
