//! Halo exchange along one axis: pack → transport → unpack.
//!
//! Each rank packs its two `send` ranges, ships the left buffer to its left
//! neighbour and the right buffer to its right neighbour, and merges what
//! arrives into its `recv` ranges. The right `recv` range of a rank must have
//! the same extent as the left `send` range of its right neighbour (and
//! symmetrically), which holds when all ranks share one [`GridTopology`].
//!
//! Two standard pairings:
//! - [`mirror_ghosts`]: boundary slabs → neighbours' ghost slabs, overwrite;
//! - [`fold_ghosts`]: ghost slabs → neighbours' boundary slabs, add. Used on
//!   raw sums when particles near a face were binned into ghost cells.

use crate::algs::launch::Launcher;
use crate::comm::communicator::{CommTag, Communicator, Wait};
use crate::comm::wire::{cast_slice, decode_elements};
use crate::grid::topology::{Axis, GridTopology, HaloRanges};
use crate::halo::pack::{pack_cell_buffer, unpack_cell_buffer};
use crate::halo::pack_op::PackOp;
use crate::thermo_error::ThermoError;

/// Ranks owning the sub-domains on either side along one axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AxisNeighbors {
    pub left: usize,
    pub right: usize,
}

impl AxisNeighbors {
    /// A single periodic domain: both neighbours are the rank itself.
    pub fn periodic_self(rank: usize) -> Self {
        Self {
            left: rank,
            right: rank,
        }
    }
}

/// Exchange `send` ranges with the neighbours and merge into `recv` ranges.
///
/// Uses `tag` for left-going and `tag + 1` for right-going messages.
#[allow(clippy::too_many_arguments)]
pub fn exchange_halo<V, P, C>(
    launcher: &Launcher,
    block_size: usize,
    comm: &C,
    neighbors: AxisNeighbors,
    tag: CommTag,
    cells: &mut [V],
    send: &HaloRanges,
    recv: &HaloRanges,
) -> Result<(), ThermoError>
where
    V: Send + Sync,
    P: PackOp<V>,
    C: Communicator,
{
    if send.is_empty() && recv.is_empty() {
        return Ok(());
    }
    let zero = <P::Element as bytemuck::Zeroable>::zeroed();
    let mut left_out = vec![zero; send.left.len()];
    let mut right_out = vec![zero; send.right.len()];
    pack_cell_buffer::<V, P>(launcher, block_size, cells, send, &mut left_out, &mut right_out)?;

    let elem = std::mem::size_of::<P::Element>();
    let left_going = tag.as_u16();
    let right_going = tag.offset(1).as_u16();

    // what the right neighbour sent leftwards lands in our right range
    let mut from_right = vec![0u8; recv.right.len() * elem];
    let mut from_left = vec![0u8; recv.left.len() * elem];
    let h_right = comm.irecv(neighbors.right, left_going, &mut from_right);
    let h_left = comm.irecv(neighbors.left, right_going, &mut from_left);

    comm.isend(neighbors.left, left_going, cast_slice(&left_out)).wait();
    comm.isend(neighbors.right, right_going, cast_slice(&right_out)).wait();

    let raw_right = h_right.wait().ok_or_else(|| missing(neighbors.right))?;
    let raw_left = h_left.wait().ok_or_else(|| missing(neighbors.left))?;
    let right_in = decode_elements::<P::Element>(neighbors.right, &raw_right, recv.right.len())?;
    let left_in = decode_elements::<P::Element>(neighbors.left, &raw_left, recv.left.len())?;

    unpack_cell_buffer::<V, P>(launcher, block_size, cells, recv, &left_in, &right_in)
}

fn missing(neighbor: usize) -> ThermoError {
    ThermoError::CommError {
        neighbor,
        reason: "no halo data received".into(),
    }
}

/// Overwrite ghost slabs with the neighbours' boundary slabs.
#[allow(clippy::too_many_arguments)]
pub fn mirror_ghosts<V, P, C>(
    launcher: &Launcher,
    block_size: usize,
    comm: &C,
    topology: &GridTopology,
    axis: Axis,
    neighbors: AxisNeighbors,
    tag: CommTag,
    cells: &mut [V],
) -> Result<(), ThermoError>
where
    V: Send + Sync,
    P: PackOp<V>,
    C: Communicator,
{
    if !topology.is_decomposed(axis) {
        return Ok(());
    }
    let send = topology.boundary_ranges(axis);
    let recv = topology.ghost_ranges(axis);
    exchange_halo::<V, P, C>(launcher, block_size, comm, neighbors, tag, cells, &send, &recv)
}

/// Merge ghost slabs into the neighbours' boundary slabs.
#[allow(clippy::too_many_arguments)]
pub fn fold_ghosts<V, P, C>(
    launcher: &Launcher,
    block_size: usize,
    comm: &C,
    topology: &GridTopology,
    axis: Axis,
    neighbors: AxisNeighbors,
    tag: CommTag,
    cells: &mut [V],
) -> Result<(), ThermoError>
where
    V: Send + Sync,
    P: PackOp<V>,
    C: Communicator,
{
    if !topology.is_decomposed(axis) {
        return Ok(());
    }
    let send = topology.ghost_ranges(axis);
    let recv = topology.boundary_ranges(axis);
    exchange_halo::<V, P, C>(launcher, block_size, comm, neighbors, tag, cells, &send, &recv)
}
