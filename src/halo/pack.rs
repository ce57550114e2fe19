//! Generic halo pack/unpack over a pair of boundary ranges.
//!
//! One routine serves every observable: the [`PackOp`] type parameter picks
//! the element layout and the merge rule. Buffers are laid out in each
//! range's own x-fastest slot order, so a neighbour whose matching range has
//! the same extent reads them back cell for cell.
//!
//! # Preconditions
//! `left` and `right` must be disjoint and lie inside the grid. Debug builds
//! (or the `check-invariants` feature) assert it; in release builds unpack
//! returns an error instead of merging into the wrong cells.

use rayon::prelude::*;

use crate::algs::accumulate::check_len;
use crate::algs::launch::{Launcher, Pass};
use crate::debug_invariants::DebugInvariants;
use crate::grid::indexer::{CellIndexer, CellRange};
use crate::grid::topology::HaloRanges;
use crate::halo::pack_op::PackOp;
use crate::thermo_error::ThermoError;

fn check_buffers(ranges: &HaloRanges, num_cells: usize, left: usize, right: usize) -> Result<(), ThermoError> {
    check_len("halo grid", ranges.grid.num_cells(), num_cells)?;
    if left < ranges.left.len() {
        return Err(ThermoError::LengthMismatch {
            what: "left halo buffer",
            expected: ranges.left.len(),
            found: left,
        });
    }
    if right < ranges.right.len() {
        return Err(ThermoError::LengthMismatch {
            what: "right halo buffer",
            expected: ranges.right.len(),
            found: right,
        });
    }
    Ok(())
}

fn pack_range<V, P>(block: usize, cells: &[V], grid: &CellIndexer, range: &CellRange, buf: &mut [P::Element])
where
    V: Sync,
    P: PackOp<V>,
{
    buf[..range.len()]
        .par_chunks_mut(block)
        .enumerate()
        .for_each(|(group, slots)| {
            let first = group * block;
            for (k, slot) in slots.iter_mut().enumerate() {
                *slot = P::pack(&cells[grid.index(range.coords_of(first + k))]);
            }
        });
}

/// Copy the cells of `ranges.left`/`ranges.right` into `left_buf`/`right_buf`.
pub fn pack_cell_buffer<V, P>(
    launcher: &Launcher,
    block_size: usize,
    cells: &[V],
    ranges: &HaloRanges,
    left_buf: &mut [P::Element],
    right_buf: &mut [P::Element],
) -> Result<(), ThermoError>
where
    V: Sync,
    P: PackOp<V>,
{
    ranges.debug_assert_invariants();
    check_buffers(ranges, cells.len(), left_buf.len(), right_buf.len())?;
    let block = launcher.clamp_block(Pass::Pack, block_size)?;
    let grid = ranges.grid;

    launcher.run(Pass::Pack, || {
        rayon::join(
            || pack_range::<V, P>(block, cells, &grid, &ranges.left, left_buf),
            || pack_range::<V, P>(block, cells, &grid, &ranges.right, right_buf),
        );
    })
}

/// X-rows of `range` as `(first grid slot, buffer segment)`, in slot order.
///
/// Each row is contiguous both in the grid and in the range's buffer.
fn range_rows<'b, E>(grid: &CellIndexer, range: &CellRange, buf: &'b [E]) -> Vec<(usize, &'b [E])> {
    if range.is_empty() {
        return Vec::new();
    }
    let row_len = range.extent[0] as usize;
    let rows_y = range.extent[1];
    buf[..range.len()]
        .chunks_exact(row_len)
        .enumerate()
        .map(|(q, seg)| {
            let q = q as u32;
            let origin = [
                range.origin[0],
                range.origin[1] + q % rows_y,
                range.origin[2] + q / rows_y,
            ];
            (grid.index(origin), seg)
        })
        .collect()
}

/// Merge `left_buf`/`right_buf` into the cells of `ranges.left`/`ranges.right`
/// using `P::unpack`.
///
/// Work is proportional to the ranges, not the grid: `cells` is split into
/// the disjoint x-rows of both ranges and every buffer slot is merged into its
/// own cell. Rows that overlap (a violated precondition) are reported as
/// [`ThermoError::OverlappingHaloRanges`] in release builds.
pub fn unpack_cell_buffer<V, P>(
    launcher: &Launcher,
    block_size: usize,
    cells: &mut [V],
    ranges: &HaloRanges,
    left_buf: &[P::Element],
    right_buf: &[P::Element],
) -> Result<(), ThermoError>
where
    V: Send,
    P: PackOp<V>,
{
    ranges.debug_assert_invariants();
    check_buffers(ranges, cells.len(), left_buf.len(), right_buf.len())?;
    let block = launcher.clamp_block(Pass::Unpack, block_size)?;
    let grid = ranges.grid;
    for r in [&ranges.left, &ranges.right] {
        if !r.fits_in(&grid) {
            return Err(ThermoError::RangeOutOfGrid {
                range: r.to_string(),
                dims: grid.dims(),
            });
        }
    }

    let mut rows = range_rows(&grid, &ranges.left, left_buf);
    rows.extend(range_rows(&grid, &ranges.right, right_buf));
    if rows.is_empty() {
        return Ok(());
    }
    rows.sort_unstable_by_key(|&(start, _)| start);

    let mut pieces = Vec::with_capacity(rows.len());
    let mut rest: &mut [V] = cells;
    let mut consumed = 0;
    for (start, seg) in rows {
        if start < consumed {
            return Err(ThermoError::OverlappingHaloRanges {
                left: ranges.left.to_string(),
                right: ranges.right.to_string(),
            });
        }
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(start - consumed);
        let (row, tail) = tail.split_at_mut(seg.len());
        pieces.push((row, seg));
        rest = tail;
        consumed = start + seg.len();
    }

    // Rows of one range share a length; group them into about `block` slots.
    let longest = pieces.iter().map(|(row, _)| row.len()).max().unwrap_or(1);
    let rows_per_group = (block / longest.max(1)).max(1);
    launcher.run(Pass::Unpack, move || {
        pieces
            .into_par_iter()
            .with_min_len(rows_per_group)
            .for_each(|(row, seg)| {
                for (cell, incoming) in row.iter_mut().zip(seg) {
                    P::unpack(cell, *incoming);
                }
            });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::halo::pack_op::{AddPack, CopyPack};

    fn x_slabs(grid: CellIndexer) -> HaloRanges {
        let [nx, ny, nz] = grid.dims();
        HaloRanges {
            grid,
            left: CellRange::new([0, 0, 0], [1, ny, nz]),
            right: CellRange::new([nx - 1, 0, 0], [1, ny, nz]),
        }
    }

    #[test]
    fn pack_reads_range_cells_in_slot_order() {
        let grid = CellIndexer::new([4, 2, 1]);
        let cells: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let ranges = x_slabs(grid);
        let mut left = vec![0.0; 2];
        let mut right = vec![0.0; 2];
        pack_cell_buffer::<f64, CopyPack>(&Launcher::global(), 1, &cells, &ranges, &mut left, &mut right)
            .unwrap();
        assert_eq!(left, vec![0.0, 4.0]);
        assert_eq!(right, vec![3.0, 7.0]);
    }

    #[test]
    fn unpack_touches_only_range_cells() {
        let grid = CellIndexer::new([4, 2, 1]);
        let ranges = x_slabs(grid);
        let mut cells = vec![1.0f64; 8];
        unpack_cell_buffer::<f64, AddPack>(
            &Launcher::global(),
            3,
            &mut cells,
            &ranges,
            &[10.0, 20.0],
            &[30.0, 40.0],
        )
        .unwrap();
        assert_eq!(cells, vec![11.0, 1.0, 1.0, 31.0, 21.0, 1.0, 1.0, 41.0]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let grid = CellIndexer::new([4, 2, 1]);
        let ranges = x_slabs(grid);
        let cells = vec![0.0f64; 8];
        let mut left = vec![0.0; 1];
        let mut right = vec![0.0; 2];
        let res = pack_cell_buffer::<f64, CopyPack>(&Launcher::global(), 4, &cells, &ranges, &mut left, &mut right);
        assert!(matches!(
            res,
            Err(ThermoError::LengthMismatch { what: "left halo buffer", expected: 2, found: 1 })
        ));
    }

    #[test]
    fn empty_ranges_are_a_no_op() {
        let grid = CellIndexer::new([2, 2, 2]);
        let ranges = HaloRanges {
            grid,
            left: CellRange::new([0, 0, 0], [0, 2, 2]),
            right: CellRange::new([2, 0, 0], [0, 2, 2]),
        };
        let mut cells = vec![5u32; 8];
        unpack_cell_buffer::<u32, CopyPack>(&Launcher::global(), 4, &mut cells, &ranges, &[], &[]).unwrap();
        assert!(cells.iter().all(|&c| c == 5));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "[invariants]")]
    fn overlapping_ranges_trip_debug_checks() {
        let grid = CellIndexer::new([4, 2, 1]);
        let ranges = HaloRanges {
            grid,
            left: CellRange::new([0, 0, 0], [2, 2, 1]),
            right: CellRange::new([1, 0, 0], [2, 2, 1]),
        };
        let cells = vec![0.0f64; 8];
        let mut left = vec![0.0; 4];
        let mut right = vec![0.0; 4];
        let _ = pack_cell_buffer::<f64, CopyPack>(&Launcher::global(), 4, &cells, &ranges, &mut left, &mut right);
    }

    #[test]
    fn unpack_maps_every_slot_of_wide_x_slabs() {
        // two-cell thick X slabs across y and z rows
        let grid = CellIndexer::new([8, 3, 2]);
        let ranges = HaloRanges {
            grid,
            left: CellRange::new([0, 0, 0], [2, 3, 2]),
            right: CellRange::new([6, 0, 0], [2, 3, 2]),
        };
        let left: Vec<u64> = (0..12).map(|s| 100 + s).collect();
        let right: Vec<u64> = (0..12).map(|s| 200 + s).collect();
        let mut cells = vec![0u64; grid.num_cells()];
        unpack_cell_buffer::<u64, AddPack>(&Launcher::global(), 3, &mut cells, &ranges, &left, &right).unwrap();

        for idx in 0..grid.num_cells() {
            let c = grid.coords(idx);
            let expect = match (ranges.left.slot_of(c), ranges.right.slot_of(c)) {
                (Some(s), _) => left[s],
                (_, Some(s)) => right[s],
                _ => 0,
            };
            assert_eq!(cells[idx], expect, "cell {c:?}");
        }
        // slot order is x-fastest within the range
        assert_eq!(cells[grid.index([1, 2, 1])], 100 + 1 + 2 * (2 + 3));
    }
}
