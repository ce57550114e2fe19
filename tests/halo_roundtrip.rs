use cell_thermo::halo::{pack_cell_buffer, unpack_cell_buffer};
use cell_thermo::prelude::*;

fn source_cells(grid: &CellIndexer) -> (Vec<CellVelocity<f64>>, Vec<CellEnergy<f64>>) {
    let vel = (0..grid.num_cells())
        .map(|i| {
            let x = i as f64;
            CellVelocity::new([x, 2.0 * x, -x], 0.5 + x)
        })
        .collect();
    let en = (0..grid.num_cells())
        .map(|i| CellEnergy::new(i as f64 * 0.25, 1.0 + i as f64, i as u32 % 5))
        .collect();
    (vel, en)
}

fn y_slabs(topo: &GridTopology) -> HaloRanges {
    topo.boundary_ranges(Axis::Y)
}

#[test]
fn overwrite_round_trip_reproduces_source() {
    let topo = GridTopology::new([4, 6, 3], [0, 1, 0]).unwrap();
    let grid = topo.indexer();
    let ranges = y_slabs(&topo);
    let (src_v, src_e) = source_cells(&grid);
    let l = Launcher::global();

    let mut lv = vec![[0.0; 4]; ranges.left.len()];
    let mut rv = vec![[0.0; 4]; ranges.right.len()];
    pack_cell_buffer::<_, VelocityMassPack>(&l, 5, &src_v, &ranges, &mut lv, &mut rv).unwrap();
    let mut le = vec![[0.0; 3]; ranges.left.len()];
    let mut re = vec![[0.0; 3]; ranges.right.len()];
    pack_cell_buffer::<_, EnergyPack>(&l, 5, &src_e, &ranges, &mut le, &mut re).unwrap();

    let mut dst_v = vec![CellVelocity::default(); grid.num_cells()];
    let mut dst_e = vec![CellEnergy::default(); grid.num_cells()];
    unpack_cell_buffer::<_, VelocityMassPack>(&l, 7, &mut dst_v, &ranges, &lv, &rv).unwrap();
    unpack_cell_buffer::<_, EnergyPack>(&l, 7, &mut dst_e, &ranges, &le, &re).unwrap();

    for idx in 0..grid.num_cells() {
        let c = grid.coords(idx);
        let in_range = ranges.left.slot_of(c).is_some() || ranges.right.slot_of(c).is_some();
        if in_range {
            assert_eq!(dst_v[idx], src_v[idx], "velocity of cell {c:?}");
            assert_eq!(dst_e[idx], src_e[idx], "energy of cell {c:?}");
        } else {
            assert_eq!(dst_v[idx], CellVelocity::default());
            assert_eq!(dst_e[idx], CellEnergy::default());
        }
    }
}

#[test]
fn additive_unpack_adds_packed_values() {
    let topo = GridTopology::new([8, 2, 2], [2, 0, 0]).unwrap();
    let grid = topo.indexer();
    let ranges = topo.ghost_ranges(Axis::X);
    let (src_v, _) = source_cells(&grid);
    let l = Launcher::global();

    let mut lv = vec![[0.0; 4]; ranges.left.len()];
    let mut rv = vec![[0.0; 4]; ranges.right.len()];
    pack_cell_buffer::<_, VelocityMassPack<Accumulate>>(&l, 3, &src_v, &ranges, &mut lv, &mut rv).unwrap();

    let x = CellVelocity::new([1.0, 1.0, 1.0], 1.0);
    let mut dst = vec![x; grid.num_cells()];
    unpack_cell_buffer::<_, VelocityMassPack<Accumulate>>(&l, 3, &mut dst, &ranges, &lv, &rv).unwrap();

    for idx in 0..grid.num_cells() {
        let c = grid.coords(idx);
        if ranges.left.slot_of(c).is_some() || ranges.right.slot_of(c).is_some() {
            let s = src_v[idx];
            let expect = CellVelocity::new(
                [1.0 + s.velocity[0], 1.0 + s.velocity[1], 1.0 + s.velocity[2]],
                1.0 + s.mass,
            );
            assert_eq!(dst[idx], expect);
        } else {
            assert_eq!(dst[idx], x);
        }
    }
}

#[test]
fn generic_copy_pack_moves_thermo_elements() {
    let grid = CellIndexer::new([3, 3, 1]);
    let ranges = HaloRanges {
        grid,
        left: CellRange::new([0, 0, 0], [3, 1, 1]),
        right: CellRange::new([0, 2, 0], [3, 1, 1]),
    };
    let cells: Vec<ThermoElement> = (0..9)
        .map(|i| ThermoElement {
            energy: i as f64,
            valid: 1,
            ..Default::default()
        })
        .collect();
    let l = Launcher::global();
    let mut left = vec![ThermoElement::default(); 3];
    let mut right = vec![ThermoElement::default(); 3];
    pack_cell_buffer::<_, CopyPack>(&l, 2, &cells, &ranges, &mut left, &mut right).unwrap();
    let energies: Vec<f64> = left.iter().chain(&right).map(|e| e.energy).collect();
    assert_eq!(energies, vec![0.0, 1.0, 2.0, 6.0, 7.0, 8.0]);

    let mut summed = cells.clone();
    unpack_cell_buffer::<_, AddPack>(&l, 2, &mut summed, &ranges, &left, &right).unwrap();
    assert_eq!(summed[7].energy, 14.0);
    assert_eq!(summed[7].valid, 2);
    assert_eq!(summed[4], cells[4]);
}
