use cell_thermo::prelude::*;

fn run_cells<S: Scalar>(
    particles: &ParticleSet<'_, S>,
    lists: &[Vec<u32>],
    dims: Dimensionality,
) -> (Vec<CellVelocity<S>>, Vec<CellEnergy<S>>) {
    let topo = GridTopology::serial([lists.len() as u32, 1, 1]).unwrap();
    let cells = CellList::from_lists(particles, lists).unwrap();
    let cfg = ThermoConfig {
        dimensions: dims,
        ..Default::default()
    };
    let mut thermo = CellThermoCompute::<S>::new(topo, cfg).unwrap();
    thermo.compute(particles, &cells).unwrap();
    (thermo.velocities().to_vec(), thermo.energies().to_vec())
}

#[test]
fn empty_cell_is_zero() {
    let v: Vec<[f64; 3]> = vec![[3.0, 1.0, 2.0]];
    let set = ParticleSet::native(&v, 1.0);
    let (vel, en) = run_cells(&set, &[vec![], vec![0]], Dimensionality::Three);
    assert_eq!(vel[0].velocity, [0.0; 3]);
    assert_eq!(vel[0].mass, 0.0);
    assert_eq!(en[0].energy, 0.0);
    assert_eq!(en[0].temperature, 0.0);
    assert!(!en[0].has_temperature());
}

#[test]
fn single_particle_has_its_own_velocity_and_no_temperature() {
    let v: Vec<[f64; 3]> = vec![[3.0, -1.0, 2.0]];
    let set = ParticleSet::native(&v, 2.5);
    let (vel, en) = run_cells(&set, &[vec![0]], Dimensionality::Three);
    assert_eq!(vel[0].velocity, [3.0, -1.0, 2.0]);
    assert_eq!(vel[0].mass, 2.5);
    assert_eq!(en[0].energy, 0.5 * 2.5 * 14.0);
    assert_eq!(en[0].temperature, 0.0);
    assert_eq!(en[0].count, 1);
}

#[test]
fn opposite_pair_temperature_3d() {
    let m = 1.5;
    let u = [0.3, -0.4, 1.2];
    let v: Vec<[f64; 3]> = vec![u, [-u[0], -u[1], -u[2]]];
    let set = ParticleSet::native(&v, m);
    let (vel, en) = run_cells(&set, &[vec![0, 1]], Dimensionality::Three);
    let u2 = u[0] * u[0] + u[1] * u[1] + u[2] * u[2];
    assert_eq!(vel[0].mass, 2.0 * m);
    for c in vel[0].velocity {
        assert!(c.abs() < 1e-15);
    }
    assert!((en[0].energy - m * u2).abs() < 1e-12);
    assert!((en[0].temperature - 2.0 * m * u2 / 3.0).abs() < 1e-12);
}

#[test]
fn opposite_pair_temperature_2d_uses_two_dof() {
    let v: Vec<[f64; 3]> = vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
    let set = ParticleSet::native(&v, 1.0);
    let (_, en) = run_cells(&set, &[vec![0, 1]], Dimensionality::Two);
    assert!((en[0].temperature - 1.0).abs() < 1e-12);
}

#[test]
fn embedded_particles_join_native_ones() {
    // native m = 1 at +x; embedded m = 3 at -x/3: zero net momentum
    let native: Vec<[f64; 3]> = vec![[1.0, 0.0, 0.0]];
    let emb_v: Vec<[f64; 3]> = vec![[0.0, 9.0, 0.0], [-1.0 / 3.0, 0.0, 0.0]];
    let emb_m = vec![7.0, 3.0];
    let lookup = [1u32, 0];
    let set = ParticleSet::native(&native, 1.0)
        .with_embedded(EmbeddedParticles {
            velocities: &emb_v,
            masses: &emb_m,
            lookup: &lookup,
        })
        .unwrap();
    // raw index 1 -> embedded slot 0 -> particle 1
    let (vel, en) = run_cells(&set, &[vec![0, 1]], Dimensionality::Three);
    assert_eq!(vel[0].mass, 4.0);
    assert!(vel[0].velocity[0].abs() < 1e-15);
    let ke = 0.5 + 0.5 * 3.0 / 9.0;
    assert!((en[0].energy - ke).abs() < 1e-12);
    assert!((en[0].temperature - 2.0 * ke / 3.0).abs() < 1e-12);
}

#[test]
fn single_precision_storage_accumulates_in_double() {
    // many small contributions: f32 running sums would drift visibly
    let n = 200_000usize;
    let v: Vec<[f32; 3]> = (0..n)
        .map(|i| if i % 2 == 0 { [1.0e-3, 0.0, 0.0] } else { [-1.0e-3, 0.0, 0.0] })
        .collect();
    let set = ParticleSet::native(&v, 1.0f32);
    let (vel, en) = run_cells(&set, &[(0..n as u32).collect()], Dimensionality::Three);
    assert_eq!(en[0].count, n as u32);
    assert_eq!(vel[0].mass, n as f32);
    assert!(vel[0].velocity[0].abs() < 1e-9);
    let expect_ke = 0.5 * 1.0e-6 * n as f64;
    assert!(((en[0].energy as f64) - expect_ke).abs() < 1e-6 * expect_ke);
}
