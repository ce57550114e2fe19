use cell_thermo::algs::{Launcher, reduce_elements};
use cell_thermo::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

struct Scene {
    native: Vec<[f64; 3]>,
    emb_v: Vec<[f64; 3]>,
    emb_m: Vec<f64>,
    lookup: Vec<u32>,
    lists: Vec<Vec<u32>>,
}

const NATIVE_MASS: f64 = 1.25;

fn scene(seed: u64, num_cells: usize) -> Scene {
    let mut rng = SmallRng::seed_from_u64(seed);
    let n_native = 500;
    let n_emb = 120;
    let native: Vec<[f64; 3]> = (0..n_native)
        .map(|_| [rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0)])
        .collect();
    let emb_v: Vec<[f64; 3]> = (0..n_emb)
        .map(|_| [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
        .collect();
    let emb_m: Vec<f64> = (0..n_emb).map(|_| rng.gen_range(0.5..4.0)).collect();
    // reversed lookup so slot and particle index differ
    let lookup: Vec<u32> = (0..n_emb as u32).rev().collect();
    let mut lists = vec![Vec::new(); num_cells];
    for raw in 0..(n_native + n_emb) as u32 {
        lists[rng.gen_range(0..num_cells)].push(raw);
    }
    Scene {
        native,
        emb_v,
        emb_m,
        lookup,
        lists,
    }
}

fn particle_momentum(s: &Scene) -> [f64; 3] {
    let mut p = [0.0; 3];
    for v in &s.native {
        for a in 0..3 {
            p[a] += NATIVE_MASS * v[a];
        }
    }
    for (v, m) in s.emb_v.iter().zip(&s.emb_m) {
        for a in 0..3 {
            p[a] += m * v[a];
        }
    }
    p
}

#[test]
fn staged_momentum_matches_particle_momentum() {
    for seed in [1u64, 7, 42] {
        let s = scene(seed, 64);
        let set = ParticleSet::native(&s.native, NATIVE_MASS)
            .with_embedded(EmbeddedParticles {
                velocities: &s.emb_v,
                masses: &s.emb_m,
                lookup: &s.lookup,
            })
            .unwrap();
        let cells = CellList::from_lists(&set, &s.lists).unwrap();
        let topo = GridTopology::serial([4, 4, 4]).unwrap();
        let mut thermo = CellThermoCompute::<f64>::new(topo, ThermoConfig::default()).unwrap();
        thermo.compute(&set, &cells).unwrap();

        let staged = thermo.stage().unwrap();
        let total = reduce_elements(&Launcher::global(), 16, &staged).unwrap();
        let expect = particle_momentum(&s);
        for a in 0..3 {
            assert!(
                (total.momentum[a] - expect[a]).abs() < 1e-9,
                "seed {seed} axis {a}: {} vs {}",
                total.momentum[a],
                expect[a]
            );
        }

        let summary = thermo.global_thermo().unwrap();
        let total_mass = NATIVE_MASS * s.native.len() as f64 + s.emb_m.iter().sum::<f64>();
        let net = summary.net_velocity(total_mass).unwrap();
        for a in 0..3 {
            assert!((net[a] * total_mass - expect[a]).abs() < 1e-9);
        }
    }
}

#[test]
fn kinetic_energy_is_conserved_through_staging() {
    let s = scene(99, 27);
    let set = ParticleSet::native(&s.native, NATIVE_MASS)
        .with_embedded(EmbeddedParticles {
            velocities: &s.emb_v,
            masses: &s.emb_m,
            lookup: &s.lookup,
        })
        .unwrap();
    let cells = CellList::from_lists(&set, &s.lists).unwrap();
    let topo = GridTopology::serial([3, 3, 3]).unwrap();
    let mut thermo = CellThermoCompute::<f64>::new(topo, ThermoConfig::default()).unwrap();
    thermo.compute(&set, &cells).unwrap();
    let summary = thermo.global_thermo().unwrap();

    let ke_native: f64 = s
        .native
        .iter()
        .map(|v| 0.5 * NATIVE_MASS * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
        .sum();
    let ke_emb: f64 = s
        .emb_v
        .iter()
        .zip(&s.emb_m)
        .map(|(v, m)| 0.5 * m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
        .sum();
    assert!((summary.kinetic_energy - (ke_native + ke_emb)).abs() < 1e-9);
    let valid = thermo.energies().iter().filter(|e| e.has_temperature()).count() as u64;
    assert_eq!(summary.valid_cells, valid);
}
