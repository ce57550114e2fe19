//! Particle views consumed by the accumulate pass.
//!
//! Two populations share one cell list:
//! - *native* particles own a velocity and share one global mass;
//! - *embedded* particles carry their own velocity and mass, reached through
//!   a lookup table.
//!
//! Raw cell-list entries use one index space: `raw < N` is native particle
//! `raw`, `raw >= N` is embedded slot `raw - N`, resolved through the lookup
//! table. [`CellList`] classifies every raw entry exactly once into a
//! [`ParticleRef`], so the accumulate pass never re-checks the threshold or
//! walks the lookup table.

use crate::data::scalar::Scalar;
use crate::thermo_error::ThermoError;

/// Embedded particles: per-particle velocity and mass plus the lookup table
/// from embedded slot (`raw - N`) to an index into `velocities`/`masses`.
#[derive(Copy, Clone, Debug)]
pub struct EmbeddedParticles<'a, S> {
    pub velocities: &'a [[S; 3]],
    pub masses: &'a [S],
    pub lookup: &'a [u32],
}

/// Read-only view of all particles that may appear in a cell list.
#[derive(Copy, Clone, Debug)]
pub struct ParticleSet<'a, S> {
    native_velocities: &'a [[S; 3]],
    native_mass: S,
    embedded: Option<EmbeddedParticles<'a, S>>,
}

/// A cell-list entry after classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParticleRef {
    /// Index into the native velocity array.
    Native(u32),
    /// Index into the embedded velocity/mass arrays (lookup already applied).
    Embedded(u32),
}

impl<'a, S: Scalar> ParticleSet<'a, S> {
    /// Native particles only.
    pub fn native(velocities: &'a [[S; 3]], mass: S) -> Self {
        Self {
            native_velocities: velocities,
            native_mass: mass,
            embedded: None,
        }
    }

    /// Attach an embedded population.
    pub fn with_embedded(mut self, embedded: EmbeddedParticles<'a, S>) -> Result<Self, ThermoError> {
        if embedded.masses.len() != embedded.velocities.len() {
            return Err(ThermoError::LengthMismatch {
                what: "embedded masses",
                expected: embedded.velocities.len(),
                found: embedded.masses.len(),
            });
        }
        self.embedded = Some(embedded);
        Ok(self)
    }

    /// Number of native particles (`N`).
    #[inline]
    pub fn native_len(&self) -> usize {
        self.native_velocities.len()
    }

    /// Number of embedded lookup slots.
    #[inline]
    pub fn embedded_len(&self) -> usize {
        self.embedded.map_or(0, |e| e.lookup.len())
    }

    #[inline]
    pub fn native_mass(&self) -> S {
        self.native_mass
    }

    /// Classify a raw cell-list index.
    pub fn classify(&self, raw: u32) -> Result<ParticleRef, ThermoError> {
        let n = self.native_len();
        let idx = raw as usize;
        if idx < n {
            return Ok(ParticleRef::Native(raw));
        }
        let out_of_range = || ThermoError::InvalidParticleIndex {
            index: raw,
            native: n,
            embedded: self.embedded_len(),
        };
        let emb = self.embedded.ok_or_else(out_of_range)?;
        let slot = *emb.lookup.get(idx - n).ok_or_else(out_of_range)?;
        if slot as usize >= emb.velocities.len() {
            return Err(out_of_range());
        }
        Ok(ParticleRef::Embedded(slot))
    }

    /// Velocity and mass of a classified particle.
    ///
    /// # Panics
    /// If `p` was not produced by [`classify`](Self::classify) on this set
    /// (an embedded reference into a set without embedded particles, or an
    /// index past the end of the arrays). [`CellList::check_matches`] rules
    /// this out for whole cell lists.
    #[inline]
    pub fn kinematics(&self, p: ParticleRef) -> ([S; 3], S) {
        match (p, self.embedded) {
            (ParticleRef::Native(i), _) => (self.native_velocities[i as usize], self.native_mass),
            (ParticleRef::Embedded(i), Some(emb)) => {
                (emb.velocities[i as usize], emb.masses[i as usize])
            }
            (ParticleRef::Embedded(i), None) => {
                unreachable!("embedded particle {i} referenced in a set without embedded particles")
            }
        }
    }
}

/// Per-cell particle membership in compressed (offsets + entries) form.
#[derive(Clone, Debug, Default)]
pub struct CellList {
    offsets: Vec<usize>,
    entries: Vec<ParticleRef>,
    native_len: usize,
    embedded_len: usize,
}

impl CellList {
    /// Build from a fixed-width cell list: cell `c` holds `counts[c]` raw
    /// indices stored at `raw[c * width ..]`.
    pub fn from_raw<S: Scalar>(
        particles: &ParticleSet<'_, S>,
        counts: &[u32],
        width: usize,
        raw: &[u32],
    ) -> Result<Self, ThermoError> {
        let needed = counts.len().saturating_mul(width);
        if raw.len() < needed {
            return Err(ThermoError::LengthMismatch {
                what: "raw cell list",
                expected: needed,
                found: raw.len(),
            });
        }
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        let mut entries = Vec::with_capacity(total);
        offsets.push(0);
        for (cell, &count) in counts.iter().enumerate() {
            let count = count as usize;
            if count > width {
                return Err(ThermoError::LengthMismatch {
                    what: "cell list width",
                    expected: width,
                    found: count,
                });
            }
            let start = cell * width;
            for &r in &raw[start..start + count] {
                entries.push(particles.classify(r)?);
            }
            offsets.push(entries.len());
        }
        Ok(Self {
            offsets,
            entries,
            native_len: particles.native_len(),
            embedded_len: particles.embedded_len(),
        })
    }

    /// Build from one list of raw indices per cell.
    pub fn from_lists<S: Scalar, L: AsRef<[u32]>>(
        particles: &ParticleSet<'_, S>,
        cells: &[L],
    ) -> Result<Self, ThermoError> {
        let mut offsets = Vec::with_capacity(cells.len() + 1);
        let mut entries = Vec::new();
        offsets.push(0);
        for cell in cells {
            for &r in cell.as_ref() {
                entries.push(particles.classify(r)?);
            }
            offsets.push(entries.len());
        }
        Ok(Self {
            offsets,
            entries,
            native_len: particles.native_len(),
            embedded_len: particles.embedded_len(),
        })
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Particles assigned to `cell`.
    #[inline]
    pub fn cell(&self, cell: usize) -> &[ParticleRef] {
        &self.entries[self.offsets[cell]..self.offsets[cell + 1]]
    }

    #[inline]
    pub fn count(&self, cell: usize) -> u32 {
        (self.offsets[cell + 1] - self.offsets[cell]) as u32
    }

    /// Check that this list was classified against `particles`.
    pub fn check_matches<S: Scalar>(&self, particles: &ParticleSet<'_, S>) -> Result<(), ThermoError> {
        if self.native_len != particles.native_len() {
            return Err(ThermoError::LengthMismatch {
                what: "native particle count",
                expected: self.native_len,
                found: particles.native_len(),
            });
        }
        if self.embedded_len != particles.embedded_len() {
            return Err(ThermoError::LengthMismatch {
                what: "embedded particle count",
                expected: self.embedded_len,
                found: particles.embedded_len(),
            });
        }
        Ok(())
    }
}
