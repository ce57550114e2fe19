//! Structural self-checks for grid topologies and halo plans.
//!
//! Checks are always available through [`DebugInvariants::validate_invariants`];
//! the asserting form only fires in debug builds or with the
//! `check-invariants` / `strict-invariants` features.

use crate::thermo_error::ThermoError;

/// Whether [`DebugInvariants::debug_assert_invariants`] checks anything.
pub const fn invariants_enabled() -> bool {
    cfg!(any(
        debug_assertions,
        feature = "strict-invariants",
        feature = "check-invariants"
    ))
}

pub trait DebugInvariants {
    /// Check every invariant and report the first violation.
    fn validate_invariants(&self) -> Result<(), ThermoError>;

    /// Panic on a violated invariant when checking is compiled in.
    #[inline]
    fn debug_assert_invariants(&self) {
        if invariants_enabled() {
            if let Err(e) = self.validate_invariants() {
                panic!("[invariants] {}: {e}", std::any::type_name::<Self>());
            }
        }
    }
}
