//! Invariant checks for the layout chain.
//!
//! Checks run from constructors through [`debug_invariants!`] in debug builds,
//! or in release builds with the `check-invariants` feature.

use crate::distributor::path::{Path, validate_path};
use crate::spectral_error::SpectralError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), SpectralError>;
}

/// Run a fallible check and panic with `ctx` on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

impl DebugInvariants for Path {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Path");
    }

    fn validate_invariants(&self) -> Result<(), SpectralError> {
        for layout in &self.layouts {
            layout.validate_invariants()?;
        }
        validate_path(self)
    }
}
