//! Serde-facing domain description.
//!
//! These types mirror the construction parameters of bases, composite axes
//! and domains so a run can be described in any serde format. Building goes
//! through the ordinary validated constructors.
//!
//! ```
//! use spectral_sieve::config::{AxisConfig, BasisConfig, BasisFields, DomainConfig};
//!
//! let cfg = DomainConfig {
//!     axes: vec![AxisConfig::Single(BasisConfig::Chebyshev(BasisFields {
//!         name: "z".into(),
//!         size: 16,
//!         bounds: [0.0, 1.0],
//!         dealias: 1.5,
//!     }))],
//!     dtype: Default::default(),
//!     mesh: None,
//! };
//! let axes = cfg.build_axes().unwrap();
//! assert_eq!(axes.dealias_scales(), vec![1.5]);
//! ```

use crate::basis::{Basis, CompositeBasis};
use crate::distributor::{Distributor, ProcessContext};
use crate::domain::{AxisBasis, AxisSet, GridDtype};
use crate::spectral_error::SpectralError;
use serde::{Deserialize, Serialize};

fn default_dealias() -> f64 {
    1.0
}

/// Parameters common to every basis family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisFields {
    pub name: String,
    pub size: usize,
    pub bounds: [f64; 2],
    #[serde(default = "default_dealias")]
    pub dealias: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BasisConfig {
    Fourier(BasisFields),
    RealFourier(BasisFields),
    Chebyshev(BasisFields),
    Legendre(BasisFields),
}

impl BasisConfig {
    pub fn fields(&self) -> &BasisFields {
        match self {
            BasisConfig::Fourier(f)
            | BasisConfig::RealFourier(f)
            | BasisConfig::Chebyshev(f)
            | BasisConfig::Legendre(f) => f,
        }
    }

    pub fn build(&self) -> Result<Basis, SpectralError> {
        let f = self.fields();
        let bounds = (f.bounds[0], f.bounds[1]);
        let basis = match self {
            BasisConfig::Fourier(_) => Basis::fourier(f.name.clone(), f.size, bounds)?,
            BasisConfig::RealFourier(_) => Basis::real_fourier(f.name.clone(), f.size, bounds)?,
            BasisConfig::Chebyshev(_) => Basis::chebyshev(f.name.clone(), f.size, bounds)?,
            BasisConfig::Legendre(_) => Basis::legendre(f.name.clone(), f.size, bounds)?,
        };
        basis.with_dealias(f.dealias)
    }
}

/// One domain axis: a single basis or a composite of segments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisConfig {
    Composite {
        name: String,
        segments: Vec<BasisConfig>,
    },
    Single(BasisConfig),
}

impl AxisConfig {
    pub fn build(&self) -> Result<AxisBasis, SpectralError> {
        match self {
            AxisConfig::Single(b) => Ok(b.build()?.into()),
            AxisConfig::Composite { name, segments } => {
                let segments = segments
                    .iter()
                    .map(BasisConfig::build)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompositeBasis::new(name.clone(), segments)?.into())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub axes: Vec<AxisConfig>,
    #[serde(default)]
    pub dtype: GridDtype,
    /// Process mesh shape; `None` spans every process along one dimension.
    #[serde(default)]
    pub mesh: Option<Vec<usize>>,
}

impl DomainConfig {
    pub fn build_axes(&self) -> Result<AxisSet, SpectralError> {
        let axes = self
            .axes
            .iter()
            .map(AxisConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        AxisSet::new(axes, self.dtype)
    }

    pub fn build_distributor(&self, context: ProcessContext) -> Result<Distributor, SpectralError> {
        Distributor::new(self.build_axes()?, self.mesh.clone(), context)
    }
}
