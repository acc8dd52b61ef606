//! First-order autoregressive latent factor.
//!
//! ```text
//! x_k = mu + phi_1 · x_{k-1} + √dt · ε_k,   ε_k ~ N(0, 1)
//! ```
//!
//! The autoregressive step is one period whatever the time step; `dt` only
//! scales the noise.

use crate::stochastic_process::StochasticProcess1D;
use pa_core::{Error, Real, Result, Time};
use serde::{Deserialize, Deserializer, Serialize};

/// Parameters as they appear in configuration files.
///
/// Both `mu / phi / initial_conditions` and the legacy capitalised keys are
/// accepted.
#[derive(Debug, Deserialize)]
struct Ar1Spec {
    #[serde(alias = "Mu")]
    mu: Real,
    #[serde(alias = "Phi")]
    phi: Vec<Real>,
    #[serde(alias = "Initial Conditions")]
    initial_conditions: Vec<Real>,
}

/// An AR(1) process for the latent credit-quality variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ar1Process {
    mu: Real,
    phi: Vec<Real>,
    initial_conditions: Vec<Real>,
}

impl<'de> Deserialize<'de> for Ar1Process {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let spec = Ar1Spec::deserialize(deserializer)?;
        Self::with_coefficients(spec.mu, spec.phi, spec.initial_conditions)
            .map_err(serde::de::Error::custom)
    }
}

impl Ar1Process {
    /// Create a process with drift `mu`, coefficient `phi1` and start `x0`.
    pub fn new(mu: Real, phi1: Real, x0: Real) -> Result<Self> {
        Self::with_coefficients(mu, vec![phi1], vec![x0])
    }

    /// Create from coefficient and initial-condition lists.
    ///
    /// Only the first entry of each list drives the AR(1) dynamics; longer
    /// lists are kept for round-tripping configuration files.
    pub fn with_coefficients(
        mu: Real,
        phi: Vec<Real>,
        initial_conditions: Vec<Real>,
    ) -> Result<Self> {
        if phi.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one autoregressive coefficient is required".into(),
            ));
        }
        if initial_conditions.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one initial condition is required".into(),
            ));
        }
        if !mu.is_finite()
            || phi.iter().chain(&initial_conditions).any(|v| !v.is_finite())
        {
            return Err(Error::InvalidArgument(
                "process parameters must be finite".into(),
            ));
        }
        Ok(Self {
            mu,
            phi,
            initial_conditions,
        })
    }

    /// Parse from a JSON object such as
    /// `{"Mu": 0.0, "Phi": [1.0], "Initial Conditions": [0.0]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Drift `mu`.
    pub fn mu(&self) -> Real {
        self.mu
    }

    /// First autoregressive coefficient.
    pub fn phi1(&self) -> Real {
        self.phi[0]
    }

    /// Deterministic part of the next value, `mu + phi1 · x`.
    #[inline]
    pub fn offset(&self, x: Real) -> Real {
        self.mu + self.phi[0] * x
    }
}

impl StochasticProcess1D for Ar1Process {
    fn x0(&self) -> Real {
        self.initial_conditions[0]
    }

    fn drift_1d(&self, _t: Time, x: Real) -> Real {
        self.offset(x) - x
    }

    fn diffusion_1d(&self, _t: Time, _x: Real) -> Real {
        1.0
    }

    fn expectation_1d(&self, _t: Time, x: Real, _dt: Time) -> Real {
        self.offset(x)
    }
}
