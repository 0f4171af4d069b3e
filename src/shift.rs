use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnisoError;
use crate::potentials::{AnisoKernel, PairContext, PairOutput};

/// Energy shifting at the cutoff, one setting per potential instance.
///
/// `Shift` removes the jump in energy at the cutoff only; forces and torques
/// still drop discontinuously to zero there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftMode {
    #[default]
    None,
    Shift,
}

impl ShiftMode {
    pub fn apply<K: AnisoKernel>(
        self,
        raw: PairOutput,
        kernel: &K,
        ctx: &PairContext,
        params: &K::Params,
        r_cut: f64,
    ) -> PairOutput {
        match self {
            ShiftMode::None => raw,
            ShiftMode::Shift => PairOutput {
                energy: raw.energy - kernel.energy_at_cutoff(ctx, params, r_cut),
                ..raw
            },
        }
    }
}

impl FromStr for ShiftMode {
    type Err = AnisoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ShiftMode::None),
            "shift" => Ok(ShiftMode::Shift),
            other => Err(AnisoError::InvalidConfiguration(format!(
                "unknown shift mode {other:?}, expected \"none\" or \"shift\""
            ))),
        }
    }
}

impl fmt::Display for ShiftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftMode::None => write!(f, "none"),
            ShiftMode::Shift => write!(f, "shift"),
        }
    }
}
