//! Balances and display units.
//!
//! The ledger reports every amount in **mutez**, the smallest unit
//! (1 tez = 1 000 000 mutez). The client never does arithmetic on balances;
//! it only parses what the ledger returns and formats it for display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of mutez in one tez.
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// Display unit for [`Mutez::format`].
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
pub enum Unit {
    /// Raw ledger unit.
    #[strum(serialize = "mutez")]
    Mutez,
    /// Human unit, six decimals.
    #[strum(to_string = "tez", serialize = "tz")]
    Tez,
}

/// An unsigned amount in mutez.
///
/// # Examples
///
/// ```
/// use guestbook_models::{Mutez, Unit};
///
/// let balance = Mutez::new(1_500_000);
/// assert_eq!(balance.format(Unit::Tez), "1.5");
/// assert_eq!(balance.format(Unit::Mutez), "1500000");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct Mutez(u64);

impl Mutez {
    /// Zero mutez.
    pub const ZERO: Mutez = Mutez(0);

    /// Wrap a raw mutez quantity.
    pub const fn new(mutez: u64) -> Self {
        Self(mutez)
    }

    /// The raw mutez quantity.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Format the amount in the requested unit.
    ///
    /// Tez are rendered with up to six decimals and trailing zeros removed,
    /// so `1_000_000` is `"1"` and `1_230_000` is `"1.23"`.
    pub fn format(self, unit: Unit) -> String {
        match unit {
            Unit::Mutez => self.0.to_string(),
            Unit::Tez => {
                let whole = self.0 / MUTEZ_PER_TEZ;
                let frac = self.0 % MUTEZ_PER_TEZ;
                if frac == 0 {
                    whole.to_string()
                } else {
                    let decimals = format!("{frac:06}");
                    format!("{whole}.{}", decimals.trim_end_matches('0'))
                }
            }
        }
    }
}

impl fmt::Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tez", self.format(Unit::Tez))
    }
}

impl From<u64> for Mutez {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl FromStr for Mutez {
    type Err = ModelError;

    /// Parse the decimal mutez string the RPC returns (e.g. `"4213000"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| ModelError::InvalidAmount {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}
