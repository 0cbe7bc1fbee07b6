use emod_burnin::{Error, Result};
use serde::Deserialize;

/// Run-wide settings shared by every builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BurnInParameters {
    pub serialize_years: u32,
    pub num_seeds: u32,
}

impl Default for BurnInParameters {
    fn default() -> Self {
        Self {
            serialize_years: 2,
            num_seeds: 3,
        }
    }
}

impl BurnInParameters {
    /// Length of the burn-in, which is also the serialization day.
    pub fn burnin_days(&self) -> Result<u32> {
        if self.serialize_years == 0 {
            return Err(Error::InvalidParameters(
                "serialize_years must be at least 1".into(),
            ));
        }
        self.serialize_years.checked_mul(365).ok_or_else(|| {
            Error::InvalidParameters(format!(
                "serialize_years = {} is too long a burn-in",
                self.serialize_years
            ))
        })
    }

    pub fn with_overrides(self, serialize_years: Option<u32>, num_seeds: Option<u32>) -> Self {
        Self {
            serialize_years: serialize_years.unwrap_or(self.serialize_years),
            num_seeds: num_seeds.unwrap_or(self.num_seeds),
        }
    }
}
