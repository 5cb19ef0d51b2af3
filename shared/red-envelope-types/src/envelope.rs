use core::fmt;

use serde::{Deserialize, Serialize};

/// How the contract splits an envelope between its recipients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum EnvelopeType {
    /// Every recipient grabs the same share.
    #[default]
    Equal = 0,
    /// Shares are drawn at random by the contract.
    Random = 1,
}

impl EnvelopeType {
    /// Wire value passed as the `uint8 envelopeType` argument.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EnvelopeType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            0 => EnvelopeType::Equal,
            1 => EnvelopeType::Random,
            other => return Err(other),
        };
        Ok(kind)
    }
}

impl fmt::Display for EnvelopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeType::Equal => f.write_str("equal"),
            EnvelopeType::Random => f.write_str("random"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EnvelopeType;

    #[test]
    fn wire_values_round_trip() {
        for kind in [EnvelopeType::Equal, EnvelopeType::Random] {
            assert_eq!(EnvelopeType::try_from(kind.as_u8()), Ok(kind));
        }
        assert_eq!(EnvelopeType::try_from(7), Err(7));
    }
}
