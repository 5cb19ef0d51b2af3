//! Balance gating and exact ether/wei conversion.

use alloy_primitives::{
    utils::{format_ether as format_ether_padded, parse_units, ParseUnits},
    U256,
};

use crate::{context::WalletBalance, errors::AmountError};

/// Native currency decimals (1 ether = 10^18 wei).
pub const ETHER_DECIMALS: u8 = 18;

/// True iff `requested` does not exceed the balance. A missing balance counts as zero.
pub fn has_sufficient_balance(requested: U256, balance: Option<&WalletBalance>) -> bool {
    requested <= available(balance)
}

pub(crate) fn available(balance: Option<&WalletBalance>) -> U256 {
    balance.map(|b| b.value_wei).unwrap_or(U256::ZERO)
}

/// Parse a decimal ether amount (e.g. `"1.5"`) into wei without any rounding.
///
/// Blank input is zero, matching an untouched amount field.
pub fn parse_ether(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative(trimmed.to_string()));
    }
    let fraction_digits = trimmed.split_once('.').map_or(0, |(_, frac)| frac.len());
    if fraction_digits > ETHER_DECIMALS as usize {
        return Err(AmountError::Invalid {
            input: trimmed.to_string(),
            message: format!("more than {ETHER_DECIMALS} decimal places"),
        });
    }
    match parse_units(trimmed, ETHER_DECIMALS) {
        Ok(ParseUnits::U256(wei)) => Ok(wei),
        Ok(ParseUnits::I256(_)) => Err(AmountError::Negative(trimmed.to_string())),
        Err(err) => Err(AmountError::Invalid {
            input: trimmed.to_string(),
            message: err.to_string(),
        }),
    }
}

/// Format wei as decimal ether with trailing zeros removed (`1.5`, `1.0`, `0.0`).
pub fn format_ether(wei: U256) -> String {
    let padded = format_ether_padded(wei);
    match padded.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => format!("{padded}.0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn balance(wei: u128) -> WalletBalance {
        WalletBalance {
            owner: Address::ZERO,
            value_wei: U256::from(wei),
        }
    }

    #[test]
    fn guard_compares_against_balance() {
        let one_eth = balance(1_000_000_000_000_000_000);
        assert!(has_sufficient_balance(U256::ZERO, Some(&one_eth)));
        assert!(has_sufficient_balance(one_eth.value_wei, Some(&one_eth)));
        assert!(!has_sufficient_balance(one_eth.value_wei + U256::from(1), Some(&one_eth)));
    }

    #[test]
    fn guard_treats_missing_balance_as_zero() {
        assert!(has_sufficient_balance(U256::ZERO, None));
        assert!(!has_sufficient_balance(U256::from(1), None));
    }

    #[test]
    fn guard_handles_full_width_amounts() {
        let max = WalletBalance {
            owner: Address::ZERO,
            value_wei: U256::MAX,
        };
        assert!(has_sufficient_balance(U256::MAX, Some(&max)));
        assert!(!has_sufficient_balance(U256::MAX, Some(&balance(u128::MAX))));
    }

    #[test]
    fn parses_decimal_ether_exactly() {
        assert_eq!(
            parse_ether("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::from(1));
        assert_eq!(parse_ether("").unwrap(), U256::ZERO);
        assert_eq!(parse_ether("  2 ").unwrap(), U256::from(2_000_000_000_000_000_000u128));
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(matches!(parse_ether("-1"), Err(AmountError::Negative(_))));
        assert!(matches!(parse_ether("abc"), Err(AmountError::Invalid { .. })));
        assert!(matches!(parse_ether("1.2.3"), Err(AmountError::Invalid { .. })));
        assert!(matches!(
            parse_ether("0.0000000000000000001"),
            Err(AmountError::Invalid { .. })
        ));
    }

    #[test]
    fn formats_trimmed_ether() {
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_ether(U256::from(1_000_000_000_000_000_000u128)), "1.0");
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(U256::from(1)), "0.000000000000000001");
    }
}
