//! Property tests for recipient parsing, balance gating and event decoding.

use std::collections::HashSet;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use proptest::prelude::*;
use red_envelope_client::{
    decode_log, format_ether, has_sufficient_balance, parse_ether, AddressSet, DecodeOutcome,
    DecodedEvent, RawLog, WalletBalance,
};
use red_envelope_types::Create;

fn arb_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

fn arb_u256() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| U256::from_be_bytes(bytes))
}

/// Lines drawn from a small pool so duplicates are common.
fn arb_recipient_lines() -> impl Strategy<Value = Vec<String>> {
    let pool = prop_oneof![
        arb_address().prop_map(|a| format!("{a:#x}")),
        Just("0x00000000000000000000000000000000000a11ce".to_string()),
        Just("not-an-address".to_string()),
        Just(String::new()),
        "[0-9a-fx]{0,8}",
    ];
    prop::collection::vec(pool, 0..12)
}

proptest! {
    #[test]
    fn guard_matches_integer_comparison(requested in arb_u256(), balance in arb_u256()) {
        let snapshot = WalletBalance { owner: Address::ZERO, value_wei: balance };
        prop_assert_eq!(has_sufficient_balance(requested, Some(&snapshot)), requested <= balance);
        prop_assert_eq!(has_sufficient_balance(requested, None), requested.is_zero());
    }

    #[test]
    fn address_set_is_deduplicated_in_first_occurrence_order(lines in arb_recipient_lines()) {
        let raw = lines.join("\n");
        let set = AddressSet::parse(&raw);

        let mut seen = HashSet::new();
        let expected: Vec<String> = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('\n').filter(|l| seen.insert(*l)).map(str::to_string).collect()
        };
        prop_assert_eq!(set.entries(), expected.as_slice());

        let unique: HashSet<&String> = set.entries().iter().collect();
        prop_assert_eq!(unique.len(), set.len());
    }

    #[test]
    fn create_event_round_trips_through_a_log(
        id in arb_u256(),
        sender in arb_address(),
        receivers in prop::collection::vec(arb_address(), 0..6),
        amount in arb_u256(),
    ) {
        let event = Create { id, sender, receivers: receivers.clone(), amount };
        let data = event.encode_log_data();
        let log = RawLog { topics: data.topics().to_vec(), data: data.data };

        let expected = DecodeOutcome::Matched(DecodedEvent::Create { id, sender, receivers, amount });
        prop_assert_eq!(decode_log(&log), expected.clone());
        // Decoding is a pure function of the log.
        prop_assert_eq!(decode_log(&log), expected);
    }

    #[test]
    fn formatted_ether_parses_back(wei in arb_u256()) {
        prop_assert_eq!(parse_ether(&format_ether(wei)).unwrap(), wei);
    }
}
