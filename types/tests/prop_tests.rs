use proptest::prelude::*;

use votechain_types::{Address, Timestamp, TxHash, VotingPeriod};

fn arb_period() -> impl Strategy<Value = VotingPeriod> {
    (0u64..1_000_000, 1u64..1_000_000, 0u64..3_000_000, any::<bool>()).prop_map(
        |(start, len, chain, is_set)| VotingPeriod {
            start_time: Timestamp::new(start),
            end_time: Timestamp::new(start + len),
            chain_time: Timestamp::new(chain),
            is_set,
        },
    )
}

proptest! {
    /// Active and ended are never reported together.
    #[test]
    fn active_and_ended_are_exclusive(period in arb_period()) {
        prop_assert!(!(period.is_active() && period.has_ended()));
    }

    /// Both flags are false exactly when unset or not yet started.
    #[test]
    fn neither_flag_only_before_start(period in arb_period()) {
        let neither = !period.is_active() && !period.has_ended();
        let expected = !period.is_set || period.chain_time < period.start_time;
        prop_assert_eq!(neither, expected);
    }

    /// Any 20 bytes hex-encoded with the prefix parse to the same lowercase text.
    #[test]
    fn address_parse_accepts_any_20_bytes(bytes in prop::array::uniform20(0u8..)) {
        let raw = format!("0x{}", hex_upper(&bytes));
        let address = Address::parse(&raw).unwrap();
        prop_assert_eq!(address.as_str(), raw.to_ascii_lowercase());
    }

    /// TxHash display output parses back to the same hash.
    #[test]
    fn tx_hash_display_parses_back(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        prop_assert_eq!(TxHash::parse(&hash.to_string()).unwrap(), hash);
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
