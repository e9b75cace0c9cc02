use proptest::prelude::*;

use ballot_types::{Address, BlockNumber, SessionId, WorkflowStatus};

proptest! {
    /// Address text form parses back to the same bytes regardless of digit case.
    #[test]
    fn address_text_form_is_canonical(bytes in prop::array::uniform20(0u8..), upper in any::<bool>()) {
        let addr = Address::new(bytes);
        let text = addr.to_string();
        let input = if upper { format!("0x{}", text[2..].to_uppercase()) } else { text.clone() };
        let parsed: Address = input.parse().unwrap();
        prop_assert_eq!(parsed, addr);
        prop_assert_eq!(parsed.to_string(), text);
    }

    /// Address bincode encoding is the raw 20 bytes, not the hex string.
    #[test]
    fn address_bincode_is_compact(bytes in prop::array::uniform20(0u8..)) {
        let addr = Address::new(bytes);
        let encoded = bincode::serialize(&addr).unwrap();
        prop_assert_eq!(encoded.len(), 20);
        let decoded: Address = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// Workflow ordering agrees with the index table.
    #[test]
    fn status_order_matches_index(a in 0u8..7, b in 0u8..7) {
        let sa = WorkflowStatus::from_index(a).unwrap();
        let sb = WorkflowStatus::from_index(b).unwrap();
        prop_assert_eq!(sa < sb, a < b);
        prop_assert_eq!(sa == sb, a == b);
    }

    /// `next` always moves exactly one step forward.
    #[test]
    fn status_next_is_single_step(a in 0u8..6) {
        let s = WorkflowStatus::from_index(a).unwrap();
        let n = s.next().unwrap();
        prop_assert_eq!(n.index(), a + 1);
    }

    /// Block number byte keys sort like the numbers.
    #[test]
    fn block_number_bytes_preserve_order(a in any::<u64>(), b in any::<u64>()) {
        let ka = BlockNumber::new(a).to_be_bytes();
        let kb = BlockNumber::new(b).to_be_bytes();
        prop_assert_eq!(ka < kb, a < b);
    }

    /// Session id successor is strictly greater.
    #[test]
    fn session_id_next_increases(a in 0u64..u64::MAX) {
        let id = SessionId::new(a);
        prop_assert!(id.checked_next().unwrap() > id);
    }
}
