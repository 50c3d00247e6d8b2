// tests/property/protocol_test.rs

//! Property-based tests for frame classification and code generation

use proptest::prelude::*;
use uniclip::core::pairing::code::{CodeGenerator, is_well_formed};
use uniclip::core::protocol::{ClientCommand, ServerMessage};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_generated_codes_are_well_formed(length in 1usize..=16) {
        let generator = CodeGenerator::new(length, 1);
        let code = generator.generate();
        prop_assert!(is_well_formed(&code, length), "bad code {:?}", code);
    }

    #[test]
    fn test_non_command_text_is_a_verbatim_payload(text in "\\PC*") {
        prop_assume!(!text.starts_with("OPEN:"));
        prop_assume!(!text.starts_with("JOIN:"));
        prop_assume!(text != "PING");
        prop_assume!(!text.trim().is_empty());

        prop_assert_eq!(
            ClientCommand::parse(text.clone()),
            ClientCommand::Payload(text)
        );
    }

    #[test]
    fn test_join_code_is_always_trimmed(
        code in "[A-Z2-9]{1,16}",
        left in "[ \\t]{0,4}",
        right in "[ \\t\\r\\n]{0,4}"
    ) {
        let frame = format!("JOIN:{left}{code}{right}");
        prop_assert_eq!(ClientCommand::parse(frame), ClientCommand::Join(code));
    }

    #[test]
    fn test_blank_frames_are_empty(text in "[ \\t\\r\\n]{0,32}") {
        prop_assert_eq!(ClientCommand::parse(text), ClientCommand::Empty);
    }

    #[test]
    fn test_payload_wire_text_is_unchanged(text in ".{0,512}") {
        prop_assert_eq!(ServerMessage::Payload(text.clone()).into_wire(), text);
    }
}
