//! Property tests for the name model.

use fxl_core::{Name, Path};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "\\PC*|[ \t\r\n\u{2028}\u{2029}]{0,6}") {
        let (once, _) = Name::normalize(&text);
        let (twice, changed) = Name::normalize(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(!changed);
    }

    #[test]
    fn normalized_names_are_never_blank(text in "[ \t\r\n]{0,8}") {
        let name = Name::normalized(&text);
        prop_assert!(!name.as_str().trim().is_empty());
        prop_assert!(name.is_valid());
    }

    #[test]
    fn path_display_round_trips(segments in prop::collection::vec("[A-Za-z_][A-Za-z0-9_ ']{0,8}", 0..5)) {
        let segments: Vec<Name> = segments
            .iter()
            .filter(|s| Name::is_valid_text(s))
            .map(|s| Name::new(s.as_str()))
            .collect();
        let path = Path::from_segments(segments);
        let parsed = Path::parse(&path.to_string());
        prop_assert_eq!(parsed, Some(path));
    }
}
