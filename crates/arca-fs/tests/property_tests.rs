use arca_fs::{NormalizedPath, SpecialFolders};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    // Plain file name components: no separators, no dots, no tokens.
    "[a-zA-Z0-9_][a-zA-Z0-9_ -]{0,10}".prop_map(|s| s.trim_end().to_string())
        .prop_filter("non-empty after trim", |s| !s.is_empty())
}

fn segments(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..max)
}

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        // No backslashes survive normalization.
        prop_assert!(!as_str.contains('\\'));

        // Separator runs collapse; only a UNC prefix may keep "//".
        let is_network = as_str.starts_with("//") && !as_str.starts_with("///");
        if is_network {
            prop_assert!(!as_str[2..].contains("//"));
        } else {
            prop_assert!(!as_str.contains("//"));
        }

        // Normalization is idempotent through the native form.
        let roundtripped = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, roundtripped);
    }

    #[test]
    fn test_join_then_strip_recovers_tail(base in segments(4), tail in segments(4)) {
        let base = NormalizedPath::new(format!("/{}", base.join("/")));
        let tail = tail.join("/");

        let joined = base.join(&tail);
        prop_assert_eq!(joined.strip_prefix(&base), Some(tail.as_str()));
    }

    #[test]
    fn test_token_key_round_trips(tail in segments(4)) {
        let folders = SpecialFolders::from_pairs([
            ("%UserProfile%", "C:/Users/jo"),
            ("%Documents%", "C:/Users/jo/Documents"),
        ]);
        let path = format!("C:/Users/jo/Documents/{}", tail.join("/"));

        let key = folders.to_portable(&path);
        prop_assert!(key.starts_with("%Documents%"));
        prop_assert_eq!(folders.expand_key(&key), Some(path));
    }

    #[test]
    fn test_drive_key_round_trips(tail in segments(4)) {
        let folders = SpecialFolders::from_pairs(std::iter::empty::<(&str, &str)>());
        let path = format!("D:/{}", tail.join("/"));

        let key = folders.to_portable(&path);
        prop_assert!(key.starts_with("D/"));
        prop_assert_eq!(folders.expand_key(&key), Some(path));
    }
}
