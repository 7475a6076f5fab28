use go_surface::model::import_path::{escape, unescape};
use go_surface::model::tag;
use go_surface::ImportDeclaration;
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_,.=-]{0,12}"
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn tag_lookup_finds_every_pair(pairs in prop::collection::vec((key(), value()), 1..5)) {
        let body: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}:\"{v}\"")).collect();
        let raw = format!("`{}`", body.join(" "));
        for (k, _) in &pairs {
            // the first occurrence of a key wins
            let expected = &pairs.iter().find(|(other, _)| other == k).unwrap().1;
            prop_assert_eq!(&tag::lookup(&raw, k), expected);
        }
        prop_assert_eq!(tag::lookup(&raw, "MISSING"), "");
    }

    #[test]
    fn tag_lookup_never_panics(raw in ".*", k in ".*") {
        let _ = tag::lookup(&raw, &k);
    }

    #[test]
    fn unescape_without_markers_is_identity(path in "[a-z0-9./_-]{0,40}") {
        prop_assert_eq!(unescape(&path), path);
    }

    #[test]
    fn unescape_consumes_every_marker(path in "[a-zA-Z0-9./_-]{0,40}") {
        let escaped = escape(&path);
        let back = unescape(&escaped);
        prop_assert!(!back.contains('!'));
        prop_assert_eq!(back, path);
    }

    #[test]
    fn prefix_is_alias_or_last_segment(
        segments in prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..5),
        alias in prop::option::of("[a-z]{1,6}"),
    ) {
        let decl = ImportDeclaration {
            alias: alias.clone().unwrap_or_default(),
            path: format!("\"{}\"", segments.join("/")),
        };
        let expected = alias.unwrap_or_else(|| segments.last().unwrap().clone());
        prop_assert_eq!(decl.prefix(), expected.as_str());
    }
}
