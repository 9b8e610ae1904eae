//! Asset reference validation properties

use postsmith::workflow::state::ASSET_URN_PREFIX;
use postsmith::workflow::AssetId;
use proptest::prelude::*;

/// Well-formed references are accepted verbatim
#[test]
fn test_well_formed_asset_ids_parse() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[A-Za-z0-9_-]{1,32}", |suffix| {
            let raw = format!("{}{}", ASSET_URN_PREFIX, suffix);
            let parsed = AssetId::parse(&raw);
            prop_assert_eq!(parsed.as_ref().map(|a| a.as_str()), Some(raw.as_str()));
            Ok(())
        })
        .unwrap();
}

/// Anything without the asset prefix is rejected
#[test]
fn test_foreign_strings_are_rejected() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |raw| {
            prop_assume!(!raw.trim().starts_with(ASSET_URN_PREFIX));
            prop_assert!(AssetId::parse(&raw).is_none());
            Ok(())
        })
        .unwrap();
}
