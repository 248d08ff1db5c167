/// Property-based tests using proptest
/// Tests request building and key resolution invariants for all inputs
use pdl_connector::config::ConnectionConfig;
use pdl_connector::models::{EnrichRequest, Quals, KEY_COLUMNS};
use pdl_connector::ConnectorError;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

fn qual_name() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(KEY_COLUMNS.to_vec()).prop_map(str::to_string),
        "[a-z_]{1,12}",
    ]
}

// Property: request body holds exactly the recognized quals, values untouched
proptest! {
    #[test]
    fn request_contains_exactly_recognized_quals(
        entries in prop::collection::btree_map(qual_name(), "\\PC*", 0..8)
    ) {
        let quals: Quals = entries.clone().into_iter().collect();
        let expected: BTreeMap<String, String> = entries
            .into_iter()
            .filter(|(k, _)| KEY_COLUMNS.contains(&k.as_str()))
            .collect();

        match EnrichRequest::from_quals(&quals) {
            Ok(request) => {
                prop_assert!(!expected.is_empty());
                let body: Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
                let object = body.as_object().unwrap();
                prop_assert_eq!(object.len(), expected.len());
                for (key, value) in &expected {
                    prop_assert_eq!(object.get(key).and_then(Value::as_str), Some(value.as_str()));
                }
            }
            Err(ConnectorError::MissingPredicate) => prop_assert!(expected.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn unrecognized_quals_only_is_missing_predicate(
        entries in prop::collection::btree_map("[a-z_]{1,12}", "\\PC*", 0..8)
    ) {
        prop_assume!(entries.keys().all(|k| !KEY_COLUMNS.contains(&k.as_str())));
        let quals: Quals = entries.into_iter().collect();
        prop_assert!(matches!(
            EnrichRequest::from_quals(&quals),
            Err(ConnectorError::MissingPredicate)
        ));
    }
}

// Property: a configured key always wins over the environment
proptest! {
    #[test]
    fn config_key_takes_precedence(config_key in "\\PC{1,40}", env_key in prop::option::of("\\PC*")) {
        let config = ConnectionConfig { api_key: Some(config_key.clone()) };
        prop_assert_eq!(config.api_key_with(move |_| env_key), config_key);
    }

    #[test]
    fn env_key_used_when_config_unset(env_key in "\\PC{1,40}") {
        let config = ConnectionConfig::default();
        let expected = env_key.clone();
        prop_assert_eq!(config.api_key_with(move |_| Some(env_key)), expected);
    }
}
