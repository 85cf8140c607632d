//! Property-Based Tests for the Template Engine
//!
//! # Test Properties
//!
//! 1. **Passthrough**: text without `$` is never altered
//! 2. **Unknown tokens**: placeholders with no value survive verbatim
//! 3. **Truncation**: a duration renders like its whole-millisecond floor

#![cfg(test)]

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;

use super::formatter::{format_duration, iso_duration, substitute};

// =============================================================================
// Property Strategies
// =============================================================================

/// Template text that contains no placeholder syntax at all
fn plain_text_strategy() -> impl Strategy<Value = String> {
    "[^$]{0,200}"
}

/// Token names that are never given a value
fn unknown_token_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}"
}

// =============================================================================
// Substitution Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_plain_text_passes_through(text in plain_text_strategy()) {
        let mut values = HashMap::new();
        values.insert("method.name", "ignored".to_string());
        prop_assert_eq!(substitute(&text, &values), text);
    }

    #[test]
    fn prop_unknown_tokens_survive(
        prefix in plain_text_strategy(),
        token in unknown_token_strategy(),
        suffix in plain_text_strategy(),
    ) {
        let template = format!("{}${{{}}}{}", prefix, token, suffix);
        let values = HashMap::new();
        prop_assert_eq!(substitute(&template, &values), template);
    }

    #[test]
    fn prop_known_token_is_replaced(
        prefix in plain_text_strategy(),
        value in plain_text_strategy(),
        suffix in plain_text_strategy(),
    ) {
        let mut values = HashMap::new();
        values.insert("method.result", value.clone());
        let template = format!("{}${{method.result}}{}", prefix, suffix);
        prop_assert_eq!(
            substitute(&template, &values),
            format!("{}{}{}", prefix, value, suffix)
        );
    }
}

// =============================================================================
// Duration Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_duration_truncates_to_millis(nanos in 0u64..10_000_000_000_000) {
        let millis = nanos / 1_000_000;
        prop_assert_eq!(format_duration(Duration::from_nanos(nanos)), iso_duration(millis));
    }

    #[test]
    fn prop_iso_duration_shape(millis in 1u64..1_000_000_000) {
        let text = iso_duration(millis);
        prop_assert!(text.starts_with("PT"));
        prop_assert!(text.ends_with('S') || text.ends_with('M') || text.ends_with('H'));
        prop_assert!(!text.contains(".S"));
    }
}
