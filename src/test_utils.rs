//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid package ID (publisher-style dotted or dashed names)
    pub fn package_id() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9._-]{0,40}"
            .prop_filter("ID must not be a relative path component", |s| {
                s != "." && s != ".."
            })
    }

    /// Generate a dotted version string
    pub fn version() -> impl Strategy<Value = String> {
        (0u32..100, 0u32..100, proptest::option::of(0u32..10000)).prop_map(
            |(major, minor, build)| match build {
                Some(build) => format!("{major}.{minor}.{build}"),
                None => format!("{major}.{minor}"),
            },
        )
    }

    /// Generate a host version identifier, known or not
    pub fn host_version() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("11.0".to_string()),
            Just("12.0".to_string()),
            Just("14.0".to_string()),
            (15u32..20).prop_map(|major| format!("{major}.0")),
        ]
    }

    /// Generate a valid URL
    pub fn url() -> impl Strategy<Value = String> {
        ("[a-z]{3,10}", "[a-z]{2,5}", "[a-z0-9-]{1,20}")
            .prop_map(|(domain, tld, path)| format!("https://{domain}.{tld}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_id_generator(id in package_id()) {
            prop_assert!(!id.is_empty());
            prop_assert!(!id.contains('/'));
            prop_assert!(!id.contains('\\'));
        }

        #[test]
        fn test_version_generator(v in version()) {
            prop_assert!(v.split('.').all(|part| part.parse::<u32>().is_ok()));
        }

        #[test]
        fn test_url_generator(u in url()) {
            prop_assert!(u.starts_with("https://"));
        }
    }
}
