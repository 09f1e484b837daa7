use git_changelog::domain::version::{compare, compare_lenient, release_order, SemanticVersion};
use proptest::prelude::*;
use std::cmp::Ordering;

/// Version strings of one to five components, with an optional `v` prefix
/// and build metadata
fn version_string() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        0u64..20,
        proptest::option::of(0u64..20),
        proptest::option::of(0u64..20),
        proptest::option::of("[a-zA-Z][a-zA-Z0-9]{0,5}"),
        proptest::option::of(0u64..5),
        any::<bool>(),
    )
        .prop_map(|(prefix, major, minor, patch, label, number, build)| {
            let mut s = format!("{}{}", if prefix { "v" } else { "" }, major);
            if let Some(minor) = minor {
                s.push_str(&format!(".{}", minor));
                if let Some(patch) = patch {
                    s.push_str(&format!(".{}", patch));
                    if let Some(label) = label {
                        s.push_str(&format!("-{}", label));
                        if let Some(number) = number {
                            s.push_str(&format!(".{}", number));
                        }
                    }
                }
            }
            if build {
                s.push_str("+build7");
            }
            s
        })
}

proptest! {
    #[test]
    fn generated_versions_parse(a in version_string()) {
        prop_assert!(SemanticVersion::parse(&a).is_ok());
    }

    #[test]
    fn compare_is_reflexive(a in version_string()) {
        prop_assert_eq!(compare(&a, &a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(a in version_string(), b in version_string()) {
        prop_assert_eq!(compare(&a, &b).unwrap(), compare(&b, &a).unwrap().reverse());
    }

    #[test]
    fn compare_is_transitive(a in version_string(), b in version_string(), c in version_string()) {
        let ab = compare(&a, &b).unwrap();
        let bc = compare(&b, &c).unwrap();
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(compare(&a, &c).unwrap(), Ordering::Greater);
        }
    }

    #[test]
    fn unparseable_sorts_after_versions(a in version_string(), junk in "[a-z]{1,8}") {
        prop_assert_eq!(compare_lenient(&a, &junk).unwrap(), Ordering::Less);
        prop_assert_eq!(compare_lenient(&junk, &a).unwrap(), Ordering::Greater);
    }

    #[test]
    fn release_order_is_total(a in "[a-z0-9.\\-]{1,10}", b in "[a-z0-9.\\-]{1,10}") {
        prop_assert_eq!(release_order(&a, &b), release_order(&b, &a).reverse());
    }
}

#[test]
fn test_documented_orderings() {
    assert_eq!(compare("v1.0.0", "1.0.0").unwrap(), Ordering::Equal);
    assert_eq!(compare("1.0.0-alpha", "1.0.0").unwrap(), Ordering::Less);
    assert_eq!(compare("9.8.7", "10.0.0").unwrap(), Ordering::Less);
    assert_eq!(compare("1.0.0-alpha", "1.0.0-alpha.1").unwrap(), Ordering::Less);
    assert_eq!(compare("1", "1.0").unwrap(), Ordering::Less);
    assert!(compare_lenient("nightly", "trunk").is_err());
}
