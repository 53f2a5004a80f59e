//! Field-level differences between two state payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{StateMap, Value};

/// Before/after values of one key. `None` means the key was absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub from: Option<Value>,
    pub to: Option<Value>,
}

/// Changed keys in key order.
pub type Diff = BTreeMap<String, Change>;

/// Compute the keys whose values differ between `before` and `after`.
///
/// Covers the union of keys of both maps. Values are compared deeply; a key
/// present on one side only is a change.
pub fn diff(before: &StateMap, after: &StateMap) -> Diff {
    let mut changes = Diff::new();

    for (key, old) in before {
        match after.get(key) {
            Some(new) if new == old => {}
            new => {
                changes.insert(
                    key.clone(),
                    Change {
                        from: Some(old.clone()),
                        to: new.cloned(),
                    },
                );
            }
        }
    }

    for (key, new) in after {
        if !before.contains_key(key) {
            changes.insert(
                key.clone(),
                Change {
                    from: None,
                    to: Some(new.clone()),
                },
            );
        }
    }

    changes
}

/// The changed keys of a diff, in key order.
pub fn changed_keys(diff: &Diff) -> Vec<String> {
    diff.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn reports_changed_and_added_keys_only() {
        let before = btree! {
            "a".to_string() => Value::from(1),
            "b".to_string() => Value::from(2),
        };
        let after = btree! {
            "a".to_string() => Value::from(1),
            "b".to_string() => Value::from(3),
            "c".to_string() => Value::from(4),
        };

        let d = diff(&before, &after);
        assert_eq!(
            d,
            btree! {
                "b".to_string() => Change { from: Some(Value::from(2)), to: Some(Value::from(3)) },
                "c".to_string() => Change { from: None, to: Some(Value::from(4)) },
            }
        );
        assert_eq!(changed_keys(&d), vec!["b", "c"]);
    }

    #[test]
    fn removed_key_is_a_change() {
        let before = btree! { "gone".to_string() => Value::from(true) };
        let d = diff(&before, &StateMap::new());
        assert_eq!(
            d.get("gone"),
            Some(&Change {
                from: Some(Value::from(true)),
                to: None,
            })
        );
    }

    #[test]
    fn null_and_absent_differ() {
        let before = StateMap::new();
        let after = btree! { "x".to_string() => Value::Null };
        let d = diff(&before, &after);
        assert_eq!(d.get("x").map(|c| c.to.clone()), Some(Some(Value::Null)));
    }

    #[test]
    fn nested_values_compare_deeply() {
        let before = btree! { "list".to_string() => Value::from(vec![1, 2]) };
        let same = btree! { "list".to_string() => Value::from(vec![1, 2]) };
        let other = btree! { "list".to_string() => Value::from(vec![1, 2, 3]) };

        assert!(diff(&before, &same).is_empty());
        assert_eq!(changed_keys(&diff(&before, &other)), vec!["list"]);
    }

    #[test]
    fn serializes_absent_as_null() {
        let d = diff(&StateMap::new(), &btree! { "c".to_string() => Value::from(4) });
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            serde_json::json!({ "c": { "from": null, "to": 4 } })
        );
    }
}
