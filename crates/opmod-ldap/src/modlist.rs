//! Modification list between an existing entry and the desired one

use crate::attrs::Attributes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add { attr: String, values: Vec<Vec<u8>> },
    Replace { attr: String, values: Vec<Vec<u8>> },
    /// Removes the attribute with all its values
    Delete { attr: String },
}

impl Modification {
    pub fn attr(&self) -> &str {
        match self {
            Modification::Add { attr, .. }
            | Modification::Replace { attr, .. }
            | Modification::Delete { attr } => attr,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Modification::Add { attr, .. } => format!("add {}", attr),
            Modification::Replace { attr, .. } => format!("replace {}", attr),
            Modification::Delete { attr } => format!("delete {}", attr),
        }
    }
}

/// Compute the modifications turning `old` into `new`.
///
/// Attributes present only in `old` are left alone unless `remove_unset` is
/// set.
pub fn modify_list(old: &Attributes, new: &Attributes, remove_unset: bool) -> Vec<Modification> {
    let mut mods = Vec::new();

    for attr in new.iter() {
        let existing = old.get(&attr.name).filter(|a| !a.values.is_empty());

        match existing {
            Some(_) if attr.values.is_empty() => mods.push(Modification::Delete {
                attr: attr.name.clone(),
            }),
            None if attr.values.is_empty() => {}
            None => mods.push(Modification::Add {
                attr: attr.name.clone(),
                values: dedup(&attr.values),
            }),
            Some(current) if current.value_set() != attr.value_set() => {
                mods.push(Modification::Replace {
                    attr: attr.name.clone(),
                    values: dedup(&attr.values),
                })
            }
            Some(_) => {}
        }
    }

    if remove_unset {
        for attr in old.iter() {
            if new.get(&attr.name).is_none() {
                mods.push(Modification::Delete {
                    attr: attr.name.clone(),
                });
            }
        }
    }

    mods
}

fn dedup(values: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut out: Vec<Vec<u8>> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_identical_entries_need_nothing() {
        let old = attrs(&[("cn", "flynn"), ("objectClass", "person"), ("objectClass", "top")]);
        let new = attrs(&[("objectclass", "top"), ("objectclass", "person"), ("CN", "flynn")]);
        assert!(modify_list(&old, &new, true).is_empty());
    }

    #[test]
    fn test_add_and_replace() {
        let old = attrs(&[("cn", "flynn"), ("sn", "Flynn")]);
        let new = attrs(&[("cn", "flynn"), ("sn", "Flynn Sr."), ("mail", "kevin@encom.com")]);

        let mods = modify_list(&old, &new, false);
        assert_eq!(
            mods,
            vec![
                Modification::Replace {
                    attr: "sn".into(),
                    values: vec![b"Flynn Sr.".to_vec()]
                },
                Modification::Add {
                    attr: "mail".into(),
                    values: vec![b"kevin@encom.com".to_vec()]
                },
            ]
        );
    }

    #[test]
    fn test_unset_attributes_kept_by_default() {
        let old = attrs(&[("cn", "flynn"), ("description", "user")]);
        let new = attrs(&[("cn", "flynn")]);
        assert!(modify_list(&old, &new, false).is_empty());
    }

    #[test]
    fn test_unset_attributes_removed_on_request() {
        let old = attrs(&[("cn", "flynn"), ("description", "user")]);
        let new = attrs(&[("cn", "flynn")]);
        assert_eq!(
            modify_list(&old, &new, true),
            vec![Modification::Delete {
                attr: "description".into()
            }]
        );
    }

    #[test]
    fn test_empty_value_is_a_value() {
        let old = attrs(&[("cn", "flynn"), ("description", "user")]);
        let new = attrs(&[("cn", "flynn"), ("description", "")]);
        assert_eq!(
            modify_list(&old, &new, false),
            vec![Modification::Replace {
                attr: "description".into(),
                values: vec![Vec::new()]
            }]
        );
    }

    #[test]
    fn test_duplicate_values_are_collapsed() {
        let old = attrs(&[]);
        let new = attrs(&[("objectClass", "top"), ("objectClass", "top")]);
        assert_eq!(
            modify_list(&old, &new, false),
            vec![Modification::Add {
                attr: "objectClass".into(),
                values: vec![b"top".to_vec()]
            }]
        );
    }
}
