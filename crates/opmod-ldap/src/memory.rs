//! In-memory directory for tests

use async_trait::async_trait;
use std::collections::HashMap;

use crate::attrs::Attributes;
use crate::directory::Directory;
use crate::error::Result;
use crate::modlist::Modification;

#[derive(Default)]
pub struct MemoryDirectory {
    entries: HashMap<String, Attributes>,
    writes: usize,
}

impl MemoryDirectory {
    pub fn contains(&self, dn: &str) -> bool {
        self.entries.contains_key(&dn.to_ascii_lowercase())
    }

    pub fn entry(&self, dn: &str) -> Option<&Attributes> {
        self.entries.get(&dn.to_ascii_lowercase())
    }

    /// Number of add, modify and delete operations applied
    pub fn writes(&self) -> usize {
        self.writes
    }
}

fn without(attrs: &Attributes, name: &str) -> Attributes {
    attrs
        .iter()
        .filter(|a| !a.name.eq_ignore_ascii_case(name))
        .flat_map(|a| a.values.iter().map(move |v| (a.name.as_str(), v.as_slice())))
        .collect()
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn read_entry(&mut self, dn: &str) -> Result<Option<Attributes>> {
        Ok(self.entry(dn).cloned())
    }

    async fn add_entry(&mut self, dn: &str, attrs: &Attributes) -> Result<()> {
        self.writes += 1;
        self.entries.insert(dn.to_ascii_lowercase(), attrs.clone());
        Ok(())
    }

    async fn modify_entry(&mut self, dn: &str, mods: &[Modification]) -> Result<()> {
        self.writes += 1;
        let key = dn.to_ascii_lowercase();
        let mut attrs = self.entries.remove(&key).unwrap_or_default();

        for m in mods {
            match m {
                Modification::Add { attr, values } => {
                    for value in values {
                        attrs.push_value(attr, value.clone());
                    }
                }
                Modification::Replace { attr, values } => {
                    attrs = without(&attrs, attr);
                    for value in values {
                        attrs.push_value(attr, value.clone());
                    }
                }
                Modification::Delete { attr } => attrs = without(&attrs, attr),
            }
        }

        self.entries.insert(key, attrs);
        Ok(())
    }

    async fn delete_entry(&mut self, dn: &str) -> Result<bool> {
        let removed = self.entries.remove(&dn.to_ascii_lowercase()).is_some();
        if removed {
            self.writes += 1;
        }
        Ok(removed)
    }
}
