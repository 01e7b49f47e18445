//! Attribute sets of a directory entry
//!
//! Attribute names compare case-insensitively; the first spelling seen is
//! kept. Values are raw bytes since LDIF may carry binary values.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<Vec<u8>>,
}

impl Attribute {
    /// Values as a set, ignoring order and duplicates
    pub fn value_set(&self) -> BTreeSet<&[u8]> {
        self.values.iter().map(Vec::as_slice).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, merging into an existing attribute of the same name.
    pub fn push_value(&mut self, name: &str, value: impl Into<Vec<u8>>) {
        let value = value.into();
        match self.get_mut(name) {
            Some(attr) => attr.values.push(value),
            None => self.0.push(Attribute {
                name: name.to_string(),
                values: vec![value],
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.0.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: AsRef<str>, V: AsRef<[u8]>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.push_value(name.as_ref(), value.as_ref().to_vec());
        }
        attrs
    }
}
