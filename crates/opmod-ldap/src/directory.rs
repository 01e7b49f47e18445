use async_trait::async_trait;

use crate::attrs::Attributes;
use crate::error::Result;
use crate::modlist::Modification;

/// The directory operations the entry module needs.
///
/// Implemented by [`crate::LdapClient`] over a live connection.
#[async_trait]
pub trait Directory: Send {
    /// User attributes of `dn`, or `None` when the entry does not exist
    async fn read_entry(&mut self, dn: &str) -> Result<Option<Attributes>>;

    async fn add_entry(&mut self, dn: &str, attrs: &Attributes) -> Result<()>;

    /// Apply all modifications in one operation
    async fn modify_entry(&mut self, dn: &str, mods: &[Modification]) -> Result<()>;

    /// Returns false when the entry did not exist
    async fn delete_entry(&mut self, dn: &str) -> Result<bool>;
}
