//! opmod-ldap: LDAP directory modules
//!
//! - `ldap`: add, modify and remove entries described in LDIF, similarly to
//!   `ldapmodify`
//! - `ldap_passwd`: change the password of an LDAP or Active Directory user

pub mod attrs;
pub mod client;
pub mod directory;
pub mod entry;
pub mod error;
pub mod ldif;
pub mod modlist;
pub mod passwd;
pub mod sync;

#[cfg(test)]
mod memory;

pub use attrs::{Attribute, Attributes};
pub use client::{ConnectOptions, LdapClient};
pub use directory::Directory;
pub use entry::LdapModule;
pub use error::{LdapModuleError, Result};
pub use ldif::{parse_ldif, LdifRecord};
pub use modlist::{modify_list, Modification};
pub use passwd::LdapPasswdModule;
pub use sync::EntrySync;
