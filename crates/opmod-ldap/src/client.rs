//! Thin wrapper over an `ldap3` connection

use async_trait::async_trait;
use ldap3::exop::PasswordModify;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::attrs::Attributes;
use crate::directory::Directory;
use crate::error::Result;
use crate::modlist::Modification;

/// LDAP result code noSuchObject
const NO_SUCH_OBJECT: u32 = 32;

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub uri: String,
    /// Applies to connecting and to every operation
    pub timeout: Duration,
    pub starttls: bool,
}

pub struct LdapClient {
    ldap: Ldap,
    timeout: Duration,
}

impl LdapClient {
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        debug!("Connecting to {}", options.uri);

        let settings = LdapConnSettings::new()
            .set_conn_timeout(options.timeout)
            .set_starttls(options.starttls);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &options.uri).await?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        Ok(Self {
            ldap,
            timeout: options.timeout,
        })
    }

    /// Simple bind
    pub async fn bind(&mut self, dn: &str, password: &str) -> Result<()> {
        self.ldap
            .with_timeout(self.timeout)
            .simple_bind(dn, password)
            .await?
            .success()?;
        Ok(())
    }

    /// RFC 3062 Password Modify extended operation
    pub async fn password_modify(&mut self, user_dn: &str, new_password: &str) -> Result<()> {
        self.ldap
            .with_timeout(self.timeout)
            .extended(PasswordModify {
                user_id: Some(user_dn),
                old_pass: None,
                new_pass: Some(new_password),
            })
            .await?
            .success()?;
        Ok(())
    }

    pub async fn unbind(mut self) -> Result<()> {
        self.ldap.unbind().await?;
        Ok(())
    }
}

fn is_no_such_object(err: &LdapError) -> bool {
    matches!(err, LdapError::LdapResult { result } if result.rc == NO_SUCH_OBJECT)
}

fn attributes_from_entry(entry: SearchEntry) -> Attributes {
    let mut text: Vec<(String, Vec<String>)> = entry.attrs.into_iter().collect();
    text.sort_by(|a, b| a.0.cmp(&b.0));
    let mut binary: Vec<(String, Vec<Vec<u8>>)> = entry.bin_attrs.into_iter().collect();
    binary.sort_by(|a, b| a.0.cmp(&b.0));

    let mut attrs = Attributes::new();
    for (name, values) in text {
        for value in values {
            attrs.push_value(&name, value.into_bytes());
        }
    }
    for (name, values) in binary {
        for value in values {
            attrs.push_value(&name, value);
        }
    }
    attrs
}

fn value_set(values: &[Vec<u8>]) -> HashSet<Vec<u8>> {
    values.iter().cloned().collect()
}

#[async_trait]
impl Directory for LdapClient {
    async fn read_entry(&mut self, dn: &str) -> Result<Option<Attributes>> {
        let result = self
            .ldap
            .with_timeout(self.timeout)
            .search(dn, Scope::Base, "(objectClass=*)", vec!["*"])
            .await?;

        match result.success() {
            Ok((entries, _)) => Ok(entries
                .into_iter()
                .next()
                .map(|entry| attributes_from_entry(SearchEntry::construct(entry)))),
            Err(e) if is_no_such_object(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_entry(&mut self, dn: &str, attrs: &Attributes) -> Result<()> {
        let attrs: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attrs
            .iter()
            .map(|a| (a.name.as_bytes().to_vec(), value_set(&a.values)))
            .collect();

        self.ldap
            .with_timeout(self.timeout)
            .add(dn, attrs)
            .await?
            .success()?;
        Ok(())
    }

    async fn modify_entry(&mut self, dn: &str, mods: &[Modification]) -> Result<()> {
        let mods: Vec<Mod<Vec<u8>>> = mods
            .iter()
            .map(|m| match m {
                Modification::Add { attr, values } => {
                    Mod::Add(attr.as_bytes().to_vec(), value_set(values))
                }
                Modification::Replace { attr, values } => {
                    Mod::Replace(attr.as_bytes().to_vec(), value_set(values))
                }
                Modification::Delete { attr } => {
                    Mod::Delete(attr.as_bytes().to_vec(), HashSet::new())
                }
            })
            .collect();

        self.ldap
            .with_timeout(self.timeout)
            .modify(dn, mods)
            .await?
            .success()?;
        Ok(())
    }

    async fn delete_entry(&mut self, dn: &str) -> Result<bool> {
        match self.ldap.with_timeout(self.timeout).delete(dn).await?.success() {
            Ok(_) => Ok(true),
            Err(e) if is_no_such_object(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
