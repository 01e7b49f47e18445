//! `ldap_passwd` module: set a user's password
//!
//! OpenLDAP and friends get the RFC 3062 Password Modify extended operation.
//! Active Directory only accepts a replace of `unicodePwd` holding the quoted
//! password in UTF-16LE, over an encrypted connection.

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::client::{ConnectOptions, LdapClient};
use crate::directory::Directory;
use crate::entry::DEFAULT_TIMEOUT_SECS;
use crate::modlist::Modification;

pub const DEFAULT_LDAPS_URI: &str = "ldaps://localhost:636";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LdapType {
    #[default]
    Ldap,
    Ad,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswdParams {
    #[serde(deserialize_with = "de::string_like")]
    pub bind_dn: String,
    pub bind_password: Secret,
    #[serde(default)]
    pub ldap_type: LdapType,
    #[serde(default = "default_uri", alias = "ldap_url", deserialize_with = "de::string_like")]
    pub ldap_uri: String,
    #[serde(alias = "password")]
    pub new_password: Secret,
    #[serde(default = "default_timeout", deserialize_with = "de::int_like")]
    pub timeout: u64,
    #[serde(deserialize_with = "de::string_like")]
    pub user_dn: String,
}

fn default_uri() -> String {
    DEFAULT_LDAPS_URI.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `unicodePwd` value: `"password"` encoded as UTF-16LE
pub fn encode_unicode_pwd(password: &str) -> Vec<u8> {
    format!("\"{}\"", password)
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// AD refuses password changes over plain connections.
pub fn needs_starttls(ldap_type: LdapType, uri: &str) -> bool {
    ldap_type == LdapType::Ad && uri.to_ascii_lowercase().starts_with("ldap://")
}

pub struct LdapPasswdModule;

impl LdapPasswdModule {
    async fn change_password(client: &mut LdapClient, params: &PasswdParams) -> crate::Result<()> {
        client
            .bind(&params.bind_dn, params.bind_password.expose())
            .await?;

        match params.ldap_type {
            LdapType::Ldap => {
                client
                    .password_modify(&params.user_dn, params.new_password.expose())
                    .await
            }
            LdapType::Ad => {
                let mods = [Modification::Replace {
                    attr: "unicodePwd".into(),
                    values: vec![encode_unicode_pwd(params.new_password.expose())],
                }];
                client.modify_entry(&params.user_dn, &mods).await
            }
        }
    }
}

#[async_trait]
impl Module for LdapPasswdModule {
    fn name(&self) -> &str {
        "ldap_passwd"
    }

    fn description(&self) -> &str {
        "Change the password of an LDAP or Active Directory user"
    }

    fn no_log_params(&self) -> &'static [&'static str] {
        &["bind_password", "new_password", "password"]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: PasswdParams = args.parse(self.name())?;

        let options = ConnectOptions {
            uri: params.ldap_uri.clone(),
            timeout: Duration::from_secs(params.timeout),
            starttls: needs_starttls(params.ldap_type, &params.ldap_uri),
        };

        let mut client = LdapClient::connect(&options).await.map_err(Error::from)?;
        let result = Self::change_password(&mut client, &params).await;
        if let Err(e) = client.unbind().await {
            warn!("Failed to unbind from {}: {}", params.ldap_uri, e);
        }
        result?;

        info!("Password of {} changed", params.user_dn);
        Ok(ModuleResult::from_changes(vec![Change::update(
            &params.user_dn,
            "set password",
        )]))
    }
}
