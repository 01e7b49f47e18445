//! `ldap` module: add, modify or delete entries described in LDIF

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::{ConnectOptions, LdapClient};
use crate::directory::Directory;
use crate::error::LdapModuleError;
use crate::ldif::{contains_dn_line, parse_ldif, LdifRecord};
use crate::sync::EntrySync;

pub const DEFAULT_LDAP_URI: &str = "ldap://localhost:389";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapParams {
    #[serde(deserialize_with = "de::string_like")]
    pub bind_dn: String,
    pub bind_password: Secret,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub src: Option<String>,
    #[serde(default = "default_uri", alias = "ldap_url", deserialize_with = "de::string_like")]
    pub ldap_uri: String,
    #[serde(default, deserialize_with = "de::bool_like")]
    pub remove_unset_attrs: bool,
    #[serde(default)]
    pub state: EntryState,
    #[serde(default = "default_timeout", deserialize_with = "de::int_like")]
    pub timeout: u64,
}

fn default_uri() -> String {
    DEFAULT_LDAP_URI.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// What the directory should look like after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    Present(Vec<LdifRecord>),
    /// DNs to remove
    Absent(Vec<String>),
}

impl Desired {
    /// For `absent`, content without any `dn:` line is a plain list of DNs,
    /// one per line.
    pub fn from_content(state: EntryState, content: &str) -> crate::Result<Self> {
        match state {
            EntryState::Present => Ok(Desired::Present(parse_ldif(content)?)),
            EntryState::Absent if contains_dn_line(content) => Ok(Desired::Absent(
                parse_ldif(content)?.into_iter().map(|r| r.dn).collect(),
            )),
            EntryState::Absent => Ok(Desired::Absent(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(String::from)
                    .collect(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Desired::Present(records) => records.is_empty(),
            Desired::Absent(dns) => dns.is_empty(),
        }
    }
}

impl LdapParams {
    /// LDIF text from `content` or the local file named by `src`.
    pub async fn load_content(&self) -> crate::Result<String> {
        match (&self.content, &self.src) {
            (Some(content), None) => Ok(content.clone()),
            (None, Some(path)) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LdapModuleError::Source {
                        path: path.clone(),
                        source,
                    })
            }
            (Some(_), Some(_)) => Err(LdapModuleError::InvalidArgument(
                "parameters are mutually exclusive: content|src".into(),
            )),
            (None, None) => Err(LdapModuleError::InvalidArgument(
                "one of the following is required: content, src".into(),
            )),
        }
    }
}

/// Apply `desired` to `directory`.
pub async fn apply<D: Directory + ?Sized>(
    directory: &mut D,
    desired: &Desired,
    remove_unset_attrs: bool,
    dry_run: bool,
) -> crate::Result<Vec<Change>> {
    let mut sync = EntrySync::new(directory)
        .remove_unset_attrs(remove_unset_attrs)
        .dry_run(dry_run);

    match desired {
        Desired::Present(records) => sync.upsert_all(records).await,
        Desired::Absent(dns) => sync.delete_all(dns).await,
    }
}

pub struct LdapModule;

impl LdapModule {
    async fn sync(&self, params: &LdapParams, desired: &Desired, dry_run: bool) -> crate::Result<Vec<Change>> {
        let options = ConnectOptions {
            uri: params.ldap_uri.clone(),
            timeout: Duration::from_secs(params.timeout),
            starttls: false,
        };

        let mut client = LdapClient::connect(&options).await?;
        let result = match client
            .bind(&params.bind_dn, params.bind_password.expose())
            .await
        {
            Ok(()) => apply(&mut client, desired, params.remove_unset_attrs, dry_run).await,
            Err(e) => Err(e),
        };

        if let Err(e) = client.unbind().await {
            warn!("Failed to unbind from {}: {}", params.ldap_uri, e);
        }
        result
    }
}

#[async_trait]
impl Module for LdapModule {
    fn name(&self) -> &str {
        "ldap"
    }

    fn description(&self) -> &str {
        "Add, modify or delete LDAP entries described in LDIF"
    }

    fn supports_check_mode(&self) -> bool {
        true
    }

    fn no_log_params(&self) -> &'static [&'static str] {
        &["bind_password", "content"]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: LdapParams = args.parse(self.name())?;
        let content = params.load_content().await?;
        let desired = Desired::from_content(params.state, &content)?;

        if desired.is_empty() {
            debug!("No entries given");
            return Ok(ModuleResult::unchanged().with_msg("no entries given"));
        }

        let changes = self.sync(&params, &desired, args.check_mode).await?;
        Ok(ModuleResult::from_changes(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDirectory;
    use std::io::Write;

    const ENTRIES: &str = "\
dn: dc=encom,dc=com
objectClass: domain
dc: encom

dn: cn=flynn,dc=encom,dc=com
objectClass: person
cn: flynn
";

    fn args(json: &str) -> ModuleArgs {
        ModuleArgs::from_text(json).unwrap()
    }

    #[test]
    fn test_params_defaults_and_aliases() {
        let params: LdapParams = args(
            r#"{"bind_dn": "cn=admin", "bind_password": "pw", "content": "x",
                "ldap_url": "ldaps://ldap.encom.com", "timeout": "30",
                "remove_unset_attrs": "yes"}"#,
        )
        .parse("ldap")
        .unwrap();

        assert_eq!(params.ldap_uri, "ldaps://ldap.encom.com");
        assert_eq!(params.timeout, 30);
        assert!(params.remove_unset_attrs);
        assert_eq!(params.state, EntryState::Present);
    }

    #[test]
    fn test_params_reject_bad_state() {
        let err = args(r#"{"bind_dn": "cn=admin", "bind_password": "pw", "state": "gone"}"#)
            .parse::<LdapParams>("ldap")
            .unwrap_err();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let params: LdapParams =
            args(r#"{"bind_dn": "cn=admin", "bind_password": "hunter2"}"#).parse("ldap").unwrap();
        assert!(!format!("{:?}", params).contains("hunter2"));
    }

    #[test]
    fn test_absent_accepts_dn_list() {
        let desired = Desired::from_content(
            EntryState::Absent,
            "cn=flynn,dc=encom,dc=com\n\n  cn=clu,dc=encom,dc=com  \n",
        )
        .unwrap();
        assert_eq!(
            desired,
            Desired::Absent(vec![
                "cn=flynn,dc=encom,dc=com".into(),
                "cn=clu,dc=encom,dc=com".into()
            ])
        );
    }

    #[test]
    fn test_absent_accepts_ldif() {
        let desired = Desired::from_content(EntryState::Absent, ENTRIES).unwrap();
        assert_eq!(
            desired,
            Desired::Absent(vec!["dc=encom,dc=com".into(), "cn=flynn,dc=encom,dc=com".into()])
        );
    }

    #[tokio::test]
    async fn test_load_content_from_src() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ENTRIES.as_bytes()).unwrap();

        let params: LdapParams = args(&format!(
            r#"{{"bind_dn": "cn=admin", "bind_password": "pw", "src": "{}"}}"#,
            file.path().display()
        ))
        .parse("ldap")
        .unwrap();

        assert_eq!(params.load_content().await.unwrap(), ENTRIES);
    }

    #[tokio::test]
    async fn test_content_and_src_are_exclusive() {
        let report = opmod_core::runner::execute(
            &LdapModule,
            &args(r#"{"bind_dn": "cn=admin", "bind_password": "pw", "content": "x", "src": "/x"}"#),
        )
        .await;
        assert!(report.is_failed());
        assert_eq!(report.body()["msg"], "parameters are mutually exclusive: content|src");
        assert_eq!(
            report.body()["invocation"]["module_args"]["bind_password"],
            opmod_core::args::NO_LOG_PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_missing_src_file_fails() {
        let report = opmod_core::runner::execute(
            &LdapModule,
            &args(r#"{"bind_dn": "cn=admin", "bind_password": "pw", "src": "/nonexistent/x.ldif"}"#),
        )
        .await;
        assert!(report.is_failed());
        assert!(report.body()["msg"]
            .as_str()
            .unwrap()
            .starts_with("Unable to read /nonexistent/x.ldif"));
    }

    #[tokio::test]
    async fn test_invalid_ldif_fails_before_connecting() {
        let report = opmod_core::runner::execute(
            &LdapModule,
            &args(r#"{"bind_dn": "cn=admin", "bind_password": "pw", "content": "cn: x"}"#),
        )
        .await;
        assert!(report.is_failed());
        assert!(report.body()["msg"].as_str().unwrap().starts_with("LDIF line 1"));
    }

    #[tokio::test]
    async fn test_apply_present_then_absent() {
        let mut dir = MemoryDirectory::default();
        let present = Desired::from_content(EntryState::Present, ENTRIES).unwrap();

        let changes = apply(&mut dir, &present, false, false).await.unwrap();
        assert!(changes.iter().all(Change::is_change));

        let again = apply(&mut dir, &present, false, false).await.unwrap();
        assert!(!ModuleResult::from_changes(again).changed);

        let absent = Desired::from_content(EntryState::Absent, "cn=flynn,dc=encom,dc=com").unwrap();
        let removed = apply(&mut dir, &absent, false, false).await.unwrap();
        assert!(ModuleResult::from_changes(removed).changed);
        assert!(!dir.contains("cn=flynn,dc=encom,dc=com"));
        assert!(dir.contains("dc=encom,dc=com"));
    }

    #[tokio::test]
    async fn test_apply_check_mode() {
        let mut dir = MemoryDirectory::default();
        let present = Desired::from_content(EntryState::Present, ENTRIES).unwrap();

        let changes = apply(&mut dir, &present, false, true).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert!(ModuleResult::from_changes(changes).changed);
        assert_eq!(dir.writes(), 0);
    }
}
