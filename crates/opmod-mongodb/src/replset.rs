//! `mongodb_replset` module

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::info;

use crate::admin::{MemberStatus, ReplSetConfig, ReplSetStatus, ReplicaSetAdmin};
use crate::client::MongoAdmin;
use crate::credentials;
use crate::hosts::{normalize_host, normalize_reported, parse_hosts, DEFAULT_PORT};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplsetParams {
    #[serde(default, alias = "user", deserialize_with = "de::opt_string_like")]
    pub login_user: Option<String>,
    #[serde(default, alias = "password")]
    pub login_password: Option<Secret>,
    #[serde(default = "default_login_host", alias = "host", deserialize_with = "de::string_like")]
    pub login_host: String,
    #[serde(default = "default_login_port", alias = "port", deserialize_with = "de::int_like")]
    pub login_port: u16,
    #[serde(alias = "members", deserialize_with = "de::list_like")]
    pub hosts: Vec<String>,
    #[serde(alias = "replset", deserialize_with = "de::string_like")]
    pub replica_set: String,
    #[serde(default = "default_connect_timeout", deserialize_with = "de::int_like")]
    pub connect_timeout: u64,
}

fn default_login_host() -> String {
    "localhost".to_string()
}

fn default_login_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    10
}

/// `members` payload: host to `{state: stateStr}`
fn members_state(members: &[MemberStatus]) -> Value {
    let map: Map<String, Value> = members
        .iter()
        .map(|m| (m.name.clone(), json!({ "state": m.state_str })))
        .collect();
    Value::Object(map)
}

async fn current_members<A: ReplicaSetAdmin + ?Sized>(admin: &A) -> Value {
    match admin.status().await {
        Ok(ReplSetStatus::Initiated { members, .. }) => members_state(&members),
        _ => Value::Object(Map::new()),
    }
}

/// Initiate the set or add the missing members.
///
/// `hosts` must already be normalized.
pub async fn reconcile<A: ReplicaSetAdmin + ?Sized>(
    admin: &A,
    replica_set: &str,
    hosts: &[String],
    check_mode: bool,
) -> Result<ModuleResult> {
    let status = admin.status().await.map_err(Error::from)?;

    let (set, members) = match status {
        ReplSetStatus::NotInitiated => return initiate(admin, replica_set, hosts, check_mode).await,
        ReplSetStatus::Initiated { set, members } => (set, members),
    };

    if set != replica_set {
        let mut data = Map::new();
        data.insert("members".into(), members_state(&members));
        return Err(Error::failed_with(
            format!(
                "Host is a member of replica set {}, not {}",
                set, replica_set
            ),
            data,
        ));
    }

    let config = admin.config().await.map_err(Error::from)?;
    let current: Vec<String> = config
        .members
        .iter()
        .map(|m| normalize_reported(&m.host))
        .collect();

    let absent_hosts: Vec<&String> = current.iter().filter(|h| !hosts.contains(h)).collect();
    if !absent_hosts.is_empty() {
        let mut data = Map::new();
        data.insert("absent_hosts".into(), json!(absent_hosts));
        data.insert("members".into(), members_state(&members));
        return Err(Error::failed_with(
            "This module doesn't support members removing",
            data,
        ));
    }

    let new_hosts: Vec<String> = hosts
        .iter()
        .filter(|h| !current.contains(h))
        .cloned()
        .collect();

    if new_hosts.is_empty() {
        return Ok(ModuleResult::unchanged()
            .with_data("added_hosts", json!([]))
            .with_data("members", members_state(&members)));
    }

    let changes: Vec<Change> = new_hosts
        .iter()
        .map(|h| Change::create(h, "add replica set member"))
        .collect();

    if !check_mode {
        let mut config = config;
        config.add_members(&new_hosts);
        info!(
            "Adding {} to replica set {} (config version {})",
            new_hosts.join(", "),
            replica_set,
            config.version
        );

        if let Err(e) = admin.reconfig(&config).await {
            let mut data = Map::new();
            data.insert("new_hosts".into(), json!(new_hosts));
            data.insert("members".into(), current_members(admin).await);
            return Err(Error::failed_with(
                format!("Unable to add new members: {}", e),
                data,
            ));
        }
    }

    Ok(ModuleResult::from_changes(changes)
        .with_data("added_hosts", json!(new_hosts))
        .with_data("members", current_members(admin).await))
}

async fn initiate<A: ReplicaSetAdmin + ?Sized>(
    admin: &A,
    replica_set: &str,
    hosts: &[String],
    check_mode: bool,
) -> Result<ModuleResult> {
    let config = ReplSetConfig::initial(replica_set, hosts);
    let changes = vec![Change::create(replica_set, "initiate replica set")];

    if check_mode {
        return Ok(ModuleResult::from_changes(changes).with_data("members", Map::new()));
    }

    info!("Initiating replica set {} with {}", replica_set, hosts.join(", "));
    admin
        .initiate(&config)
        .await
        .map_err(|e| Error::failed(format!("Unable to initiate replica set: {}", e)))?;

    Ok(ModuleResult::from_changes(changes).with_data("members", current_members(admin).await))
}

pub struct MongoReplsetModule;

#[async_trait]
impl Module for MongoReplsetModule {
    fn name(&self) -> &str {
        "mongodb_replset"
    }

    fn description(&self) -> &str {
        "Initiate a MongoDB replica set or add members to it"
    }

    fn supports_check_mode(&self) -> bool {
        true
    }

    fn no_log_params(&self) -> &'static [&'static str] {
        &["login_password", "password"]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: ReplsetParams = args.parse(self.name())?;
        let hosts = parse_hosts(&params.hosts)?;
        let seed = normalize_host(&format!("{}:{}", bracket_v6(&params.login_host), params.login_port))?;
        let credentials = credentials::resolve(params.login_user, params.login_password)?;

        let admin = MongoAdmin::connect(
            &seed,
            &params.replica_set,
            credentials,
            Duration::from_secs(params.connect_timeout),
        )
        .await?;

        reconcile(&admin, &params.replica_set, &hosts, args.check_mode).await
    }
}

/// `login_host` may be a bare IPv6 literal
fn bracket_v6(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
