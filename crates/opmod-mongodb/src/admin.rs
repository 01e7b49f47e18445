//! Replica set administration commands

use async_trait::async_trait;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One member as reported by `replSetGetStatus`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberStatus {
    pub name: String,
    #[serde(rename = "stateStr")]
    pub state_str: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplSetStatus {
    /// The server runs with `--replSet` but was never initiated
    NotInitiated,
    Initiated {
        set: String,
        members: Vec<MemberStatus>,
    },
}

/// Replica set configuration document, as `rs.conf()` returns it.
///
/// Fields this module does not touch are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplSetConfig {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub version: i32,
    pub members: Vec<ConfigMember>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMember {
    #[serde(rename = "_id")]
    pub id: i32,
    pub host: String,
    #[serde(flatten)]
    pub extra: Document,
}

impl ConfigMember {
    pub fn new(id: i32, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            extra: Document::new(),
        }
    }
}

impl ReplSetConfig {
    /// Configuration for `replSetInitiate`: members numbered in declared order
    pub fn initial(name: &str, hosts: &[String]) -> Self {
        Self {
            id: name.to_string(),
            version: 1,
            members: hosts
                .iter()
                .zip(0..)
                .map(|(host, id)| ConfigMember::new(id, host.clone()))
                .collect(),
            extra: Document::new(),
        }
    }

    /// Append `hosts` with ids following the highest existing one and bump
    /// the version.
    pub fn add_members(&mut self, hosts: &[String]) {
        let mut next_id = self.members.iter().map(|m| m.id).max().map_or(0, |id| id + 1);
        for host in hosts {
            self.members.push(ConfigMember::new(next_id, host.clone()));
            next_id += 1;
        }
        self.version += 1;
    }
}

/// The commands `mongodb_replset` needs from a deployment.
#[async_trait]
pub trait ReplicaSetAdmin: Send + Sync {
    /// `replSetGetStatus` on the seed host
    async fn status(&self) -> Result<ReplSetStatus>;

    /// Current configuration, read from the primary
    async fn config(&self) -> Result<ReplSetConfig>;

    /// `replSetInitiate` on the seed host
    async fn initiate(&self, config: &ReplSetConfig) -> Result<()>;

    /// `replSetReconfig` on the primary
    async fn reconfig(&self, config: &ReplSetConfig) -> Result<()>;
}
