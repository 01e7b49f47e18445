//! [`ReplicaSetAdmin`] over the `mongodb` driver

use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::admin::{ReplSetConfig, ReplSetStatus, ReplicaSetAdmin};
use crate::credentials::Credentials;
use crate::error::{ReplsetError, Result};

/// `NotYetInitialized`
const NOT_YET_INITIALIZED: i32 = 94;

#[derive(Debug, Clone)]
struct ConnectSettings {
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl ConnectSettings {
    fn options(&self, hosts: &[String], replica_set: Option<&str>) -> Result<ClientOptions> {
        let mut options = ClientOptions::default();
        options.hosts = hosts
            .iter()
            .map(|h| ServerAddress::parse(h))
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| ReplsetError::InvalidHost(hosts.join(",")))?;
        options.app_name = Some("opmod".into());
        options.connect_timeout = Some(self.timeout);
        options.server_selection_timeout = Some(self.timeout);

        match replica_set {
            Some(name) => options.repl_set_name = Some(name.to_string()),
            None => options.direct_connection = Some(true),
        }

        if let Some(creds) = &self.credentials {
            let mut credential = Credential::default();
            credential.username = Some(creds.user.clone());
            credential.password = Some(creds.password.expose().to_string());
            options.credential = Some(credential);
        }

        Ok(options)
    }
}

/// Talks to the seed host directly and to the primary through a replica set
/// connection.
pub struct MongoAdmin {
    seed: Client,
    seed_host: String,
    settings: ConnectSettings,
    replica_set: String,
}

fn is_auth_error(err: &MongoError) -> bool {
    matches!(*err.kind, ErrorKind::Authentication { .. })
}

fn command_code(err: &MongoError) -> Option<i32> {
    match *err.kind {
        ErrorKind::Command(ref e) => Some(e.code),
        _ => None,
    }
}

async fn ping(client: &Client) -> std::result::Result<(), MongoError> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}

impl MongoAdmin {
    /// Connect to `seed` (a normalized `host:port`).
    ///
    /// When authentication fails the connection is retried without
    /// credentials: the admin account may not exist before the set is
    /// initiated.
    pub async fn connect(
        seed: &str,
        replica_set: &str,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut settings = ConnectSettings {
            credentials,
            timeout,
        };
        let hosts = [seed.to_string()];

        let client = Client::with_options(settings.options(&hosts, None)?)
            .map_err(ReplsetError::Connect)?;
        let seed_client = match ping(&client).await {
            Ok(()) => client,
            Err(e) if is_auth_error(&e) && settings.credentials.is_some() => {
                warn!("Authentication failed, continuing without credentials: {}", e);
                settings.credentials = None;
                let client = Client::with_options(settings.options(&hosts, None)?)
                    .map_err(ReplsetError::Connect)?;
                ping(&client).await.map_err(ReplsetError::Connect)?;
                client
            }
            Err(e) => return Err(ReplsetError::Connect(e)),
        };

        debug!("Connected to {}", seed);
        Ok(Self {
            seed: seed_client,
            seed_host: seed.to_string(),
            settings,
            replica_set: replica_set.to_string(),
        })
    }

    /// Replica set connection over the members listed by the seed host
    async fn primary(&self) -> Result<Client> {
        let hosts = match self.status().await? {
            ReplSetStatus::Initiated { members, .. } => {
                members.into_iter().map(|m| m.name).collect::<Vec<_>>()
            }
            ReplSetStatus::NotInitiated => Vec::new(),
        };
        let hosts = if hosts.is_empty() {
            vec![self.seed_host.clone()]
        } else {
            hosts
        };

        let options = self.settings.options(&hosts, Some(&self.replica_set))?;
        Client::with_options(options).map_err(ReplsetError::Connect)
    }

    async fn admin_command(client: &Client, command: Document) -> Result<Document> {
        Ok(client.database("admin").run_command(command).await?)
    }
}

#[async_trait]
impl ReplicaSetAdmin for MongoAdmin {
    async fn status(&self) -> Result<ReplSetStatus> {
        match Self::admin_command(&self.seed, doc! { "replSetGetStatus": 1 }).await {
            Ok(reply) => {
                let set = reply.get_str("set").unwrap_or_default().to_string();
                let members = reply
                    .get_array("members")
                    .map(|members| {
                        members
                            .iter()
                            .filter_map(|m| m.as_document())
                            .filter_map(|m| bson::from_document(m.clone()).ok())
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(ReplSetStatus::Initiated { set, members })
            }
            Err(ReplsetError::Mongo(e)) if command_code(&e) == Some(NOT_YET_INITIALIZED) => {
                debug!("Replica set not initiated yet");
                Ok(ReplSetStatus::NotInitiated)
            }
            Err(e) => Err(e),
        }
    }

    async fn config(&self) -> Result<ReplSetConfig> {
        let primary = self.primary().await?;
        let reply = Self::admin_command(&primary, doc! { "replSetGetConfig": 1 }).await?;
        let config = reply
            .get_document("config")
            .map_err(|e| ReplsetError::Reply(format!("replSetGetConfig: {}", e)))?;
        bson::from_document(config.clone()).map_err(|e| ReplsetError::Reply(e.to_string()))
    }

    async fn initiate(&self, config: &ReplSetConfig) -> Result<()> {
        let config = bson::to_document(config).map_err(|e| ReplsetError::Reply(e.to_string()))?;
        Self::admin_command(&self.seed, doc! { "replSetInitiate": config }).await?;
        Ok(())
    }

    async fn reconfig(&self, config: &ReplSetConfig) -> Result<()> {
        let primary = self.primary().await?;
        let config = bson::to_document(config).map_err(|e| ReplsetError::Reply(e.to_string()))?;
        Self::admin_command(&primary, doc! { "replSetReconfig": config }).await?;
        Ok(())
    }
}
