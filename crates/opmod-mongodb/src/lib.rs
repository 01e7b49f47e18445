//! opmod-mongodb: `mongodb_replset` module
//!
//! Initiates a replica set or adds members to an existing one. Members are
//! never removed.

pub mod admin;
pub mod client;
pub mod credentials;
pub mod error;
pub mod hosts;
pub mod replset;

pub use admin::{ConfigMember, MemberStatus, ReplSetConfig, ReplSetStatus, ReplicaSetAdmin};
pub use client::MongoAdmin;
pub use credentials::Credentials;
pub use error::{ReplsetError, Result};
pub use replset::MongoReplsetModule;
