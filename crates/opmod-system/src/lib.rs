//! opmod-system: modules acting on the local host
//!
//! - `eselect`: switch a Gentoo `eselect` module to a target
//! - `mktemp`: create a unique temporary directory or file
//! - `nameservers_facts`: expose resolver nameservers as facts

pub mod error;
pub mod eselect;
pub mod mktemp;
pub mod nameservers;

pub use error::{Result, SystemError};
pub use eselect::EselectModule;
pub use mktemp::MktempModule;
pub use nameservers::NameserversFactsModule;
