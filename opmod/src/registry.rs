//! Registry of every module shipped in the binary

use opmod_core::{ModuleRegistry, Result};
use opmod_ldap::{LdapModule, LdapPasswdModule};
use opmod_maven::MavenArtifactModule;
use opmod_mongodb::MongoReplsetModule;
use opmod_postgres::PostgresExecModule;
use opmod_system::{EselectModule, MktempModule, NameserversFactsModule};
use tracing::debug;

/// Build a registry holding all bundled modules.
pub fn default_registry() -> Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();

    registry.register(LdapModule)?;
    registry.register(LdapPasswdModule)?;
    registry.register(MongoReplsetModule)?;
    registry.register(MavenArtifactModule)?;
    registry.register(PostgresExecModule)?;
    registry.register(EselectModule)?;
    registry.register(MktempModule)?;
    registry.register(NameserversFactsModule)?;

    debug!("Registered {} modules", registry.len());
    Ok(registry)
}
