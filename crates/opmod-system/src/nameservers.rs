//! `nameservers_facts` module

use async_trait::async_trait;
use opmod_core::config::get_config;
use opmod_core::prelude::*;
use serde::Deserialize;

use crate::error::SystemError;

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Default for `path`
pub const RESOLV_CONF_VAR: &str = "OPMOD_RESOLV_CONF";

pub const FACT_NAME: &str = "ansible_nameservers";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameserversParams {
    #[serde(default = "default_path", deserialize_with = "de::string_like")]
    pub path: String,
}

fn default_path() -> String {
    get_config(RESOLV_CONF_VAR, DEFAULT_RESOLV_CONF)
}

/// Addresses of `nameserver` lines, in file order.
pub fn parse_nameservers(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let keyword = fields.next()?;
            if !keyword.eq_ignore_ascii_case("nameserver") {
                return None;
            }
            fields.next().map(String::from)
        })
        .collect()
}

pub struct NameserversFactsModule;

#[async_trait]
impl Module for NameserversFactsModule {
    fn name(&self) -> &str {
        "nameservers_facts"
    }

    fn description(&self) -> &str {
        "Collect nameservers from resolv.conf as facts"
    }

    fn supports_check_mode(&self) -> bool {
        true
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: NameserversParams = args.parse(self.name())?;
        let content = tokio::fs::read_to_string(&params.path)
            .await
            .map_err(|e| SystemError::io(format!("Unable to read {}", params.path), e))?;

        Ok(ModuleResult::unchanged().with_fact(FACT_NAME, parse_nameservers(&content)))
    }
}
