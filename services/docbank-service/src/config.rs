use std::net::SocketAddr;

use dbk_token::script::ScriptConfig;

/// Service configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub migrations_dir: String,
    pub koios_url: Option<String>,
    pub builder_url: Option<String>,
    pub pinata_gateway: Option<String>,
    pub pinata_jwt: Option<String>,
    pub script: ScriptConfig,
    pub storage_quota_gb: u64,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_var("DOCBANK_BIND")
            .unwrap_or_else(|| "0.0.0.0:8080".to_owned())
            .parse()?;

        let database_url = env_var("DOCBANK_DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DOCBANK_DATABASE_URL is required"))?;

        let script = ScriptConfig {
            address: env_var("DOCBANK_SCRIPT_ADDRESS").unwrap_or_default(),
            policy_id: env_var("DOCBANK_POLICY_ID").unwrap_or_default(),
            script: env_var("DOCBANK_SCRIPT_CBOR").unwrap_or_default(),
        };

        let storage_quota_gb = env_var("DOCBANK_STORAGE_QUOTA_GB")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            bind_addr,
            database_url,
            migrations_dir: env_var("DOCBANK_MIGRATIONS_DIR")
                .unwrap_or_else(|| "./migrations/postgres".to_owned()),
            koios_url: env_var("DOCBANK_KOIOS_URL"),
            builder_url: env_var("DOCBANK_BUILDER_URL"),
            pinata_gateway: env_var("DOCBANK_PINATA_GATEWAY"),
            pinata_jwt: env_var("DOCBANK_PINATA_JWT"),
            script,
            storage_quota_gb,
        })
    }
}
