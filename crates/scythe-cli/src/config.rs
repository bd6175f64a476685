//! Configuration file management for scythe.
//!
//! Provides a TOML-based config file at `~/.config/scythe/config.toml` with
//! the admin key and one `[chains.<name>]` table per deployment, and a
//! resolution chain: CLI flag > env var > config file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ethers::signers::LocalWallet;
use serde::{Deserialize, Serialize};

use scythe_core::chain::ChainConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub admin: AdminSection,
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSection {
    /// Hex-encoded private key of the task-owning admin identity.
    pub private_key: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the scythe config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/scythe` or `~/.config/scythe`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("scythe");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("scythe")
}

/// Return the path to the scythe config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Commented skeleton written by `scythe init`.
pub const CONFIG_TEMPLATE: &str = r#"# scythe configuration
#
# The admin key signs every transaction and owns every task this tool
# manages. The file is written 0600; keep it that way.

[admin]
private_key = "<64 hex chars>"

# One table per chain deployment. `label` defaults to the table key.
#
# [chains.polygon]
# chain_id = 137
# rpc_url = "https://polygon-rpc.com"
# harvester = "0x<harvester contract address>"
# ops = "0x<operations contract address>"
# task_api_url = "https://<task api host>"
"#;

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    parse_config(&contents)
}

/// Parse config text; each chain's label defaults to its table key.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    let mut config: ConfigFile = toml::from_str(contents).context("failed to parse config file")?;
    for (name, chain) in &mut config.chains {
        if chain.label.is_empty() {
            chain.label = name.clone();
        }
    }
    Ok(config)
}

/// Write the config template, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix (the file holds the admin key).
pub fn write_config_template() -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // Set permissions to 0600 (owner read/write only) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved target
// -----------------------------------------------------------------------

/// Fully resolved per-invocation target, ready for client construction.
#[derive(Debug)]
pub struct ResolvedTarget {
    pub chain: ChainConfig,
    pub wallet: LocalWallet,
}

/// Resolve the target chain and admin wallet.
///
/// - Chain name: `cli_chain` > `SCYTHE_CHAIN` env > error
/// - Private key: `SCYTHE_PRIVATE_KEY` env > config `[admin].private_key`
pub fn resolve_target(cli_chain: Option<&str>) -> Result<ResolvedTarget> {
    let config = load_config()?;

    let name = match cli_chain {
        Some(name) => name.to_string(),
        None => std::env::var("SCYTHE_CHAIN")
            .map_err(|_| anyhow::anyhow!("no chain selected; pass --chain or set SCYTHE_CHAIN"))?,
    };
    let chain = config
        .chains
        .get(&name)
        .with_context(|| {
            format!("chain {name:?} is not configured; run `scythe chains` to list known chains")
        })?
        .clone();
    chain.validate()?;

    let raw_key = match std::env::var("SCYTHE_PRIVATE_KEY") {
        Ok(key) => key,
        Err(_) => config.admin.private_key.clone(),
    };
    let wallet = parse_private_key(&raw_key)?;

    Ok(ResolvedTarget { chain, wallet })
}

/// Parse a hex private key, tolerating an optional `0x` prefix.
pub fn parse_private_key(raw: &str) -> Result<LocalWallet> {
    let trimmed = raw.trim().trim_start_matches("0x");
    if trimmed.len() != 64 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("admin private key must be 64 hex chars; run `scythe init` and fill in [admin]");
    }
    trimmed
        .parse::<LocalWallet>()
        .context("invalid admin private key")
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn snapshot_env() -> Vec<(&'static str, Option<String>)> {
        ["XDG_CONFIG_HOME", "SCYTHE_CHAIN", "SCYTHE_PRIVATE_KEY"]
            .into_iter()
            .map(|key| (key, std::env::var(key).ok()))
            .collect()
    }

    fn restore_env(saved: Vec<(&'static str, Option<String>)>) {
        for (key, value) in saved {
            match value {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }

    const TWO_CHAIN_CONFIG: &str = r#"
        [admin]
        private_key = "<filled in by env in these tests>"

        [chains.polygon]
        chain_id = 137
        rpc_url = "http://localhost:8545"
        harvester = "0x1111111111111111111111111111111111111111"
        ops = "0x2222222222222222222222222222222222222222"
        task_api_url = "http://localhost:9000"

        [chains.fantom]
        chain_id = 250
        rpc_url = "http://localhost:8546"
        harvester = "0x3333333333333333333333333333333333333333"
        ops = "0x4444444444444444444444444444444444444444"
        task_api_url = "http://localhost:9001"
    "#;

    /// Point XDG_CONFIG_HOME at a temp dir holding `contents` as the
    /// config file. The TempDir must stay alive for the test's duration.
    fn install_temp_config(contents: &str) -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("scythe");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), contents).unwrap();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        tmp
    }

    #[test]
    fn config_template_parses_with_no_chains() {
        let config = parse_config(CONFIG_TEMPLATE).unwrap();
        assert!(config.chains.is_empty());
        assert!(config.admin.private_key.starts_with('<'));
    }

    #[test]
    fn parse_config_fills_label_from_table_key() {
        let config = parse_config(TWO_CHAIN_CONFIG).unwrap();
        assert_eq!(config.chains["polygon"].label, "polygon");
        assert_eq!(config.chains["fantom"].label, "fantom");
    }

    #[test]
    fn parse_config_keeps_an_explicit_label() {
        let raw = r#"
            [admin]
            private_key = "x"

            [chains.poly]
            chain_id = 137
            label = "polygon mainnet"
            rpc_url = "http://localhost:8545"
            harvester = "0x1111111111111111111111111111111111111111"
            ops = "0x2222222222222222222222222222222222222222"
            task_api_url = "http://localhost:9000"
        "#;
        let config = parse_config(raw).unwrap();
        assert_eq!(config.chains["poly"].label, "polygon mainnet");
    }

    #[test]
    fn parse_private_key_accepts_an_0x_prefix() {
        let bare = "aa".repeat(32);
        let prefixed = format!("0x{bare}");
        assert!(parse_private_key(&bare).is_ok());
        assert!(parse_private_key(&prefixed).is_ok());
    }

    #[test]
    fn parse_private_key_rejects_bad_shapes() {
        assert!(parse_private_key("").is_err());
        assert!(parse_private_key("abc123").is_err());
        assert!(parse_private_key(&"zz".repeat(32)).is_err());
        assert!(parse_private_key("<64 hex chars>").is_err());
    }

    #[test]
    fn resolve_prefers_the_cli_flag_over_env() {
        let _lock = lock_env();
        let saved = snapshot_env();

        let _tmp = install_temp_config(TWO_CHAIN_CONFIG);
        unsafe { std::env::set_var("SCYTHE_CHAIN", "fantom") };
        unsafe { std::env::set_var("SCYTHE_PRIVATE_KEY", "aa".repeat(32)) };

        let result = resolve_target(Some("polygon"));

        restore_env(saved);
        assert_eq!(result.unwrap().chain.chain_id, 137);
    }

    #[test]
    fn resolve_falls_back_to_the_env_chain() {
        let _lock = lock_env();
        let saved = snapshot_env();

        let _tmp = install_temp_config(TWO_CHAIN_CONFIG);
        unsafe { std::env::set_var("SCYTHE_CHAIN", "fantom") };
        unsafe { std::env::set_var("SCYTHE_PRIVATE_KEY", "aa".repeat(32)) };

        let result = resolve_target(None);

        restore_env(saved);
        let target = result.unwrap();
        assert_eq!(target.chain.chain_id, 250);
        assert_eq!(target.chain.label, "fantom");
    }

    #[test]
    fn resolve_errors_when_no_chain_is_selected() {
        let _lock = lock_env();
        let saved = snapshot_env();

        let _tmp = install_temp_config(TWO_CHAIN_CONFIG);
        unsafe { std::env::remove_var("SCYTHE_CHAIN") };

        let result = resolve_target(None);

        restore_env(saved);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("no chain selected"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_errors_on_an_unknown_chain() {
        let _lock = lock_env();
        let saved = snapshot_env();

        let _tmp = install_temp_config(TWO_CHAIN_CONFIG);

        let result = resolve_target(Some("base"));

        restore_env(saved);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("not configured"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_takes_the_key_from_env_over_file() {
        let _lock = lock_env();
        let saved = snapshot_env();

        // The file's key is an unusable placeholder; only the env key can
        // make resolution succeed.
        let _tmp = install_temp_config(TWO_CHAIN_CONFIG);
        unsafe { std::env::set_var("SCYTHE_PRIVATE_KEY", "aa".repeat(32)) };

        let result = resolve_target(Some("polygon"));

        restore_env(saved);
        assert!(result.is_ok());
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let _lock = lock_env();
        let path = config_path();
        assert!(
            path.ends_with("scythe/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
