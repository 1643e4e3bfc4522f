use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "gRPC file storage service")]
pub struct Args {
    /// Host to bind to (overrides FILE_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to, 0 for any free port (overrides FILE_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where files are stored (overrides FILE_STORE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_STORAGE_DIR: &str = "./data/files";

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |key| env::var(key))
    }

    /// Merge parsed CLI args over values looked up with `var`.
    pub fn resolve<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = var("FILE_STORE_HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let env_port = match var("FILE_STORE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_STORE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => DEFAULT_PORT,
            Err(err) => return Err(err).context("reading FILE_STORE_PORT"),
        };
        let env_storage =
            var("FILE_STORE_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 50051);
        assert_eq!(cfg.storage_dir, "./data/files");
        assert_eq!(cfg.addr(), "0.0.0.0:50051");
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = AppConfig::resolve(
            Args::default(),
            lookup(&[
                ("FILE_STORE_HOST", "127.0.0.1"),
                ("FILE_STORE_PORT", "0"),
                ("FILE_STORE_STORAGE_DIR", "/var/lib/files"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:0");
        assert_eq!(cfg.storage_dir, "/var/lib/files");
    }

    #[test]
    fn flags_override_env() {
        let args = Args::try_parse_from(["file-store", "--port", "6000", "--storage-dir", "/tmp/x"])
            .unwrap();
        let cfg = AppConfig::resolve(args, lookup(&[("FILE_STORE_PORT", "7000")])).unwrap();
        assert_eq!(cfg.port, 6000);
        assert_eq!(cfg.storage_dir, "/tmp/x");
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = AppConfig::resolve(Args::default(), lookup(&[("FILE_STORE_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("FILE_STORE_PORT"));
    }
}
