//! credentials::docker_config
//!
//! Credentials from the Docker client configuration.
//!
//! # Lookup
//!
//! The config file is `$DOCKER_CONFIG/config.json`, falling back to
//! `~/.docker/config.json`. For a host, sources are tried in order:
//! 1. `credHelpers[host]`: run `docker-credential-<helper> get`
//! 2. `credsStore`: the same protocol with the default helper
//! 3. `auths[host]`: base64 `auth` field, or `username`/`password`
//!
//! `auths` keys may be bare hosts or URLs such as
//! `https://index.docker.io/v1/`; both forms match.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use base64::Engine as _;
use serde::Deserialize;

use super::traits::{CredentialError, CredentialStore, Credentials};

/// Docker Hub's canonical credential key.
const DOCKER_HUB_HOST: &str = "index.docker.io";

/// Hosts that share Docker Hub credentials.
const DOCKER_HUB_ALIASES: &[&str] = &["docker.io", "registry-1.docker.io", DOCKER_HUB_HOST];

/// Subset of `config.json` that matters for credential lookup.
#[derive(Debug, Default, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    #[serde(default, rename = "credsStore")]
    creds_store: Option<String>,
    #[serde(default, rename = "credHelpers")]
    cred_helpers: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Output of `docker-credential-<helper> get`.
#[derive(Debug, Deserialize)]
struct HelperOutput {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Secret")]
    secret: String,
}

/// Credential store backed by the Docker client configuration.
#[derive(Debug)]
pub struct DockerConfigStore {
    /// Path to config.json
    path: PathBuf,
}

impl DockerConfigStore {
    /// Create a store at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `$DOCKER_CONFIG` nor the home
    /// directory can be determined.
    pub fn new() -> Result<Self, CredentialError> {
        if let Ok(dir) = std::env::var("DOCKER_CONFIG") {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.json")));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CredentialError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(".docker").join("config.json")))
    }

    /// Create a store reading a specific config file.
    ///
    /// This is primarily useful for testing.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the config file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_config(&self) -> Result<DockerConfigFile, CredentialError> {
        if !self.path.exists() {
            return Ok(DockerConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| CredentialError::ReadError(format!("cannot read docker config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CredentialError::Malformed(format!("cannot parse docker config: {}", e)))
    }

    fn lookup_auths(
        config: &DockerConfigFile,
        host: &str,
    ) -> Result<Option<Credentials>, CredentialError> {
        let wanted = canonical_host(host);
        let entry = config
            .auths
            .iter()
            .find(|(key, _)| canonical_host(&normalize_key(key)) == wanted)
            .map(|(_, entry)| entry);

        match entry {
            Some(entry) => decode_entry(entry),
            None => Ok(None),
        }
    }
}

impl CredentialStore for DockerConfigStore {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn get(&self, host: &str) -> Result<Option<Credentials>, CredentialError> {
        let config = self.read_config()?;

        if let Some(helper) = config.cred_helpers.get(host) {
            tracing::debug!(host, helper = %helper, "using credential helper");
            return run_helper(helper, host);
        }

        if let Some(helper) = &config.creds_store {
            tracing::debug!(host, helper = %helper, "using credentials store");
            if let Some(creds) = run_helper(helper, host)? {
                return Ok(Some(creds));
            }
        }

        Self::lookup_auths(&config, host)
    }
}

/// Strip scheme and path from an `auths` key.
fn normalize_key(key: &str) -> String {
    let without_scheme = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

/// Map Docker Hub aliases onto one key.
fn canonical_host(host: &str) -> &str {
    if DOCKER_HUB_ALIASES.contains(&host) {
        DOCKER_HUB_HOST
    } else {
        host
    }
}

fn decode_entry(entry: &AuthEntry) -> Result<Option<Credentials>, CredentialError> {
    if let Some(auth) = entry.auth.as_deref().filter(|a| !a.is_empty()) {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(auth.trim())
            .map_err(|_| CredentialError::Malformed("auth field is not valid base64".into()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| CredentialError::Malformed("auth field is not valid UTF-8".into()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| CredentialError::Malformed("auth field must be user:password".into()))?;
        return Ok(Some(Credentials::new(username, password)));
    }

    match (&entry.username, &entry.password) {
        (Some(u), Some(p)) => Ok(Some(Credentials::new(u.as_str(), p.as_str()))),
        _ => Ok(None),
    }
}

/// Run `docker-credential-<helper> get` for a host.
fn run_helper(helper: &str, host: &str) -> Result<Option<Credentials>, CredentialError> {
    let program = format!("docker-credential-{}", helper);
    let failed = |message: String| CredentialError::HelperFailed {
        helper: helper.to_string(),
        message,
    };

    let mut child = Command::new(&program)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| failed(format!("cannot run {}: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(host.as_bytes())
            .map_err(|e| failed(e.to_string()))?;
    }

    let output = child.wait_with_output().map_err(|e| failed(e.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
        if stdout.contains("credentials not found") {
            return Ok(None);
        }
        return Err(failed(format!("exited with {}", output.status)));
    }

    parse_helper_output(&stdout).map(Some).map_err(failed)
}

fn parse_helper_output(stdout: &str) -> Result<Credentials, String> {
    let parsed: HelperOutput =
        serde_json::from_str(stdout.trim()).map_err(|e| format!("unexpected output: {}", e))?;
    Ok(Credentials::new(parsed.username, parsed.secret))
}
