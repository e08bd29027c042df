//! Configuration Management
//!
//! Locates and parses the OCI CLI config file (`~/.oci/config`) and resolves
//! the profile a run authenticates with.

use crate::error::{Error, Result};
use crate::oci::auth::OciCredentials;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "DEFAULT";
pub const CONFIG_FILE_ENV: &str = "OCI_CLI_CONFIG_FILE";
pub const PROFILE_ENV: &str = "OCI_CLI_PROFILE";

const REQUIRED_KEYS: [&str; 5] = ["user", "fingerprint", "key_file", "tenancy", "region"];

/// Config file location: `--config-file` > `--config <dir>` >
/// `$OCI_CLI_CONFIG_FILE` > `~/.oci/config`
pub fn resolve_config_path(config_file: Option<&Path>, config_dir: Option<&Path>) -> PathBuf {
    resolve_config_path_with(
        config_file,
        config_dir,
        std::env::var(CONFIG_FILE_ENV).ok(),
        dirs::home_dir(),
    )
}

fn resolve_config_path_with(
    config_file: Option<&Path>,
    config_dir: Option<&Path>,
    env_file: Option<String>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(file) = config_file {
        return file.to_path_buf();
    }
    if let Some(dir) = config_dir {
        return dir.join("config");
    }
    if let Some(file) = env_file.filter(|f| !f.is_empty()) {
        return PathBuf::from(file);
    }
    home.unwrap_or_default().join(".oci").join("config")
}

/// Profile name: `--profile` > `$OCI_CLI_PROFILE` > `DEFAULT`
pub fn resolve_profile(flag: Option<&str>) -> String {
    resolve_profile_with(flag, std::env::var(PROFILE_ENV).ok())
}

fn resolve_profile_with(flag: Option<&str>, env_profile: Option<String>) -> String {
    flag.filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| env_profile.filter(|p| !p.is_empty()))
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

/// One resolved profile
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
}

impl Profile {
    /// Replace the configured region when `region` is given
    pub fn with_region_override(mut self, region: Option<&str>) -> Self {
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            tracing::debug!("Region override: {} -> {}", self.region, region);
            self.region = region.to_string();
        }
        self
    }

    /// Load the signing key named by `key_file`
    pub fn credentials(&self) -> Result<OciCredentials> {
        OciCredentials::from_key_file(&self.tenancy, &self.user, &self.fingerprint, &self.key_file)
            .map_err(|e| Error::configuration(format!("profile [{}]: {:#}", self.name, e)))
    }
}

/// Parsed OCI CLI config file
#[derive(Debug, Clone, Default)]
pub struct OciConfig {
    path: PathBuf,
    sections: HashMap<String, HashMap<String, String>>,
}

impl OciConfig {
    /// Load configuration from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigurationIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &content))
    }

    /// Parse INI text: `[PROFILE]` headers, `key=value` lines, `#`/`;` comments
    pub fn parse(path: &Path, content: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("Ignoring malformed config line in {:?}", path);
                continue;
            };
            let Some(section) = current.as_ref() else {
                continue;
            };
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Self {
            path: path.to_path_buf(),
            sections,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a profile. Keys missing from it are inherited from `[DEFAULT]`.
    pub fn profile(&self, name: &str) -> Result<Profile> {
        let Some(section) = self.sections.get(name) else {
            return Err(Error::configuration(format!(
                "profile [{}] not found in {} (available: {})",
                name,
                self.path.display(),
                self.profile_names().join(", ")
            )));
        };
        let defaults = self.sections.get(DEFAULT_PROFILE);

        let lookup = |key: &str| {
            section
                .get(key)
                .or_else(|| defaults.and_then(|d| d.get(key)))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| lookup(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "profile [{}] in {} is missing required key(s): {}",
                name,
                self.path.display(),
                missing.join(", ")
            )));
        }

        let value = |key: &str| lookup(key).unwrap_or_default();
        Ok(Profile {
            name: name.to_string(),
            user: value("user"),
            fingerprint: value("fingerprint"),
            key_file: self.resolve_key_file(&value("key_file")),
            tenancy: value("tenancy"),
            region: value("region"),
        })
    }

    /// Expand `~` and resolve relative paths against the config directory
    fn resolve_key_file(&self, key_file: &str) -> PathBuf {
        if let Some(rest) = key_file.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }

        let path = PathBuf::from(key_file);
        if path.is_absolute() {
            return path;
        }
        self.path
            .parent()
            .map(|dir| dir.join(&path))
            .unwrap_or(path)
    }
}

/// Instructions for creating an OCI CLI config
pub fn setup_help(config_path: &Path) -> String {
    format!(
        "\
To set up OCI CLI authentication:

  1. Install OCI CLI:
     brew install oci-cli           # macOS
     pip install oci-cli            # pip

  2. Run initial setup:
     oci setup config

     This will prompt for:
     - Tenancy OCID (from OCI Console > Profile > Tenancy)
     - User OCID (from OCI Console > Profile > User Settings)
     - Region (e.g., us-ashburn-1)
     - API key generation

  3. Upload the generated public key to OCI Console:
     Profile > User Settings > API Keys > Add API Key

Expected config file: {}

Alternative: Use environment variables or flags:
  --config-file /path/to/config     # specify config file path
  --config /path/to/oci-dir         # specify config directory
  --profile PROFILE_NAME            # use specific profile

  {}=/path/to/config
  {}=PROFILE_NAME

Documentation: https://docs.oracle.com/en-us/iaas/Content/API/Concepts/sdkconfig.htm
",
        config_path.display(),
        CONFIG_FILE_ENV,
        PROFILE_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# comment
[DEFAULT]
user=ocid1.user.oc1..default
fingerprint=aa:bb:cc
key_file=keys/oci_api_key.pem
tenancy=ocid1.tenancy.oc1..t
region=us-ashburn-1

; another comment
[PHX]
region = us-phoenix-1
user = ocid1.user.oc1..phx

[BROKEN]
user=ocid1.user.oc1..broken
";

    fn config() -> OciConfig {
        OciConfig::parse(Path::new("/home/me/.oci/config"), SAMPLE)
    }

    #[test]
    fn test_config_path_priority() {
        let home = Some(PathBuf::from("/home/me"));
        let env = Some("/etc/oci/config".to_string());

        assert_eq!(
            resolve_config_path_with(
                Some(Path::new("/explicit/config")),
                Some(Path::new("/dir")),
                env.clone(),
                home.clone()
            ),
            PathBuf::from("/explicit/config")
        );
        assert_eq!(
            resolve_config_path_with(None, Some(Path::new("/dir")), env.clone(), home.clone()),
            PathBuf::from("/dir/config")
        );
        assert_eq!(
            resolve_config_path_with(None, None, env, home.clone()),
            PathBuf::from("/etc/oci/config")
        );
        assert_eq!(
            resolve_config_path_with(None, None, None, home),
            PathBuf::from("/home/me/.oci/config")
        );
    }

    #[test]
    fn test_profile_priority() {
        assert_eq!(resolve_profile_with(Some("CLI"), Some("ENV".to_string())), "CLI");
        assert_eq!(resolve_profile_with(None, Some("ENV".to_string())), "ENV");
        assert_eq!(resolve_profile_with(None, Some(String::new())), "DEFAULT");
        assert_eq!(resolve_profile_with(None, None), "DEFAULT");
    }

    #[test]
    fn test_default_profile() {
        let profile = config().profile("DEFAULT").unwrap();

        assert_eq!(profile.user, "ocid1.user.oc1..default");
        assert_eq!(profile.region, "us-ashburn-1");
        assert_eq!(profile.key_file, PathBuf::from("/home/me/.oci/keys/oci_api_key.pem"));
    }

    #[test]
    fn test_profile_inherits_from_default() {
        let profile = config().profile("PHX").unwrap();

        assert_eq!(profile.region, "us-phoenix-1");
        assert_eq!(profile.user, "ocid1.user.oc1..phx");
        assert_eq!(profile.fingerprint, "aa:bb:cc");
        assert_eq!(profile.tenancy, "ocid1.tenancy.oc1..t");
    }

    #[test]
    fn test_missing_profile_lists_available() {
        let err = config().profile("NOPE").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("profile [NOPE] not found"));
        assert!(message.contains("DEFAULT, PHX"));
    }

    #[test]
    fn test_missing_keys_without_default() {
        let config = OciConfig::parse(Path::new("/cfg"), "[ONLY]\nuser=u\n");

        let err = config.profile("ONLY").unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err
            .to_string()
            .contains("missing required key(s): fingerprint, key_file, tenancy, region"));
    }

    #[test]
    fn test_region_override() {
        let profile = config()
            .profile("DEFAULT")
            .unwrap()
            .with_region_override(Some("eu-frankfurt-1"));
        assert_eq!(profile.region, "eu-frankfurt-1");

        let profile = config().profile("DEFAULT").unwrap().with_region_override(None);
        assert_eq!(profile.region, "us-ashburn-1");
    }

    #[test]
    fn test_absolute_key_file_is_kept() {
        let config = OciConfig::parse(
            Path::new("/cfg/config"),
            "[DEFAULT]\nuser=u\nfingerprint=f\nkey_file=/keys/k.pem\ntenancy=t\nregion=r\n",
        );
        assert_eq!(config.profile("DEFAULT").unwrap().key_file, PathBuf::from("/keys/k.pem"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = OciConfig::load(Path::new("/definitely/not/here/config")).unwrap_err();
        assert!(matches!(err, Error::ConfigurationIo { .. }));
    }

    #[test]
    fn test_setup_help_names_path() {
        let help = setup_help(Path::new("/home/me/.oci/config"));
        assert!(help.contains("oci setup config"));
        assert!(help.contains("Expected config file: /home/me/.oci/config"));
    }
}
