//! Credential providers.
//!
//! The upload API only needs a bearer token. Obtaining one (the OAuth consent
//! flow) happens outside vidup; these providers pick the token up from the
//! environment or from a file.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable checked by `EnvToken`.
pub const TOKEN_ENV_VAR: &str = "VIDUP_ACCESS_TOKEN";

/// OAuth access token. Opaque to the upload core; never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Source of an authenticated client credential.
pub trait CredentialProvider {
    /// Returns `Ok(None)` when this provider has nothing to offer.
    fn authenticate(&self) -> Result<Option<AccessToken>>;
}

/// Token from `VIDUP_ACCESS_TOKEN`.
#[derive(Debug, Default)]
pub struct EnvToken;

impl CredentialProvider for EnvToken {
    fn authenticate(&self) -> Result<Option<AccessToken>> {
        Ok(std::env::var(TOKEN_ENV_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(AccessToken))
    }
}

/// Token stored on the first non-empty line of a file.
#[derive(Debug)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/vidup/token`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("vidup")?;
        Ok(xdg_dirs.get_config_home().join("token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialProvider for TokenFile {
    fn authenticate(&self) -> Result<Option<AccessToken>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read token file: {}", self.path.display()))
            }
        };
        Ok(data
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(AccessToken::new))
    }
}

/// Tries each provider in order and returns the first token found.
#[derive(Default)]
pub struct FirstAvailable {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl FirstAvailable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Resolve a token or fail with a message naming where tokens are looked up.
    pub fn require(&self) -> Result<AccessToken> {
        self.authenticate()?.ok_or_else(|| {
            anyhow::anyhow!(
                "no access token found: set {} or write one to the token file",
                TOKEN_ENV_VAR
            )
        })
    }
}

impl CredentialProvider for FirstAvailable {
    fn authenticate(&self) -> Result<Option<AccessToken>> {
        for p in &self.providers {
            if let Some(token) = p.authenticate()? {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl CredentialProvider for Fixed {
        fn authenticate(&self) -> Result<Option<AccessToken>> {
            Ok(self.0.map(AccessToken::new))
        }
    }

    #[test]
    fn token_file_reads_first_non_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "\n  ya29.secret  \nignored\n").unwrap();
        let token = TokenFile::new(&path).authenticate().unwrap().unwrap();
        assert_eq!(token.secret(), "ya29.secret");
    }

    #[test]
    fn missing_or_blank_token_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        assert!(TokenFile::new(&path).authenticate().unwrap().is_none());
        std::fs::write(&path, "\n   \n").unwrap();
        assert!(TokenFile::new(&path).authenticate().unwrap().is_none());
    }

    #[test]
    fn first_available_picks_in_order() {
        let chain = FirstAvailable::new()
            .with(Fixed(None))
            .with(Fixed(Some("second")))
            .with(Fixed(Some("third")));
        assert_eq!(chain.require().unwrap().secret(), "second");

        let empty = FirstAvailable::new().with(Fixed(None));
        assert!(empty.require().is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let t = AccessToken::new("ya29.secret");
        assert!(!format!("{t:?}").contains("secret"));
    }
}
