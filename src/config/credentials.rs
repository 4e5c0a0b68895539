//! Store credentials and their plain key=value persistence.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{AccessToken, ApiVersion, ClientId, ShopDomain};
use crate::error::ConfigError;

/// Environment key holding the store identifier or domain.
pub const ENV_STORE: &str = "SHOPIFY_STORE";
/// Environment key holding the Admin API access token.
pub const ENV_ACCESS_TOKEN: &str = "SHOPIFY_ACCESS_TOKEN";
/// Environment key holding the app client ID.
pub const ENV_CLIENT_ID: &str = "SHOPIFY_CLIENT_ID";
/// Environment key holding the API version.
pub const ENV_API_VERSION: &str = "SHOPIFY_API_VERSION";

/// Credentials for one store, immutable for the duration of a run.
///
/// These are held in memory only; [`Credentials::write_env_file`] writes them
/// as plain text and offers no secure storage.
///
/// # Example
///
/// ```rust
/// use shopify_extract::{AccessToken, ApiVersion, Credentials, ShopDomain};
///
/// let credentials = Credentials::new(
///     ShopDomain::new("my-store").unwrap(),
///     AccessToken::new("shpat_token").unwrap(),
///     None,
///     ApiVersion::V2025_01,
/// );
/// assert_eq!(credentials.api_version().to_string(), "2025-01");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    shop: ShopDomain,
    access_token: AccessToken,
    client_id: Option<ClientId>,
    api_version: ApiVersion,
}

impl Credentials {
    /// Creates credentials from validated parts.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        access_token: AccessToken,
        client_id: Option<ClientId>,
        api_version: ApiVersion,
    ) -> Self {
        if api_version.is_deprecated() {
            tracing::warn!(
                "API version {} is outside Shopify's support window and may stop working",
                api_version
            );
        }
        Self {
            shop,
            access_token,
            client_id,
            api_version,
        }
    }

    /// Returns the store domain.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the access token.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the client ID, if one was supplied.
    #[must_use]
    pub const fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Reads credentials from process environment variables.
    ///
    /// The API version defaults to [`ApiVersion::latest`] when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when the store or token is
    /// absent, or a validation error for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials from a key=value file such as `.env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CredentialsFile`] if the file cannot be parsed,
    /// otherwise the same errors as [`Credentials::from_env`].
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_error = |reason: String| ConfigError::CredentialsFile {
            path: path.display().to_string(),
            reason,
        };

        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(|e| file_error(e.to_string()))? {
            let (key, value) = item.map_err(|e| file_error(e.to_string()))?;
            values.insert(key, value);
        }

        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingCredential { key })
        };

        let shop = ShopDomain::new(required(ENV_STORE)?)?;
        let access_token = AccessToken::new(required(ENV_ACCESS_TOKEN)?)?;
        let client_id = lookup(ENV_CLIENT_ID)
            .filter(|v| !v.trim().is_empty())
            .map(ClientId::new)
            .transpose()?;
        let api_version = lookup(ENV_API_VERSION)
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| Ok(ApiVersion::latest()), |v| v.parse())?;

        Ok(Self::new(shop, access_token, client_id, api_version))
    }

    /// Writes the credentials as a plain key=value file, replacing it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CredentialsFile`] if the file cannot be written.
    pub fn write_env_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let mut contents = format!(
            "{ENV_STORE}={}\n{ENV_ACCESS_TOKEN}={}\n",
            self.shop.shop_name(),
            self.access_token.as_ref()
        );
        if let Some(client_id) = &self.client_id {
            contents.push_str(&format!("{ENV_CLIENT_ID}={}\n", client_id.as_ref()));
        }
        contents.push_str(&format!("{ENV_API_VERSION}={}\n", self.api_version));

        std::fs::write(path, contents).map_err(|e| ConfigError::CredentialsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
