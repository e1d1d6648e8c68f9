//! Azure Storage connection string parsing.
//!
//! Accepts the `Key=Value;Key=Value` form issued by the Azure portal, including the
//! `UseDevelopmentStorage=true` shorthand for the local emulator.

use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Well-known account used by Azurite and the legacy storage emulator.
pub const DEV_STORE_ACCOUNT: &str = "devstoreaccount1";
const DEV_STORE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_STORE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("connection string is empty")]
    Empty,

    #[error("malformed connection string segment: {0}")]
    Malformed(String),

    #[error("connection string is missing {0}")]
    MissingField(&'static str),

    #[error("invalid blob endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Credentials and endpoint extracted from a connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureConnectionString {
    pub account_name: String,
    /// Base64-encoded shared key.
    pub account_key: String,
    /// Blob service endpoint without a trailing slash.
    pub blob_endpoint: String,
    pub use_emulator: bool,
}

// Keep the account key out of logs.
impl std::fmt::Debug for AzureConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .field("use_emulator", &self.use_emulator)
            .finish()
    }
}

impl AzureConnectionString {
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let mut fields: HashMap<String, String> = HashMap::new();
        for segment in input.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // Account keys end in '=' padding, so only the first '=' separates key from value
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::Malformed(segment.to_string()))?;
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let use_emulator = fields
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if use_emulator {
            let blob_endpoint = fields
                .get("developmentstorageproxyuri")
                .map(|proxy| format!("{}/{}", proxy.trim_end_matches('/'), DEV_STORE_ACCOUNT))
                .unwrap_or_else(|| DEV_STORE_BLOB_ENDPOINT.to_string());
            return Ok(AzureConnectionString {
                account_name: DEV_STORE_ACCOUNT.to_string(),
                account_key: DEV_STORE_KEY.to_string(),
                blob_endpoint: validate_endpoint(&blob_endpoint)?,
                use_emulator: true,
            });
        }

        let account_name = fields
            .get("accountname")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(ConnectionStringError::MissingField("AccountName"))?;
        let account_key = fields
            .get("accountkey")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(ConnectionStringError::MissingField("AccountKey"))?;

        let blob_endpoint = match fields.get("blobendpoint") {
            Some(endpoint) => endpoint.clone(),
            None => {
                let protocol = fields
                    .get("defaultendpointsprotocol")
                    .map(String::as_str)
                    .unwrap_or("https");
                let suffix = fields
                    .get("endpointsuffix")
                    .map(String::as_str)
                    .unwrap_or("core.windows.net");
                format!("{}://{}.blob.{}", protocol, account_name, suffix)
            }
        };

        Ok(AzureConnectionString {
            account_name,
            account_key,
            blob_endpoint: validate_endpoint(&blob_endpoint)?,
            use_emulator: false,
        })
    }

    pub fn allows_http(&self) -> bool {
        self.blob_endpoint.starts_with("http://")
    }
}

fn validate_endpoint(endpoint: &str) -> Result<String, ConnectionStringError> {
    let parsed = Url::parse(endpoint)
        .map_err(|e| ConnectionStringError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConnectionStringError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
