//! OCI Authentication
//!
//! API-key request signing (HTTP Signatures, draft-cavage) as used by every
//! OCI REST endpoint.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::path::Path;
use url::Url;

/// Headers covered by the signature, in signing order
pub const SIGNED_HEADERS: &str = "date (request-target) host";

/// API-key identity and the key that signs its requests
pub struct OciCredentials {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl std::fmt::Debug for OciCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("OciCredentials")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl OciCredentials {
    /// Build credentials from a PEM private key (PKCS#8 or PKCS#1)
    pub fn from_pem(tenancy: &str, user: &str, fingerprint: &str, pem: &str) -> Result<Self> {
        if pem.contains("ENCRYPTED") {
            anyhow::bail!("Encrypted private keys are not supported; export the key without a passphrase");
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .context("Failed to parse API private key (expected an RSA key in PEM format)")?;

        Ok(Self {
            key_id: format!("{}/{}/{}", tenancy, user, fingerprint),
            signing_key: SigningKey::<Sha256>::new(private_key),
        })
    }

    /// Build credentials from the `key_file` of a config profile
    pub fn from_key_file(
        tenancy: &str,
        user: &str,
        fingerprint: &str,
        key_file: &Path,
    ) -> Result<Self> {
        let pem = std::fs::read_to_string(key_file)
            .with_context(|| format!("Failed to read API key file {:?}", key_file))?;
        Self::from_pem(tenancy, user, fingerprint, &pem)
    }

    /// `<tenancy>/<user>/<fingerprint>`
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Produce the `Authorization` header value for a request
    pub fn authorization(&self, method: &str, url: &Url, date: &str) -> Result<String> {
        let to_sign = signing_string(method, url, date);
        let signature = self
            .signing_key
            .try_sign(to_sign.as_bytes())
            .context("Failed to sign request")?;

        Ok(format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            SIGNED_HEADERS,
            STANDARD.encode(signature.to_bytes())
        ))
    }
}

/// Value of the `host` header reqwest sends for `url`
pub fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// `(request-target)` pseudo-header value: lowercase method, path and query
pub fn request_target(method: &str, url: &Url) -> String {
    let mut target = format!("{} {}", method.to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// The exact text that gets signed, one `name: value` line per signed header
pub fn signing_string(method: &str, url: &Url, date: &str) -> String {
    format!(
        "date: {}\n(request-target): {}\nhost: {}",
        date,
        request_target(method, url),
        host_header(url)
    )
}

/// Current time in the RFC 7231 format the `date` header requires
pub fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
