//! Client certificate and CA trust pool loading.
//!
//! Loads a PEM client certificate chain and private key plus a PEM CA bundle,
//! either from files or from base64-encoded strings (standard alphabet,
//! padded). The result can be turned into a [`rustls::ClientConfig`] or
//! handed to [`HttpClient::with_tls`](crate::download::HttpClient::with_tls).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::prelude::*;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, InconsistentKeys, RootCertStore};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while loading TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A PEM file could not be read.
    #[error("failed to read {what} from {path}: {source}")]
    Read {
        /// Which input was being read.
        what: &'static str,
        /// Path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A base64 input could not be decoded.
    #[error("failed to decode base64 {what}: {source}")]
    Decode {
        /// Which input was being decoded.
        what: &'static str,
        /// The underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// The client certificate/key pair is unusable.
    #[error("failed to load client certificate: {reason}")]
    LoadKeyPair {
        /// What was wrong with the pair.
        reason: String,
    },

    /// Not a single CA certificate could be added to the trust pool.
    #[error("failed to append CA certificate to pool: {reason}")]
    AppendCaCert {
        /// What was wrong with the bundle.
        reason: String,
    },

    /// rustls rejected the assembled configuration.
    #[error("failed to build TLS client configuration: {source}")]
    Config {
        /// The underlying rustls error.
        #[source]
        source: rustls::Error,
    },

    /// The HTTP client could not be built with the TLS configuration.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl TlsError {
    fn read(what: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            what,
            path: path.to_path_buf(),
            source,
        }
    }

    fn decode(what: &'static str, source: base64::DecodeError) -> Self {
        Self::Decode { what, source }
    }

    fn load_key_pair(reason: impl Into<String>) -> Self {
        Self::LoadKeyPair {
            reason: reason.into(),
        }
    }

    fn append_ca_cert(reason: impl Into<String>) -> Self {
        Self::AppendCaCert {
            reason: reason.into(),
        }
    }

    fn config(source: rustls::Error) -> Self {
        Self::Config { source }
    }

    pub(crate) fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }
}

/// A client certificate chain with its private key.
#[derive(Debug)]
pub struct ClientIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// Certificate chain, leaf first.
    #[must_use]
    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    /// Private key matching the leaf certificate.
    #[must_use]
    pub fn key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }
}

impl Clone for ClientIdentity {
    fn clone(&self) -> Self {
        Self {
            cert_chain: self.cert_chain.clone(),
            key: self.key.clone_key(),
        }
    }
}

/// Client credential plus the CA pool used to verify servers.
#[derive(Debug, Clone)]
pub struct ClientTls {
    identity: ClientIdentity,
    roots: RootCertStore,
}

impl ClientTls {
    /// The client credential.
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// The trust pool.
    #[must_use]
    pub fn roots(&self) -> &RootCertStore {
        &self.roots
    }

    /// Number of CA certificates in the trust pool.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Builds a rustls client configuration presenting the identity and
    /// trusting only the loaded roots.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::Config`] if rustls rejects the credential.
    pub fn client_config(&self) -> Result<ClientConfig, TlsError> {
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(TlsError::config)?
            .with_root_certificates(self.roots.clone())
            .with_client_auth_cert(self.identity.cert_chain.clone(), self.identity.key.clone_key())
            .map_err(TlsError::config)
    }
}

/// Loads the client certificate, key and CA bundle from PEM files.
///
/// # Errors
///
/// Returns [`TlsError::Read`] when a file cannot be read,
/// [`TlsError::LoadKeyPair`] when the certificate/key pair is unusable, and
/// [`TlsError::AppendCaCert`] when the CA file holds no usable certificate.
#[instrument(skip_all)]
pub fn load_client_tls_from_files(
    client_cert_path: impl AsRef<Path>,
    client_key_path: impl AsRef<Path>,
    ca_cert_path: impl AsRef<Path>,
) -> Result<ClientTls, TlsError> {
    let client_cert_path = client_cert_path.as_ref();
    let client_key_path = client_key_path.as_ref();
    let ca_cert_path = ca_cert_path.as_ref();

    let cert_pem = std::fs::read(client_cert_path)
        .map_err(|e| TlsError::read("client certificate", client_cert_path, e))?;
    let key_pem = std::fs::read(client_key_path)
        .map_err(|e| TlsError::read("client key", client_key_path, e))?;
    let identity = parse_key_pair(&cert_pem, &key_pem)?;

    let ca_pem =
        std::fs::read(ca_cert_path).map_err(|e| TlsError::read("CA certificate", ca_cert_path, e))?;
    let roots = parse_ca_pool(&ca_pem)?;

    debug!(
        cert = %client_cert_path.display(),
        ca = %ca_cert_path.display(),
        roots = roots.len(),
        "loaded client TLS from files"
    );
    Ok(ClientTls { identity, roots })
}

/// Loads the client certificate, key and CA bundle from base64-encoded PEM.
///
/// # Errors
///
/// Returns [`TlsError::Decode`] when an input is not valid base64, otherwise
/// the same errors as [`load_client_tls_from_files`].
#[instrument(skip_all)]
pub fn load_client_tls_from_base64(
    client_cert_base64: &str,
    client_key_base64: &str,
    ca_cert_base64: &str,
) -> Result<ClientTls, TlsError> {
    let cert_pem = BASE64_STANDARD
        .decode(client_cert_base64)
        .map_err(|e| TlsError::decode("client certificate", e))?;
    let key_pem = BASE64_STANDARD
        .decode(client_key_base64)
        .map_err(|e| TlsError::decode("client key", e))?;
    let identity = parse_key_pair(&cert_pem, &key_pem)?;

    let ca_pem = BASE64_STANDARD
        .decode(ca_cert_base64)
        .map_err(|e| TlsError::decode("CA certificate", e))?;
    let roots = parse_ca_pool(&ca_pem)?;

    debug!(roots = roots.len(), "loaded client TLS from base64");
    Ok(ClientTls { identity, roots })
}

fn parse_key_pair(cert_pem: &[u8], key_pem: &[u8]) -> Result<ClientIdentity, TlsError> {
    let cert_chain = CertificateDer::pem_slice_iter(cert_pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::load_key_pair(format!("invalid certificate PEM: {e}")))?;
    if cert_chain.is_empty() {
        return Err(TlsError::load_key_pair(
            "no certificate found in client certificate PEM",
        ));
    }

    let key = PrivateKeyDer::from_pem_slice(key_pem)
        .map_err(|e| TlsError::load_key_pair(format!("invalid private key PEM: {e}")))?;

    ensure_key_matches(&cert_chain, &key)?;

    Ok(ClientIdentity { cert_chain, key })
}

fn ensure_key_matches(
    cert_chain: &[CertificateDer<'static>],
    key: &PrivateKeyDer<'static>,
) -> Result<(), TlsError> {
    let signing_key = rustls::crypto::ring::default_provider()
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| TlsError::load_key_pair(format!("unsupported private key: {e}")))?;

    match CertifiedKey::new(cert_chain.to_vec(), signing_key).keys_match() {
        // Unknown: the key type cannot expose its public half; nothing to compare.
        Ok(()) | Err(rustls::Error::InconsistentKeys(InconsistentKeys::Unknown)) => Ok(()),
        Err(e) => Err(TlsError::load_key_pair(format!(
            "private key does not match certificate: {e}"
        ))),
    }
}

fn parse_ca_pool(ca_pem: &[u8]) -> Result<RootCertStore, TlsError> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(ca_pem)
        .filter_map(Result::ok)
        .collect();
    if certs.is_empty() {
        return Err(TlsError::append_ca_cert("no PEM certificate found"));
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(TlsError::append_ca_cert(format!(
            "none of {ignored} certificates could be parsed"
        )));
    }
    Ok(roots)
}
