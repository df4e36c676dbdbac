//! TLS client configuration for `wss://` connections.
//!
//! The event loop asks a [`SecureTransportFactory`] for a fresh
//! [`rustls::ClientConfig`] at the start of every TLS handshake. The call
//! happens on the event loop thread, so implementations must not block or
//! touch the network.
//!
//! # Security Baseline
//!
//! [`DefaultSecureTransport`] produces configs that:
//!
//! - Offer TLS 1.3 and TLS 1.2 only (SSL 2/3, TLS 1.0/1.1 are unavailable)
//! - Never resume sessions, so no key material is shared across handshakes
//! - Use ephemeral (EC)DHE key exchange, one key share per handshake
//! - Verify the server against the platform's native root certificates

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustls::client::Resumption;
use rustls::version::{TLS12, TLS13};
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Protocol versions offered in every handshake, most preferred first.
static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] = &[&TLS13, &TLS12];

// ============================================================================
// SecureTransportFactory
// ============================================================================

/// Produces a TLS client configuration for one handshake.
///
/// Implemented for closures, so ad-hoc policies need no new type:
///
/// ```ignore
/// let factory = move || Ok(Arc::clone(&my_config));
/// let registry = ConnectionRegistry::builder()
///     .secure_transport(Arc::new(factory))
///     .build()?;
/// ```
pub trait SecureTransportFactory: Send + Sync {
    /// Creates the configuration for the next TLS handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if no usable configuration can be built. The
    /// connection attempt then fails; the event loop keeps running.
    fn create(&self) -> Result<Arc<ClientConfig>>;
}

impl<F> SecureTransportFactory for F
where
    F: Fn() -> Result<Arc<ClientConfig>> + Send + Sync,
{
    fn create(&self) -> Result<Arc<ClientConfig>> {
        self()
    }
}

// ============================================================================
// DefaultSecureTransport
// ============================================================================

/// Factory with a modern-baseline policy and native root certificates.
///
/// Root certificates are loaded once, at construction, so that
/// [`create`](SecureTransportFactory::create) only assembles a config.
#[derive(Clone)]
pub struct DefaultSecureTransport {
    roots: Arc<RootCertStore>,
}

impl fmt::Debug for DefaultSecureTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultSecureTransport")
            .field("root_count", &self.root_count())
            .finish()
    }
}

impl Default for DefaultSecureTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultSecureTransport {
    /// Creates a factory trusting the platform's native root certificates.
    ///
    /// Certificates that fail to load or parse are skipped and logged.
    #[must_use]
    pub fn new() -> Self {
        let native = rustls_native_certs::load_native_certs();
        for err in &native.errors {
            debug!(error = %err, "Skipping native root certificate");
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(native.certs);

        if roots.is_empty() {
            warn!("No native root certificates found; wss connections will fail");
        } else {
            debug!(added, ignored, "Loaded native root certificates");
        }

        Self::with_roots(roots)
    }

    /// Creates a factory trusting exactly `roots`.
    #[inline]
    #[must_use]
    pub fn with_roots(roots: RootCertStore) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    /// Returns the number of trusted root certificates.
    #[inline]
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }
}

impl SecureTransportFactory for DefaultSecureTransport {
    fn create(&self) -> Result<Arc<ClientConfig>> {
        if self.roots.is_empty() {
            return Err(Error::tls("no root certificates available"));
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(PROTOCOL_VERSIONS)
            .map_err(|e| Error::tls(e.to_string()))?
            .with_root_certificates(Arc::clone(&self.roots))
            .with_no_client_auth();

        config.resumption = Resumption::disabled();
        config.enable_sni = true;

        Ok(Arc::new(config))
    }
}

// ============================================================================
// Tests
// ============================================================================
