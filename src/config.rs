//! Configuration for the WebSocket transport.

use std::path::Path;

use crate::error::{Error, Result};
use crate::tls::{TlsError, load_certs_from_pem};

/// Caller-facing WebSocket transport configuration.
///
/// `host`, `relative_path` and `protocol_name` are required; they are kept as
/// `Option` so that a partially filled configuration can be built and handed
/// to [`WsIo::create`](crate::WsIo::create), which rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WsioConfig {
    /// Host name to connect to. Also sent as `Host` and `Origin`.
    pub host: Option<String>,

    /// TCP port.
    pub port: u16,

    /// Resource path requested during the upgrade, e.g. `/$iothub/websocket`.
    pub relative_path: Option<String>,

    /// WebSocket sub-protocol, e.g. `AMQPWSB10`.
    pub protocol_name: Option<String>,

    /// Wrap the connection in TLS.
    ///
    /// Default: false
    pub use_tls: bool,

    /// PEM-encoded certificate chain added to the verification store during
    /// the TLS handshake.
    ///
    /// Default: None
    pub trusted_ca: Option<String>,
}

impl WsioConfig {
    /// Create a configuration with every required field set.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        relative_path: impl Into<String>,
        protocol_name: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            port,
            relative_path: Some(relative_path.into()),
            protocol_name: Some(protocol_name.into()),
            use_tls: false,
            trusted_ca: None,
        }
    }

    /// Set the host name.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the resource path.
    #[must_use]
    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    /// Set the sub-protocol name.
    #[must_use]
    pub fn with_protocol_name(mut self, name: impl Into<String>) -> Self {
        self.protocol_name = Some(name.into());
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set the PEM trust anchor chain.
    #[must_use]
    pub fn with_trusted_ca(mut self, pem: impl Into<String>) -> Self {
        self.trusted_ca = Some(pem.into());
        self
    }

    /// Read the PEM trust anchor chain from a file.
    ///
    /// The file must contain at least one certificate.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::Io`] if the file cannot be read and
    /// [`TlsError::NoCertificatesFound`] if it holds no certificate.
    pub fn with_trusted_ca_file(mut self, path: &Path) -> std::result::Result<Self, TlsError> {
        let pem = std::fs::read_to_string(path)?;
        load_certs_from_pem(&pem)?;
        self.trusted_ca = Some(pem);
        Ok(self)
    }

    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        match self.host.as_deref() {
            None | Some("") => return Err(Error::ConfigInvalid("host")),
            Some(_) => {}
        }
        if self.relative_path.is_none() {
            return Err(Error::ConfigInvalid("relative_path"));
        }
        match self.protocol_name.as_deref() {
            None | Some("") => return Err(Error::ConfigInvalid("protocol_name")),
            Some(_) => {}
        }
        Ok(())
    }

    /// Validate and take an owned copy for an instance.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;
        Ok(ResolvedConfig {
            host: self.host.clone().unwrap_or_default(),
            port: self.port,
            relative_path: self.relative_path.clone().unwrap_or_default(),
            protocol_name: self.protocol_name.clone().unwrap_or_default(),
            use_tls: self.use_tls,
            trusted_ca: self.trusted_ca.clone(),
        })
    }
}

/// Validated configuration owned by one transport instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub relative_path: String,
    pub protocol_name: String,
    pub use_tls: bool,
    pub trusted_ca: Option<String>,
}
