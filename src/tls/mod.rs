//! TLS trust anchors for secure WebSocket (wss://) connections.
//!
//! The engine performs the TLS handshake itself. This module only turns the
//! caller-supplied PEM chain into entries of the engine's verification store,
//! a [`rustls::RootCertStore`].

mod rustls_impl;

pub use rustls::RootCertStore;
pub use rustls_impl::{TlsError, add_trust_anchors, load_certs_from_pem};
