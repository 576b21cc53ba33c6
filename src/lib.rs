//! # wsio - Non-blocking WebSocket client transport
//!
//! `wsio` adapts an external WebSocket engine (handshake, framing, TLS and
//! socket polling) to a small, callback-driven I/O contract used by
//! messaging clients.
//!
//! ## Features
//!
//! - **Five-operation contract**: create, drop, open, close, send, plus a
//!   cooperative `dowork` pump
//! - **Ordered, exactly-once send completions**, including across partial
//!   writes
//! - **Synchronous teardown**: `close` cancels everything in flight before it
//!   returns
//! - **Static TLS trust anchors** loaded from a caller-supplied PEM chain
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsio::{IoCallbacks, WsIo, WsioConfig};
//!
//! let config = WsioConfig::new("example.com", 443, "/ws", "AMQPWSB10").with_tls(true);
//! let mut io = WsIo::create(&config, engine)?;
//! io.open(IoCallbacks::new(|bytes| handle(bytes)))?;
//! io.dowork();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod tls;
pub mod transport;

pub use config::WsioConfig;
pub use engine::{
    ConnectRequest, Engine, EngineEvent, EventHandler, FrameBuffer, Link, ProtocolDescriptor,
    SendPadding, Session, SessionConfig,
};
pub use error::{Error, Result};
pub use io::{
    CloseComplete, IoCallbacks, IoEvents, IoInterface, IoOpenResult, IoSendResult, SendComplete,
};
pub use transport::{IoState, WsIo};
