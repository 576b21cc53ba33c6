//! WebSocket transport instance and its state machine.
//!
//! ## Lifecycle
//!
//! 1. **NotOpen** - created, or closed again
//! 2. **Opening** - `open` requested an engine session, handshake pending
//! 3. **Open** - handshake complete, `send` accepted
//! 4. **Error** - a partially sent frame failed; only drop is allowed
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsio::{IoCallbacks, WsIo, WsioConfig};
//!
//! let config = WsioConfig::new("example.com", 443, "/ws", "AMQPWSB10").with_tls(true);
//! let mut io = WsIo::create(&config, engine)?;
//!
//! io.open(IoCallbacks::new(|bytes| println!("{} bytes", bytes.len())))?;
//! loop {
//!     io.dowork();
//!     if io.is_open() {
//!         io.send(b"hello", |result| println!("send: {:?}", result))?;
//!         break;
//!     }
//! }
//! io.close()?;
//! ```

mod dispatch;
mod queue;
mod state;

pub use state::IoState;

mod wsio;

pub use wsio::WsIo;
