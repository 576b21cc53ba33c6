//! Test harness for driving a transport against a scripted engine.
//!
//! Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

mod engine;
mod recorder;

pub use engine::{Connected, MockConnection, MockEngine, MockState, Scripted, Shared, WritePlan};
pub use recorder::{Observed, Recorder};

use wsio::{IoOpenResult, WsIo, WsioConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> WsioConfig {
    WsioConfig::new("iothub.example.net", 443, "/$iothub/websocket", "AMQPWSB10").with_tls(true)
}

/// A created, not yet opened transport.
pub fn created() -> (WsIo<MockEngine>, Shared, Recorder) {
    init_tracing();
    let engine = MockEngine::new();
    let shared = engine.shared();
    let io = WsIo::create(&test_config(), engine).unwrap();
    (io, shared, Recorder::new())
}

/// A transport whose open has been requested but not yet completed.
pub fn opening() -> (WsIo<MockEngine>, Shared, Recorder) {
    let (mut io, shared, recorder) = created();
    io.open(recorder.events()).unwrap();
    (io, shared, recorder)
}

/// A transport that completed its handshake. The recorder is empty.
pub fn opened() -> (WsIo<MockEngine>, Shared, Recorder) {
    let (mut io, shared, recorder) = opening();
    shared.borrow_mut().script(Scripted::Established);
    io.dowork();
    assert_eq!(recorder.take(), vec![Observed::OpenComplete(IoOpenResult::Ok)]);
    (io, shared, recorder)
}

/// Pump until the queue is empty or `max_rounds` is reached.
pub fn drain(io: &mut WsIo<MockEngine>, max_rounds: usize) -> usize {
    let mut rounds = 0;
    while io.pending_writes() > 0 && rounds < max_rounds {
        io.dowork();
        rounds += 1;
    }
    rounds
}
