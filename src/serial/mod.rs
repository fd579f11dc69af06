//! # Serial Module
//!
//! Connection lifecycle and the concurrent read loop. A [`Connection`]
//! exclusively owns the open transport: the read half feeds a spawned task
//! that drains inbound bytes into the display log, the write half is the
//! single frame writer.

pub mod ports;

use crate::display::{Direction, DisplayLog, SessionLog};
use crate::error::{LinePortError, Result};
use crate::send::FrameSink;
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

/// Connection state. Transitions happen only through [`Connection::open`]
/// and [`Connection::disconnect`]; there is no automatic reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport is held.
    Disconnected,
    /// A transport is open for reading and writing.
    Open,
}

impl ConnectionState {
    /// Connection is open.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Connection is disconnected.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type SharedSession = Arc<Mutex<Option<SessionLog>>>;

/// The serial channel: open/close lifecycle, frame writes, and the inbound
/// read loop feeding a shared [`DisplayLog`].
pub struct Connection {
    state: ConnectionState,
    writer: Option<BoxedWriter>,
    read_task: Option<JoinHandle<()>>,
    log: DisplayLog,
    session: SharedSession,
    port_name: Option<String>,
}

impl Connection {
    /// Creates a disconnected connection whose read loop will append to
    /// `log`.
    pub fn new(log: DisplayLog) -> Self {
        Connection {
            state: ConnectionState::Disconnected,
            writer: None,
            read_task: None,
            log,
            session: Arc::new(Mutex::new(None)),
            port_name: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Display log handle shared with the read loop.
    pub fn log(&self) -> &DisplayLog {
        &self.log
    }

    /// Name of the open port, if any.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Installs (or removes) a session capture. Takes effect immediately,
    /// including for an already-running read loop.
    pub fn set_session(&self, session: Option<SessionLog>) {
        *self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Opens `port_name` at `baud_rate` (8 data bits, no parity, one stop
    /// bit, no flow control) and starts the read loop.
    ///
    /// On failure the state stays `Disconnected`.
    pub async fn open(&mut self, port_name: &str, baud_rate: u32) -> Result<()> {
        if self.state.is_open() {
            return Err(LinePortError::invalid_config(
                "a connection is already open; disconnect first",
            ));
        }
        match tokio_serial::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(10))
            .open_native_async()
        {
            Ok(stream) => {
                info!("Opened serial port {port_name} at {baud_rate} baud");
                self.attach(stream);
                self.port_name = Some(port_name.to_string());
                Ok(())
            }
            Err(e) => {
                error!("Failed to open serial port {port_name}: {e}");
                Err(LinePortError::port_open(port_name, e.to_string()))
            }
        }
    }

    /// Adopts an already-open bidirectional transport.
    ///
    /// The stream is split; the read half is handed to a spawned read-loop
    /// task and the write half becomes the exclusive frame writer.
    pub fn attach<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        self.read_task = Some(tokio::spawn(read_loop(
            reader,
            self.log.clone(),
            Arc::clone(&self.session),
        )));
        self.writer = Some(Box::new(writer));
        self.state = ConnectionState::Open;
    }

    /// Closes the connection: cancels the read loop, releases the writer,
    /// ends at `Disconnected`.
    ///
    /// Idempotent. Every teardown step is best-effort; failures are logged
    /// and swallowed so teardown always completes.
    pub async fn disconnect(&mut self) {
        if let Some(task) = self.read_task.take() {
            task.abort();
            // An aborted read task resolves to JoinError::Cancelled.
            let _ = task.await;
        }
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                warn!("Writer shutdown failed during disconnect: {e}");
            }
        }
        if let Some(name) = self.port_name.take() {
            info!("Closed serial port {name}");
        }
        self.state = ConnectionState::Disconnected;
    }
}

#[async_trait]
impl FrameSink for Connection {
    fn is_open(&self) -> bool {
        self.state.is_open()
    }

    async fn write_frame(&mut self, payload: Vec<u8>) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(LinePortError::NotConnected)?;
        writer
            .write_all(&payload)
            .await
            .map_err(|e| LinePortError::port_write(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| LinePortError::port_write(e.to_string()))?;
        let line = String::from_utf8_lossy(&payload);
        capture(&self.session, Direction::Write, line.trim_end());
        Ok(())
    }
}

/// Drains inbound bytes into the display log until EOF, a read error, or
/// cancellation.
///
/// Chunks are lossily decoded as UTF-8 and appended with trailing whitespace
/// trimmed. A read error leaves a diagnostic marker in the log and ends the
/// loop; reads are not retried.
async fn read_loop<R>(mut reader: R, log: DisplayLog, session: SharedSession)
where
    R: AsyncRead + Unpin,
{
    let mut buffer: [u8; 1024] = [0; 1024];
    loop {
        match reader.read(&mut buffer[..]).await {
            Ok(0) => {
                info!("Serial read stream ended");
                break;
            }
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buffer[..n]);
                let chunk = chunk.trim_end();
                log.append(chunk);
                capture(&session, Direction::Read, chunk);
            }
            Err(e) => {
                let err = LinePortError::port_read(e.to_string());
                error!("{err}");
                log.append(&format!("[{err}]"));
                capture(&session, Direction::Error, &err.to_string());
                break;
            }
        }
    }
}

/// Best-effort session capture; failures are logged and swallowed.
fn capture(session: &SharedSession, direction: Direction, data: &str) {
    let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(session) = guard.as_ref() {
        if let Err(e) = session.record(direction, data) {
            warn!("Session capture failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send::send_text;
    use crate::send::transform::{SendMode, apply};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("device disappeared")))
        }
    }

    async fn wait_until(log: &DisplayLog, entries: usize) {
        for _ in 0..200 {
            if log.len() >= entries {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("display log never reached {entries} entries");
    }

    #[tokio::test]
    async fn test_attach_opens_connection() {
        let (local, _remote) = tokio::io::duplex(256);
        let mut conn = Connection::new(DisplayLog::new());
        assert!(conn.state().is_disconnected());

        conn.attach(local);
        assert!(conn.state().is_open());
        assert!(conn.is_open());
    }

    #[tokio::test]
    async fn test_write_frame_reaches_remote() {
        let (local, mut remote) = tokio::io::duplex(256);
        let mut conn = Connection::new(DisplayLog::new());
        conn.attach(local);

        conn.write_frame(b"hello\n".to_vec()).await.unwrap();

        let mut buf = [0u8; 16];
        let n = remote.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello\n");
    }

    #[tokio::test]
    async fn test_write_while_disconnected_fails() {
        let mut conn = Connection::new(DisplayLog::new());
        let result = conn.write_frame(b"hello\n".to_vec()).await;
        assert!(matches!(result, Err(LinePortError::NotConnected)));
    }

    #[tokio::test]
    async fn test_inbound_chunks_land_in_display_log() {
        let (local, mut remote) = tokio::io::duplex(256);
        let log = DisplayLog::new();
        let mut conn = Connection::new(log.clone());
        conn.attach(local);

        remote.write_all(b"ok\r\n").await.unwrap();
        wait_until(&log, 1).await;
        assert_eq!(log.entries(), vec!["ok".to_string()]);

        conn.disconnect().await;
    }

    #[tokio::test]
    async fn test_remote_close_ends_read_loop_cleanly() {
        let (local, remote) = tokio::io::duplex(256);
        let log = DisplayLog::new();
        let mut conn = Connection::new(log.clone());
        conn.attach(local);

        drop(remote);
        // EOF must not leave a diagnostic marker behind.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(log.is_empty());

        conn.disconnect().await;
    }

    #[tokio::test]
    async fn test_read_error_leaves_diagnostic_and_exits() {
        let path = std::env::temp_dir().join(format!(
            "lineport-readerr-{}-{:?}.log",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);

        let log = DisplayLog::new();
        let session: SharedSession =
            Arc::new(Mutex::new(Some(SessionLog::create(&path).unwrap())));

        // Completing at all proves the loop exits instead of retrying.
        read_loop(FailingReader, log.clone(), Arc::clone(&session)).await;

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("[Failed to read from serial port:"));
        assert!(entries[0].contains("device disappeared"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("-error] Failed to read from serial port"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (local, _remote) = tokio::io::duplex(256);
        let mut conn = Connection::new(DisplayLog::new());
        conn.attach(local);

        conn.disconnect().await;
        assert!(conn.state().is_disconnected());
        conn.disconnect().await;
        assert!(conn.state().is_disconnected());

        let result = conn.write_frame(b"x\n".to_vec()).await;
        assert!(matches!(result, Err(LinePortError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_without_open_never_errors() {
        let mut conn = Connection::new(DisplayLog::new());
        conn.disconnect().await;
        assert!(conn.state().is_disconnected());
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let (local, _remote) = tokio::io::duplex(256);
        let mut conn = Connection::new(DisplayLog::new());
        conn.attach(local);

        let result = conn.open("/dev/null", 9600).await;
        assert!(matches!(result, Err(LinePortError::InvalidConfig(_))));
        assert!(conn.state().is_open());
    }

    #[tokio::test]
    async fn test_session_captures_both_directions() {
        let path = std::env::temp_dir().join(format!(
            "lineport-capture-{}-{:?}.log",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);

        let (local, mut remote) = tokio::io::duplex(256);
        let log = DisplayLog::new();
        let mut conn = Connection::new(log.clone());
        conn.attach(local);
        conn.set_session(Some(SessionLog::create(&path).unwrap()));

        conn.write_frame(b"ping\n".to_vec()).await.unwrap();
        remote.write_all(b"pong\n").await.unwrap();
        wait_until(&log, 1).await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("-write] ping"));
        assert!(content.contains("-read] pong"));

        conn.disconnect().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_plain_then_decorated_hello_scenario() {
        let (local, mut remote) = tokio::io::duplex(256);
        let log = DisplayLog::new();
        let mut conn = Connection::new(log.clone());
        conn.attach(local);

        let sent = send_text(&mut conn, &log, &apply(SendMode::Plain, "hello"))
            .await
            .unwrap();
        assert_eq!(sent, 1);
        let mut buf = [0u8; 16];
        let n = remote.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello\n");

        let sent = send_text(&mut conn, &log, &apply(SendMode::Decorated, "hello"))
            .await
            .unwrap();
        assert_eq!(sent, 1);
        let n = remote.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"br hello\n");
    }
}
