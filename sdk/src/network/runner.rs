use std::future::pending;
use std::io;
use std::time::Duration;

use async_channel::{unbounded, Receiver, Sender};
use frn_protocol::BUFFER_SIZE;
use tokio::net::{lookup_host, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::codec::SpeechCodec;
use crate::error::QsoError;
use crate::event::QsoEvent;
use crate::network::send_queue::SendQueue;
use crate::network::tcp_transport::TcpTransport;
use crate::qso::Qso;
use crate::transport::DisconnectReason;

/// Default timeout for establishing the TCP connection
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Socket read size
const TCP_BUFFER_SIZE: usize = 65536;

/// Samples held back while the floor is not granted (10 s of audio)
const MAX_HELD_SAMPLES: usize = BUFFER_SIZE * 50;

/// Requests from the application to the session task
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect,
    Disconnect,
    WriteSamples(Vec<f32>),
    Flush,
    SquelchOpen(bool),
    Shutdown,
}

/// Cloneable handle to a session running on its own task
#[derive(Clone)]
pub struct QsoHandle {
    command_tx: Sender<Command>,
    event_rx: Receiver<QsoEvent>,
    audio_rx: Receiver<Vec<f32>>,
}

impl QsoHandle {
    /// Get a receiver for session events
    pub fn event_stream(&self) -> Receiver<QsoEvent> {
        self.event_rx.clone()
    }

    /// Get a receiver for decoded audio blocks
    pub fn audio_stream(&self) -> Receiver<Vec<f32>> {
        self.audio_rx.clone()
    }

    pub async fn connect(&self) -> Result<(), QsoError> {
        self.send(Command::Connect).await
    }

    pub async fn disconnect(&self) -> Result<(), QsoError> {
        self.send(Command::Disconnect).await
    }

    /// Queue samples for transmission. Samples the session cannot take yet
    /// are held and resubmitted once the server grants the floor.
    pub async fn write_samples(&self, samples: Vec<f32>) -> Result<(), QsoError> {
        self.send(Command::WriteSamples(samples)).await
    }

    /// Mark the end of a transmission once all queued samples are taken.
    pub async fn flush(&self) -> Result<(), QsoError> {
        self.send(Command::Flush).await
    }

    pub async fn squelch_open(&self, is_open: bool) -> Result<(), QsoError> {
        self.send(Command::SquelchOpen(is_open)).await
    }

    pub async fn shutdown(&self) -> Result<(), QsoError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), QsoError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| QsoError::Closed)
    }
}

/// Move a session onto its own task and return a handle to it.
///
/// The task owns the socket, the timers and the session; every callback into
/// the session runs on that one task.
pub fn spawn<C>(qso: Qso<TcpTransport, C>) -> (QsoHandle, JoinHandle<()>)
where
    C: SpeechCodec + 'static,
{
    let (command_tx, command_rx) = unbounded();
    let handle = QsoHandle {
        command_tx,
        event_rx: qso.event_stream(),
        audio_rx: qso.audio_stream(),
    };

    let runner = Runner {
        qso,
        command_rx,
        stream: None,
        connecting: None,
        send_queue: SendQueue::default(),
        held: Vec::new(),
        flush_pending: false,
    };

    (handle, tokio::spawn(runner.run()))
}

type ConnectTask = JoinHandle<Result<TcpStream, DisconnectReason>>;

struct Runner<C: SpeechCodec> {
    qso: Qso<TcpTransport, C>,
    command_rx: Receiver<Command>,
    stream: Option<TcpStream>,
    connecting: Option<ConnectTask>,
    send_queue: SendQueue,
    held: Vec<f32>,
    flush_pending: bool,
}

impl<C: SpeechCodec> Runner<C> {
    async fn run(mut self) {
        let mut read_buf = vec![0u8; TCP_BUFFER_SIZE];

        loop {
            self.apply_transport_requests();
            self.collect_outbox();

            let deadline = self.qso.next_deadline();
            let has_unsent = !self.send_queue.is_empty();

            tokio::select! {
                result = wait_connect(&mut self.connecting) => {
                    self.connecting = None;
                    self.handle_connect(result);
                }

                result = wait_readable(&self.stream) => match result {
                    Ok(()) => self.read_available(&mut read_buf),
                    Err(e) => self.handle_socket_error(&e),
                },

                result = wait_writable(&self.stream), if has_unsent => match result {
                    Ok(()) => self.write_available(),
                    Err(e) => self.handle_socket_error(&e),
                },

                () = wait_until(deadline) => {
                    self.qso.poll_timers(Instant::now());
                }

                command = self.command_rx.recv() => {
                    match command {
                        Ok(Command::Shutdown) | Err(_) => break,
                        Ok(command) => self.handle_command(command),
                    }
                }
            }
        }

        if let Some(task) = self.connecting.take() {
            task.abort();
        }
        self.qso.disconnect();
        debug!("Session runner stopped");
    }

    /// Act on connect and close requests the session recorded
    fn apply_transport_requests(&mut self) {
        if self.qso.transport_mut().take_close_request() {
            if self.stream.take().is_some() {
                debug!("TCP connection closed");
            }
            self.send_queue.clear();
            if let Some(task) = self.connecting.take() {
                task.abort();
            }
        }

        if let Some((host, port)) = self.qso.transport_mut().take_connect_request() {
            self.connecting = Some(tokio::spawn(open_stream(host, port)));
        }
    }

    /// Move what the session wrote onto the send queue
    fn collect_outbox(&mut self) {
        let data = self.qso.transport_mut().take_outbox();
        if data.is_empty() || self.stream.is_none() {
            return;
        }

        if let Some(is_full) = self.send_queue.push(&data) {
            self.qso.on_send_buffer_full(is_full);
        }
    }

    /// Hand as much of the send queue to the socket as it takes without blocking
    fn write_available(&mut self) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        match stream.try_write(self.send_queue.as_slice()) {
            Ok(n) => {
                if let Some(is_full) = self.send_queue.consume(n) {
                    self.qso.on_send_buffer_full(is_full);
                }
                if !self.send_queue.is_empty() {
                    debug!("{} bytes waiting for the socket", self.send_queue.len());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => self.handle_socket_error(&e),
        }
    }

    fn read_available(&mut self, read_buf: &mut [u8]) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        match stream.try_read(read_buf) {
            Ok(0) => self.drop_connection(DisconnectReason::RemoteDisconnected),
            Ok(n) => {
                debug!("Received {} bytes", n);
                self.qso.on_data_received(&read_buf[..n]);
                self.drain_held();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => self.handle_socket_error(&e),
        }
    }

    fn handle_socket_error(&mut self, e: &io::Error) {
        error!("TCP error: {}", e);
        self.drop_connection(DisconnectReason::SystemError);
    }

    fn handle_connect(&mut self, result: Result<TcpStream, DisconnectReason>) {
        match result {
            Ok(stream) => {
                if let Ok(addr) = stream.peer_addr() {
                    info!("TCP connected to {}", addr);
                }
                self.send_queue.clear();
                self.stream = Some(stream);
                self.qso.transport_mut().set_connected(true);
                self.qso.on_connected();
            }
            Err(reason) => self.qso.on_disconnected(reason),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => {
                if let Err(e) = self.qso.connect() {
                    warn!("Connect refused: {}", e);
                }
            }
            Command::Disconnect => {
                self.held.clear();
                self.flush_pending = false;
                self.qso.disconnect();
            }
            Command::WriteSamples(samples) => {
                self.held.extend_from_slice(&samples);
                if self.held.len() > MAX_HELD_SAMPLES {
                    let excess = self.held.len() - MAX_HELD_SAMPLES;
                    warn!("Dropping {} held samples", excess);
                    self.held.drain(..excess);
                }
                self.drain_held();
            }
            Command::Flush => {
                self.flush_pending = true;
                self.drain_held();
            }
            Command::SquelchOpen(is_open) => self.qso.squelch_open(is_open),
            Command::Shutdown => {}
        }
    }

    /// Resubmit held samples, then run a pending flush once they are all taken
    fn drain_held(&mut self) {
        if !self.held.is_empty() {
            let accepted = self.qso.write_samples(&self.held);
            self.held.drain(..accepted);
        }

        if self.flush_pending && self.held.is_empty() {
            self.flush_pending = false;
            self.qso.flush_samples();
        }
    }

    fn drop_connection(&mut self, reason: DisconnectReason) {
        self.stream = None;
        self.send_queue.clear();
        self.qso.transport_mut().set_connected(false);
        self.qso.on_disconnected(reason);
    }
}

async fn open_stream(host: String, port: u16) -> Result<TcpStream, DisconnectReason> {
    let addr = match lookup_host((host.as_str(), port)).await {
        Ok(mut addrs) => addrs.next(),
        Err(e) => {
            warn!("Lookup of {} failed: {}", host, e);
            None
        }
    };
    let Some(addr) = addr else {
        return Err(DisconnectReason::HostNotFound);
    };

    match tokio::time::timeout(
        Duration::from_secs(CONNECT_TIMEOUT_SECS),
        TcpStream::connect(addr),
    )
    .await
    {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => {
            warn!("Connect to {} failed: {}", addr, e);
            Err(DisconnectReason::SystemError)
        }
        Err(_) => {
            warn!("Connect to {} timed out", addr);
            Err(DisconnectReason::SystemError)
        }
    }
}

async fn wait_connect(connecting: &mut Option<ConnectTask>) -> Result<TcpStream, DisconnectReason> {
    match connecting {
        Some(task) => task.await.unwrap_or(Err(DisconnectReason::SystemError)),
        None => pending().await,
    }
}

async fn wait_readable(stream: &Option<TcpStream>) -> io::Result<()> {
    match stream {
        Some(stream) => stream.readable().await,
        None => pending().await,
    }
}

async fn wait_writable(stream: &Option<TcpStream>) -> io::Result<()> {
    match stream {
        Some(stream) => stream.writable().await,
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
