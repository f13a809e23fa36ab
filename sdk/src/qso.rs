//! One session with an FRN server.
//!
//! `Qso` owns the connection state machine, the uplink buffer and both codec
//! contexts. It never blocks: the transport, the timers and the audio
//! pipeline call into it, and it answers by writing to the transport and
//! publishing to its event and audio streams.

use async_channel::{bounded, Receiver, Sender};
use frn_protocol::{Request, ResponseCode, VoiceBlock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::codec::{FrameCodec, GsmCodec, SpeechCodec};
use crate::config::{Credentials, QsoConfig, Timing};
use crate::dispatch::{Action, HandshakePolicy, HandshakeStage, HandshakeVerdict, ResponseDispatcher};
use crate::error::QsoError;
use crate::event::QsoEvent;
use crate::state::State;
use crate::timer::PeriodicTimer;
use crate::transport::{DisconnectReason, Transport};
use crate::uplink::UplinkBuffer;

/// Events held for the application before new ones are dropped.
pub const EVENT_STREAM_CAPACITY: usize = 1024;

/// Decoded PCM blocks held before new ones are dropped, about 10 s of audio.
pub const AUDIO_STREAM_CAPACITY: usize = 256;

/// A session with one FRN server.
///
/// Events and decoded audio go out on bounded streams. An application that
/// stops reading one of them loses the newest items once it fills up; the
/// session itself never waits on a reader.
pub struct Qso<T: Transport, C: SpeechCodec = GsmCodec> {
    credentials: Option<Credentials>,
    max_connect_retry: u32,
    transport: T,
    frame_codec: FrameCodec<C>,
    uplink: UplinkBuffer,
    dispatcher: ResponseDispatcher,
    state: State,
    connect_retry_cnt: u32,
    is_sending_voice: bool,
    is_receiving_voice: bool,
    keep_alive_timer: PeriodicTimer,
    con_timeout_timer: PeriodicTimer,
    event_tx: Sender<QsoEvent>,
    event_rx: Receiver<QsoEvent>,
    audio_tx: Sender<Vec<f32>>,
    audio_rx: Receiver<Vec<f32>>,
}

impl<T: Transport, C: SpeechCodec + Default> Qso<T, C> {
    /// Create a session with fresh default codec contexts.
    pub fn new(config: &QsoConfig, transport: T) -> Self {
        Self::with_codecs(config, transport, C::default(), C::default())
    }
}

impl<T: Transport, C: SpeechCodec> Qso<T, C> {
    /// Create a session with the given encode and decode contexts.
    ///
    /// An incomplete configuration is logged and leaves the session disabled.
    pub fn with_codecs(config: &QsoConfig, transport: T, encoder: C, decoder: C) -> Self {
        let credentials = match config.validate() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                error!("{}", e);
                None
            }
        };
        let Timing {
            max_connect_retry, ..
        } = config.timing;

        let (event_tx, event_rx) = bounded(EVENT_STREAM_CAPACITY);
        let (audio_tx, audio_rx) = bounded(AUDIO_STREAM_CAPACITY);

        Self {
            credentials,
            max_connect_retry,
            transport,
            frame_codec: FrameCodec::new(encoder, decoder),
            uplink: UplinkBuffer::new(),
            dispatcher: ResponseDispatcher::default(),
            state: State::Disconnected,
            connect_retry_cnt: 0,
            is_sending_voice: false,
            is_receiving_voice: false,
            keep_alive_timer: PeriodicTimer::new(config.timing.keep_alive()),
            con_timeout_timer: PeriodicTimer::new(config.timing.con_timeout()),
            event_tx,
            event_rx,
            audio_tx,
            audio_rx,
        }
    }

    /// Replace the handshake decision point.
    pub fn set_handshake_policy(&mut self, policy: Box<dyn HandshakePolicy>) {
        self.dispatcher.set_policy(policy);
    }

    /// False when the configuration was incomplete; such a session never connects.
    pub fn init_ok(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_sending_voice(&self) -> bool {
        self.is_sending_voice
    }

    pub fn is_receiving_voice(&self) -> bool {
        self.is_receiving_voice
    }

    pub fn connect_retry_count(&self) -> u32 {
        self.connect_retry_cnt
    }

    /// Samples currently waiting in the uplink buffer.
    pub fn buffered_samples(&self) -> usize {
        self.uplink.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get a receiver for session events
    pub fn event_stream(&self) -> Receiver<QsoEvent> {
        self.event_rx.clone()
    }

    /// Get a receiver for decoded audio, one PCM block per message
    pub fn audio_stream(&self) -> Receiver<Vec<f32>> {
        self.audio_rx.clone()
    }

    // Connection control

    pub fn connect(&mut self) -> Result<(), QsoError> {
        let Some(credentials) = &self.credentials else {
            warn!("Refusing to connect: session not initialized");
            return Err(QsoError::NotInitialized);
        };
        if self.state != State::Disconnected {
            warn!("Refusing to connect in state {}", self.state);
            return Err(QsoError::InvalidState(self.state));
        }

        let (server, port) = (credentials.server.clone(), credentials.port);
        self.set_state(State::Connecting);
        info!("Connecting to {}:{}", server, port);
        self.transport.connect(&server, port);
        Ok(())
    }

    /// Tear the connection down locally. Safe to call in any state, repeatedly.
    pub fn disconnect(&mut self) {
        self.keep_alive_timer.set_enabled(false, Instant::now());
        self.con_timeout_timer.set_enabled(false, Instant::now());
        self.reset_floor();

        self.transport.disconnect();
        self.set_state(State::Disconnected);
    }

    // Audio sink

    /// Accept samples for transmission, returns how many were taken.
    ///
    /// Outside `LoggedIn` everything is accepted and dropped. While logged in
    /// a full buffer is sent if the floor is granted; otherwise intake stops
    /// and the caller must resubmit the rest later.
    pub fn write_samples(&mut self, samples: &[f32]) -> usize {
        if self.state != State::LoggedIn {
            return samples.len();
        }

        let mut samples_read = 0;
        while samples_read < samples.len() {
            samples_read += self.uplink.push(&samples[samples_read..]);
            if self.uplink.is_full() {
                if self.is_sending_voice {
                    self.send_voice_data();
                } else {
                    break;
                }
            }
        }
        samples_read
    }

    /// End of a transmission: pad and send what is buffered, then release the floor.
    pub fn flush_samples(&mut self) {
        if self.state == State::LoggedIn && !self.uplink.is_empty() {
            self.uplink.pad();
            self.send_voice_data();
            self.send_request(Request::Tx0);
            self.is_sending_voice = false;
        }
        self.publish(QsoEvent::AllSamplesFlushed);
    }

    /// Downstream released backpressure.
    pub fn resume_output(&mut self) {
        debug!("Output resumed");
    }

    /// Downstream finished playing everything it was given.
    pub fn all_samples_flushed(&mut self) {
        debug!("All samples flushed");
    }

    /// Upstream squelch changed; opening it ends the local transmission.
    pub fn squelch_open(&mut self, is_open: bool) {
        if is_open {
            self.send_request(Request::Tx0);
        }
    }

    // Transport callbacks

    pub fn on_connected(&mut self) {
        if self.state != State::Connecting {
            warn!("Ignoring connect completion in state {}", self.state);
            return;
        }
        self.set_state(State::Connected);

        self.connect_retry_cnt = 0;
        self.con_timeout_timer.set_enabled(true, Instant::now());
        self.login();
    }

    pub fn on_disconnected(&mut self, reason: DisconnectReason) {
        self.set_state(State::Disconnected);

        self.keep_alive_timer.set_enabled(false, Instant::now());
        self.con_timeout_timer.set_enabled(false, Instant::now());
        self.reset_floor();

        match reason {
            DisconnectReason::HostNotFound
            | DisconnectReason::RecvBufferOverflow
            | DisconnectReason::Unknown => {
                error!("Disconnected: {}", reason);
                self.set_state(State::Error);
            }
            DisconnectReason::RemoteDisconnected | DisconnectReason::SystemError => {
                warn!("Disconnected: {}", reason);
                self.reconnect();
            }
            DisconnectReason::OrderedDisconnect => {
                info!("Disconnected: {}", reason);
            }
        }
    }

    /// Handle one received chunk, returns the number of bytes consumed.
    pub fn on_data_received(&mut self, data: &[u8]) -> usize {
        self.con_timeout_timer.reset(Instant::now());

        match self.dispatcher.dispatch(self.state, data) {
            Action::Ignore => {}
            Action::Handshake(stage, verdict) => self.handle_handshake(stage, verdict),
            Action::GrantTransmit => {
                self.is_sending_voice = true;
                self.publish(QsoEvent::ResumeOutput);
            }
            Action::Voice(block) => {
                self.is_receiving_voice = true;
                self.handle_audio_data(block);
            }
            Action::Info { code, payload } => self.handle_info(code, payload),
            Action::Discard(e) => {
                debug!("Dropping inbound message: {}", e);
            }
            Action::Anomaly { code, payload } => {
                warn!(
                    "Unknown response code {}: {}",
                    code,
                    String::from_utf8_lossy(payload)
                );
                self.publish(QsoEvent::ProtocolAnomaly {
                    code,
                    payload: payload.to_vec(),
                });
            }
        }
        data.len()
    }

    pub fn on_send_buffer_full(&mut self, is_full: bool) {
        if is_full {
            warn!("Send buffer full");
        } else {
            debug!("Send buffer drained");
        }
    }

    // Timers

    /// Earliest armed timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.keep_alive_timer.deadline(), self.con_timeout_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer whose deadline has passed.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.con_timeout_timer.poll(now) {
            self.on_connect_timeout();
        }
        if self.keep_alive_timer.poll(now) {
            self.on_keepalive_timeout();
        }
    }

    pub fn on_keepalive_timeout(&mut self) {
        if self.transport.is_connected() {
            self.send_request(Request::Ping);
        }
    }

    pub fn on_connect_timeout(&mut self) {
        warn!("No data from server for {:?}", self.con_timeout_timer.period());
        self.disconnect();
        self.reconnect();
    }

    // Internals

    fn set_state(&mut self, new_state: State) {
        if new_state != self.state {
            info!("State {} -> {}", self.state, new_state);
            self.state = new_state;
            self.publish(QsoEvent::StateChanged(new_state));
        }
    }

    fn publish(&self, event: QsoEvent) {
        // The session holds a receiver itself, so the only failure is a full stream
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Event stream full, dropping {:?}", e.into_inner());
        }
    }

    fn reset_floor(&mut self) {
        self.is_sending_voice = false;
        self.is_receiving_voice = false;
        self.uplink.clear();
    }

    fn login(&mut self) {
        self.set_state(State::LoggingIn);

        if let Some(credentials) = &self.credentials {
            let request = credentials.login.encode();
            debug!("Sending login as {}", credentials.login.callsign_and_user);
            self.transport.write(&request);
        }
    }

    fn reconnect(&mut self) {
        self.connect_retry_cnt += 1;
        if self.connect_retry_cnt < self.max_connect_retry {
            info!("Reconnecting, attempt {}", self.connect_retry_cnt);
            if let Err(e) = self.connect() {
                warn!("Reconnect failed: {}", e);
            }
        } else {
            error!("Failed to connect {} times", self.connect_retry_cnt);
            self.set_state(State::Error);
        }
    }

    fn handle_handshake(&mut self, stage: HandshakeStage, verdict: HandshakeVerdict) {
        match (stage, verdict) {
            (HandshakeStage::Greeting, HandshakeVerdict::Advance) => {
                self.set_state(State::LoggingIn2);
            }
            (HandshakeStage::Confirmation, HandshakeVerdict::Advance) => {
                self.set_state(State::LoggedIn);
                self.keep_alive_timer.set_enabled(true, Instant::now());
                self.send_request(Request::Rx0);
            }
            (stage, HandshakeVerdict::Reject) => {
                error!("Login rejected by server at {:?}", stage);
                self.disconnect();
                self.set_state(State::Error);
            }
        }
    }

    fn handle_info(&self, code: ResponseCode, payload: &[u8]) {
        debug!("Received {:?}: {}", code, String::from_utf8_lossy(payload));
        self.publish(QsoEvent::Info {
            code,
            payload: payload.to_vec(),
        });
    }

    fn handle_audio_data(&mut self, block: VoiceBlock<'_>) {
        for unit in block.units() {
            match self.frame_codec.decode_unit(unit) {
                Ok(pcm) => {
                    let samples: Vec<f32> = pcm.iter().map(|&s| f32::from(s) / 32768.0).collect();
                    if self.audio_tx.try_send(samples).is_err() {
                        debug!("Audio stream full, dropping block");
                    }
                }
                Err(e) => {
                    error!("Voice decode failed: {}", e);
                    return;
                }
            }
        }
    }

    fn send_voice_data(&mut self) {
        let payload = self.frame_codec.encode_payload(self.uplink.as_slice());
        self.uplink.clear();

        match payload {
            Ok(payload) => {
                self.send_request(Request::Tx1);
                self.transport.write(&payload);
            }
            Err(e) => error!("Voice encode failed: {}", e),
        }
    }

    fn send_request(&mut self, request: Request) {
        debug!("Request {}", request);
        if self.transport.is_connected() {
            self.transport.write(&request.encode());
        }
    }
}

impl<T: Transport, C: SpeechCodec> Drop for Qso<T, C> {
    fn drop(&mut self) {
        self.keep_alive_timer.set_enabled(false, Instant::now());
        self.con_timeout_timer.set_enabled(false, Instant::now());
        self.transport.disconnect();
    }
}
