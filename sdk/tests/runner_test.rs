use std::time::Duration;

use async_channel::Receiver;
use frn_protocol::{ResponseCode, BUFFER_SIZE, FRAME_COUNT, PCM_FRAME_SIZE};
use frn_sdk::{
    spawn, CodecError, FrameCodec, GsmCodec, Qso, QsoConfig, QsoEvent, QsoHandle, SpeechCodec,
    State, TcpTransport, Timing,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn test_config(port: u16, timing: Timing) -> QsoConfig {
    QsoConfig {
        server: Some("127.0.0.1".into()),
        port: Some(port),
        email_address: Some("anna@example.org".into()),
        dyn_password: Some("secret".into()),
        callsign_and_user: Some("SM0ABC, Anna".into()),
        client_type: Some("PC Only".into()),
        band_and_channel: Some("PC Only".into()),
        description: Some("svx".into()),
        country: Some("Sweden".into()),
        city_city_part: Some("Stockholm".into()),
        net: Some("Test".into()),
        version: Some("2014003".into()),
        timing,
    }
}

/// Timing with a keep-alive slow enough to stay off the wire during a test
fn quiet_timing() -> Timing {
    Timing {
        keep_alive_ms: 60_000,
        ..Timing::default()
    }
}

/// Codec that costs nothing, for tests that push a lot of audio
#[derive(Default)]
struct SilentCodec;

impl SpeechCodec for SilentCodec {
    fn encode(&mut self, _pcm: &[i16], out: &mut [u8]) -> Result<(), CodecError> {
        out.fill(0);
        Ok(())
    }

    fn decode(&mut self, _data: &[u8], pcm: &mut [i16]) -> Result<(), CodecError> {
        pcm.fill(0);
        Ok(())
    }
}

async fn start_session(port: u16, timing: Timing) -> QsoHandle {
    let qso: Qso<TcpTransport> = Qso::new(&test_config(port, timing), TcpTransport::new());
    let (handle, _task) = spawn(qso);
    handle.connect().await.expect("Failed to send connect");
    handle
}

async fn wait_for_state(events: &Receiver<QsoEvent>, wanted: State) {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(QsoEvent::StateChanged(state)) if state == wanted => return,
                Ok(_) => {}
                Err(e) => panic!("Event stream closed: {e}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("Timed out waiting for {wanted}"));
}

async fn read_line(socket: &mut TcpStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while !line.ends_with(b"\n") {
        let n = timeout(WAIT, socket.read(&mut byte))
            .await
            .expect("Timed out reading")
            .expect("Read failed");
        assert!(n > 0, "Connection closed");
        line.push(byte[0]);
    }
    String::from_utf8(line).expect("Line is not UTF-8")
}

async fn read_exact(socket: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(WAIT, socket.read_exact(&mut buf))
        .await
        .expect("Timed out reading")
        .expect("Read failed");
    buf
}

/// Accept one client and walk it through the login handshake
async fn accept_and_login(listener: &TcpListener) -> TcpStream {
    let (mut socket, _) = timeout(WAIT, listener.accept())
        .await
        .expect("Timed out accepting")
        .expect("Accept failed");

    let login = read_line(&mut socket).await;
    assert!(login.starts_with("CT:<VX>2014003</VX>"));
    assert!(login.ends_with("<NT>Test</NT>\n"));

    socket.write_all(b"2014003\r\n").await.unwrap();
    // Each handshake reply must arrive in its own read
    sleep(Duration::from_millis(100)).await;
    socket.write_all(b"<AL>OK</AL>\r\n").await.unwrap();

    assert_eq!(read_line(&mut socket).await, "RX0\n");
    socket
}

#[tokio::test]
async fn test_login_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = start_session(port, quiet_timing()).await;
    let events = handle.event_stream();

    let _socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_keep_alive_pings() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let timing = Timing {
        keep_alive_ms: 100,
        ..Timing::default()
    };
    let handle = start_session(port, timing).await;

    let mut socket = accept_and_login(&listener).await;
    assert_eq!(read_line(&mut socket).await, "P\n");
    assert_eq!(read_line(&mut socket).await, "P\n");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_held_samples_sent_after_floor_grant() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = start_session(port, quiet_timing()).await;
    let events = handle.event_stream();

    let mut socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;

    // Nothing goes out before DO_TX
    handle
        .write_samples(vec![0.1; BUFFER_SIZE + 10])
        .await
        .unwrap();
    handle.flush().await.unwrap();
    sleep(Duration::from_millis(100)).await;

    socket.write_all(&[ResponseCode::DoTx.as_u8()]).await.unwrap();

    for _ in 0..2 {
        assert_eq!(read_line(&mut socket).await, "TX1\n");
        let payload = read_exact(&mut socket, 325).await;
        assert_eq!(payload.len(), 325);
    }
    assert_eq!(read_line(&mut socket).await, "TX0\n");

    timeout(WAIT, async {
        while let Ok(event) = events.recv().await {
            if event == QsoEvent::AllSamplesFlushed {
                return;
            }
        }
    })
    .await
    .expect("Flush was never reported");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_voice_downlink() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = start_session(port, quiet_timing()).await;
    let events = handle.event_stream();
    let audio = handle.audio_stream();

    let mut socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;

    let mut codec = FrameCodec::new(GsmCodec::new(), GsmCodec::new());
    let payload = codec.encode_payload(&[0i16; BUFFER_SIZE]).unwrap();
    let mut msg = vec![ResponseCode::VoiceBuffer.as_u8(), 0, 0];
    msg.extend_from_slice(&payload);
    socket.write_all(&msg).await.unwrap();

    for _ in 0..FRAME_COUNT {
        let block = timeout(WAIT, audio.recv())
            .await
            .expect("Timed out waiting for audio")
            .unwrap();
        assert_eq!(block.len(), PCM_FRAME_SIZE);
        assert!(block.iter().all(|s| s.abs() < 0.01));
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stalled_server_does_not_block_session() {
    // A small receive window so unread voice backs up into the client quickly
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(16).unwrap();
    let port = listener.local_addr().unwrap().port();

    let timing = Timing {
        con_timeout_ms: 1000,
        ..quiet_timing()
    };
    let qso: Qso<TcpTransport, SilentCodec> =
        Qso::new(&test_config(port, timing), TcpTransport::new());
    let (handle, _task) = spawn(qso);
    handle.connect().await.unwrap();
    let events = handle.event_stream();

    let mut server = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;
    server.write_all(&[ResponseCode::DoTx.as_u8()]).await.unwrap();

    // Far more voice than the socket buffers hold, and the server never reads it
    for _ in 0..100 {
        handle.write_samples(vec![0.1; BUFFER_SIZE * 50]).await.unwrap();
    }

    // The watchdog still runs while writes are pending
    wait_for_state(&events, State::Disconnected).await;
    wait_for_state(&events, State::Connecting).await;

    handle.shutdown().await.unwrap();
    drop(server);
}

#[tokio::test]
async fn test_remote_close_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = start_session(port, quiet_timing()).await;
    let events = handle.event_stream();

    let socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;
    drop(socket);

    let _socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_local_disconnect_closes_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = start_session(port, quiet_timing()).await;
    let events = handle.event_stream();

    let mut socket = accept_and_login(&listener).await;
    wait_for_state(&events, State::LoggedIn).await;

    handle.disconnect().await.unwrap();
    wait_for_state(&events, State::Disconnected).await;

    let mut buf = [0u8; 16];
    let n = timeout(WAIT, socket.read(&mut buf))
        .await
        .expect("Timed out waiting for close")
        .unwrap_or(0);
    assert_eq!(n, 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_refused_connections_exhaust_retries() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let timing = Timing {
        max_connect_retry: 2,
        ..quiet_timing()
    };
    let handle = start_session(port, timing).await;
    let events = handle.event_stream();

    wait_for_state(&events, State::Error).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_runner() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let qso: Qso<TcpTransport> = Qso::new(&test_config(port, quiet_timing()), TcpTransport::new());
    let (handle, task) = spawn(qso);

    handle.shutdown().await.unwrap();
    timeout(WAIT, task)
        .await
        .expect("Runner did not stop")
        .unwrap();

    assert!(handle.connect().await.is_err());
}
