use std::fs::File;
use std::io::BufWriter;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use frn_sdk::{spawn, Qso, QsoConfig, QsoEvent, QsoHandle, State, TcpTransport};
use hound::{SampleFormat, WavSpec, WavWriter};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// FRN audio is 8 kHz mono
const SAMPLE_RATE: u32 = 8000;

/// 20ms at 8kHz
const CHUNK_SIZE: usize = 160;
const CHUNK_DURATION_MS: u64 = 20;

type Recorder = WavWriter<BufWriter<File>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: frn_bot <config.toml> [input.wav] [output.wav]");
        eprintln!("Example: frn_bot frn.toml announce.wav received.wav");
        std::process::exit(1);
    }

    let config = QsoConfig::load(&args[1])?;
    let samples = args.get(2).map(|path| load_wav(path)).transpose()?;
    let recorder = args
        .get(3)
        .map(|path| WavWriter::create(path, wav_spec()))
        .transpose()?;

    let qso: Qso<TcpTransport> = Qso::new(&config, TcpTransport::new());
    if !qso.init_ok() {
        return Err("Incomplete configuration".into());
    }

    let (handle, task) = spawn(qso);
    let events = handle.event_stream();
    let recording = tokio::spawn(record(handle.audio_stream(), recorder));

    handle.connect().await?;

    let outcome = tokio::select! {
        result = run_session(&handle, &events, samples) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, disconnecting");
            Ok(())
        }
    };

    handle.disconnect().await?;
    handle.shutdown().await?;
    task.await?;

    let blocks = recording.await??;
    info!("Received {} audio blocks", blocks);

    outcome
}

fn wav_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn load_wav(path: &str) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    info!("Loading WAV file {}", path);
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != SAMPLE_RATE {
        error!(
            "Invalid sample rate: {}. Expected {} Hz",
            spec.sample_rate, SAMPLE_RATE
        );
        return Err("Invalid sample rate".into());
    }

    if spec.channels != 1 {
        error!(
            "Invalid channels: {}. Expected mono (1 channel)",
            spec.channels
        );
        return Err("Not mono audio".into());
    }

    if spec.bits_per_sample != 16 {
        error!(
            "Invalid bit depth: {}. Expected 16-bit",
            spec.bits_per_sample
        );
        return Err("Invalid bit depth".into());
    }

    let samples: Vec<f32> = reader
        .into_samples::<i16>()
        .map(|sample| sample.map(|s| f32::from(s) / 32768.0))
        .collect::<Result<_, _>>()?;

    info!("WAV file loaded: {} samples", samples.len());
    Ok(samples)
}

/// Log in, transmit the input once, then keep listening
async fn run_session(
    handle: &QsoHandle,
    events: &Receiver<QsoEvent>,
    samples: Option<Vec<f32>>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match events.recv().await? {
            QsoEvent::StateChanged(State::LoggedIn) => break,
            QsoEvent::StateChanged(State::Error) => return Err("Unable to log in".into()),
            event => log_event(&event),
        }
    }
    info!("Logged in");

    if let Some(samples) = samples {
        transmit(handle, &samples).await?;
    }

    loop {
        match events.recv().await? {
            QsoEvent::StateChanged(State::Error) => return Err("Session failed".into()),
            event => log_event(&event),
        }
    }
}

async fn transmit(handle: &QsoHandle, samples: &[f32]) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting transmission...");
    let stream_start = Instant::now();
    let mut chunk_count = 0u64;

    for chunk in samples.chunks(CHUNK_SIZE) {
        handle.write_samples(chunk.to_vec()).await?;
        chunk_count += 1;

        // Pace against the wall clock so processing delays do not accumulate
        let expected_elapsed = Duration::from_millis(chunk_count * CHUNK_DURATION_MS);
        let actual_elapsed = stream_start.elapsed();
        if actual_elapsed < expected_elapsed {
            sleep(expected_elapsed - actual_elapsed).await;
        }
    }

    handle.flush().await?;
    info!("Transmission queued ({} chunks)", chunk_count);
    Ok(())
}

fn log_event(event: &QsoEvent) {
    match event {
        QsoEvent::StateChanged(state) => info!("State: {}", state),
        QsoEvent::ResumeOutput => info!("Floor granted"),
        QsoEvent::AllSamplesFlushed => info!("Transmission complete"),
        QsoEvent::Info { code, payload } => {
            info!("{:?}: {}", code, String::from_utf8_lossy(payload));
        }
        QsoEvent::ProtocolAnomaly { code, payload } => {
            warn!("Unknown response {}: {} bytes", code, payload.len());
        }
    }
}

/// Write every received block to the output file, returns the block count
async fn record(audio: Receiver<Vec<f32>>, mut recorder: Option<Recorder>) -> Result<usize, hound::Error> {
    let mut blocks = 0;

    while let Ok(block) = audio.recv().await {
        if let Some(writer) = recorder.as_mut() {
            for sample in block {
                #[allow(clippy::cast_possible_truncation)]
                writer.write_sample((sample * 32768.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        blocks += 1;
    }

    if let Some(writer) = recorder {
        writer.finalize()?;
    }
    Ok(blocks)
}
