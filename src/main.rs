//! Hermes loopback demo: synthetic producer -> transport -> pull consumer

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use color_eyre::Result;
use tracing::{error, info};

use hermes::bridge::SharedSlot;
use hermes::filter::SnapGate;
use hermes::frame::{Frame, FrameMetadata, PixelFormat};
use hermes::sink::{ImageSink, SnapshotSink};
use hermes::source::{FillResult, ImageSource};
use hermes::transport::{LoopbackTransport, TransportHandle};
use hermes::wire::{self, SnapMessage};

fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("hermes=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Hermes launching...");

    // Load configuration
    let config = hermes::Config::load()?;
    hermes::CONFIG.store(Arc::new(config.clone()));

    let transport = Arc::new(TransportHandle::new());
    transport.replace(Box::new(LoopbackTransport::new()));

    // Pull side: transport-fed source plus snap gate
    let store: Arc<SharedSlot<Frame>> = Arc::new(SharedSlot::new());
    let mut source = ImageSource::new(
        &transport,
        &config.transport.data_channel,
        store,
        config.timeout(),
    )?;
    source.adapter_mut().on_caps_established(|caps| {
        info!(
            width = caps.width,
            height = caps.height,
            format = ?caps.format,
            "downstream caps configured"
        );
    });
    let gate = SnapGate::new(&transport, &config.transport.snap_channel)?;

    // Push side: per-frame image publisher and snapshot announcements
    let mut sink = ImageSink::new(
        Arc::clone(&transport),
        config.transport.data_channel.clone(),
    );
    let mut snapshot = SnapshotSink::new(Arc::clone(&transport), "GSTREAMER_PHOTO", config.period());

    // Synthetic producer standing in for an upstream pipeline; snaps every
    // tenth frame so the gate has something to admit
    let producer_transport = Arc::clone(&transport);
    let snap_channel = config.transport.snap_channel.clone();
    let producer = thread::spawn(move || {
        for sequence in 1..=60u64 {
            let frame = synthetic_frame(sequence, 640, 480);
            if let Err(e) = sink.render(&frame) {
                error!("publish failed: {e}");
                break;
            }
            if sequence % 10 == 0 {
                let snap = SnapMessage {
                    utime: wire::utime(),
                    debounce: (sequence / 10) as i64,
                };
                match snap.encode() {
                    Ok(payload) => {
                        if let Err(e) = producer_transport.publish(&snap_channel, &payload) {
                            error!("snap publish failed: {e}");
                        }
                    }
                    Err(e) => error!("snap encode failed: {e}"),
                }
            }
            thread::sleep(Duration::from_millis(33));
        }
    });

    // Consumer loop driven by fill requests
    let mut admitted = 0u64;
    loop {
        match source.fill() {
            Ok(FillResult::Data(frame)) => {
                snapshot.render(&frame)?;
                if let Some(frame) = gate.transform(frame) {
                    admitted += 1;
                    info!(
                        sequence = frame.meta.sequence,
                        size = frame.data.len(),
                        "snap admitted"
                    );
                }
            }
            Ok(FillResult::EndOfStream) => {
                info!("end of stream");
                break;
            }
            Err(e) => {
                error!("fill failed: {e}");
                break;
            }
        }
    }

    producer.join().expect("producer thread panicked");
    snapshot.stop();

    info!(admitted, "Hermes shutting down");
    Ok(())
}

/// Flat-colored RGB test frame
fn synthetic_frame(sequence: u64, width: u32, height: u32) -> Frame {
    let shade = (sequence % 256) as u8;
    Frame {
        data: Bytes::from(vec![shade; (width * height * 3) as usize]),
        meta: Arc::new(FrameMetadata {
            sequence,
            width,
            height,
            strides: vec![width * 3],
            format: PixelFormat::Rgb,
            device_timestamp: Some(Duration::from_micros(wire::utime() as u64)),
        }),
        timestamp: Instant::now(),
    }
}
