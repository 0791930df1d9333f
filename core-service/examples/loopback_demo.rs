//! Walk through a cast session against the in-memory receiver.
//!
//! ```sh
//! cargo run -p core-service --example loopback_demo
//! ```

use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use core_runtime::config::{CastConfig, DEFAULT_MEDIA_RECEIVER_APP_ID};
use core_runtime::logging::{LogFormat, LoggingConfig};
use core_service::{bootstrap_loopback, LoadMediaParams};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CastConfig::builder()
        .receiver_app_id(DEFAULT_MEDIA_RECEIVER_APP_ID)
        .build()
        .context("building cast config")?;
    let (service, receiver) = bootstrap_loopback(config, "Living Room TV");
    service.init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let mut events = service.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event {:<20} {}", event.wire_name(), event.description());
        }
    });

    service.initialize()?;
    let session = service.request_session().await?;
    println!(
        "joined {} on {}",
        session.session_id, session.receiver.friendly_name
    );

    let Some(client) = receiver.loopback_session().and_then(|s| s.client()) else {
        bail!("loopback receiver has no media client");
    };
    let queue = client.queue();
    let fetcher = tokio::spawn(async move {
        // Stand-in for the SDK's background item fetch.
        loop {
            tokio::time::sleep(Duration::from_millis(20)).await;
            queue.deliver_pending();
        }
    });

    let mut params = LoadMediaParams::new("https://cdn.example.com/big-buck-bunny.m3u8");
    params.autoplay = true;
    let snapshot = service.load_media(params).await?;
    println!(
        "loaded: state={:?} items={} stream={:?}",
        snapshot.player_state,
        snapshot.items.len(),
        snapshot.media.as_ref().map(|media| media.stream_type)
    );

    service.media_pause()?;
    service.media_seek(30_000)?;
    service.media_play()?;

    let reply = service
        .send_message("urn:x-cast:com.example.demo", r#"{"hello":"receiver"}"#)
        .await;
    println!("message delivered: {}", reply.success);

    service.session_stop()?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    fetcher.abort();
    service.shutdown()?;
    Ok(())
}
