//! Logging system demonstration
//!
//! Shows the logging infrastructure and the event bus working together.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "core_runtime=trace"
//! ```

use core_runtime::events::{CoreEvent, EventBus, NarrationEvent, SessionEvent, StoryEvent};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let mut config = LoggingConfig::default().with_format(format);
    if let Some(directives) = args.get(2) {
        config = config.with_directives(directives.clone());
    }
    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "logging initialized");

    demo_structured_fields();
    demo_event_bus().await;
    demo_instrumentation().await;

    info!("demo complete");
}

fn demo_structured_fields() {
    info!("simple message without fields");
    info!(
        chunk_index = 2,
        chunk_count = 7,
        expression = "concerned",
        "chunk typing started"
    );
    warn!(text = "Watch out!", reason = "timeout", "speech fetch failed");
}

async fn demo_event_bus() {
    let bus = EventBus::new(16);
    let mut subscriber = bus.subscribe();

    bus.emit(CoreEvent::Narration(NarrationEvent::FetchStarted {
        text: "Once upon a time.".into(),
    }))
    .ok();
    bus.emit(CoreEvent::Session(SessionEvent::ScoreChanged { score: 10 }))
        .ok();
    bus.emit(CoreEvent::Story(StoryEvent::GenerationFailed {
        message: "service unavailable".into(),
    }))
    .ok();

    while let Ok(event) = subscriber.try_recv() {
        info!(severity = ?event.severity(), "{}", event.description());
    }
}

#[instrument]
async fn demo_instrumentation() {
    info!("instrumented function creates its own span");

    let chunks = ["Luna stopped.", "She looked both ways.", "Then she crossed."];
    for (index, chunk) in chunks.iter().enumerate() {
        reveal_chunk(index, chunk).await;
    }
}

#[instrument(fields(chunk = index))]
async fn reveal_chunk(index: usize, text: &str) {
    debug!(chars = text.len(), "revealing chunk");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
}
