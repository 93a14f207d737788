use std::time::Duration;

use otel_fanout::re_exports::opentelemetry::trace::{TraceContextExt, Tracer};
use otel_fanout::re_exports::opentelemetry::{global, KeyValue};
use otel_fanout::{prefix_attributers, prefix_attributes, Attributer, Protocol, TelemetryOptions};

/// One simulated storage shard; its attributes get namespaced into the
/// parent span per shard position.
struct Shard {
    region: &'static str,
    capacity: i64,
}

impl Attributer for Shard {
    fn attributes(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("region", self.region),
            KeyValue::new("capacity", self.capacity),
        ]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let endpoint = std::env::args().nth(1);

    let mut builder = TelemetryOptions::builder()
        .protocol(Protocol::HttpProtobuf)
        .resource_attributes([("deployment.environment", "demo")]);

    if let Some(ref url) = endpoint {
        builder = builder.endpoint(url);
    }

    let mut guard = otel_fanout::init_telemetry(
        "otel-fanout-demo",
        env!("CARGO_PKG_VERSION"),
        Some(builder.build()),
    )?;

    tracing::info!("Demo application started");

    fetch_user("user-42").await;
    process_order("order-123", 3).await;
    sample_shards();

    tracing::info!("Demo application finished");

    if let Err(err) = guard.shutdown() {
        eprintln!("telemetry shutdown reported failures: {err}");
    }

    Ok(())
}

#[tracing::instrument]
async fn fetch_user(user_id: &str) {
    tracing::info!(user_id, "Fetching user from database");
    simulate_work(Duration::from_millis(50)).await;
    tracing::debug!(user_id, "User fetched successfully");
}

#[tracing::instrument]
async fn process_order(order_id: &str, item_count: u32) {
    tracing::info!(order_id, item_count, "Processing order");

    let meter = global::meter("otel-fanout-demo");
    let counter = meter.u64_counter("demo.orders.items").build();
    let histogram = meter.f64_histogram("demo.item.duration").build();

    for i in 1..=item_count {
        let started = std::time::Instant::now();
        process_item(order_id, i).await;
        counter.add(1, &[KeyValue::new("order_id", order_id.to_owned())]);
        histogram.record(started.elapsed().as_secs_f64(), &[]);
    }

    tracing::info!(order_id, "Order processed successfully");
}

#[tracing::instrument(skip(order_id))]
async fn process_item(order_id: &str, item_number: u32) {
    tracing::debug!(order_id, item_number, "Processing item");
    simulate_work(Duration::from_millis(30)).await;

    if item_number == 2 {
        tracing::warn!(order_id, item_number, "Item required retry");
        simulate_work(Duration::from_millis(20)).await;
    }
}

/// Record a span whose attributes come from namespaced sub-components.
fn sample_shards() {
    let shards = [
        Shard {
            region: "eu-west",
            capacity: 512,
        },
        Shard {
            region: "us-east",
            capacity: 1024,
        },
    ];

    let tracer = global::tracer("otel-fanout-demo");
    tracer.in_span("shard.sample", |cx| {
        let span = cx.span();
        for attr in prefix_attributers(&shards, "shard") {
            span.set_attribute(attr);
        }
        for attr in prefix_attributes(
            &[KeyValue::new("mode", "sample"), KeyValue::new("dry_run", true)],
            "demo.",
        ) {
            span.set_attribute(attr);
        }
    });
}

async fn simulate_work(duration: Duration) {
    tokio::time::sleep(duration).await;
}
