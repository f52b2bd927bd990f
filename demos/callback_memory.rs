//! Order listener using the in-memory source and callback runtime.
//!
//! Wires a dispatcher the two-phase way a container would: construct it with
//! the runtime, register it against the source, then attach the handler.
//!
//! Run with: RUST_LOG=debug cargo run --example callback_memory --features logging

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use mom_dispatch::{
    create_memory_source, listen, Callback, CallbackRuntime, Destination, Envelope,
    ListenerConfig, MessageDispatcher, Result, RuntimeError,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as tracing_format, EnvFilter};

#[derive(Debug, Serialize, Deserialize)]
struct PlaceOrder {
    sku: String,
    qty: u32,
}

#[derive(Debug, Serialize)]
struct OrderAccepted {
    sku: String,
    total_cents: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_format()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let source = create_memory_source("demo-broker").await?;
    let runtime = Arc::new(CallbackRuntime::new("orders-runtime"));

    let dispatcher = Arc::new(MessageDispatcher::new(runtime.clone()));

    let config = ListenerConfig::builder()
        .destination("orders")
        .concurrency(2)
        .build()?;
    let task = listen(source.clone(), &config, dispatcher.clone()).await?;

    dispatcher.attach_handler(Callback::json(|order: PlaceOrder| async move {
        // ---
        if order.qty == 0 {
            return Err(RuntimeError::handler(format!("empty order for {}", order.sku)));
        }
        let accepted = OrderAccepted {
            total_cents: u64::from(order.qty) * 1_250,
            sku: order.sku,
        };
        println!("accepted: {accepted:?}");
        Ok(accepted)
    }));

    let orders = Destination::from("orders");
    for (sku, qty) in [("A-100", 3), ("B-200", 0), ("C-300", 1)] {
        let order = PlaceOrder {
            sku: sku.to_string(),
            qty,
        };
        source.publish(Envelope::json(orders.clone(), &order)?).await?;
    }

    // Give the listener a moment to drain before closing
    tokio::time::sleep(Duration::from_millis(100)).await;

    source.close().await?;
    task.await.expect("listener task panicked");

    println!("invocations: {}", runtime.invocations());
    Ok(())
}
