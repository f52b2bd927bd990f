// tests/listener.rs

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Barrier};
use tokio::time::{timeout, Duration};

use mom_dispatch::{
    //
    create_memory_source,
    listen,
    Callback,
    CallbackRuntime,
    Destination,
    Envelope,
    Error,
    ListenerConfig,
    MessageDispatcher,
    MessageListener,
    Result,
};

/// Callback that forwards each payload to `tx`.
fn forward_to(tx: mpsc::UnboundedSender<Bytes>) -> Callback {
    Callback::raw(move |env: Envelope| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(env.payload.clone());
            Ok(env.payload)
        }
    })
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("handler channel closed")
}

/// Wraps a listener and reports whether each delivery succeeded once it returns.
struct Reporting<L> {
    inner: L,
    done: mpsc::UnboundedSender<bool>,
}

#[async_trait::async_trait]
impl<L> MessageListener for Reporting<L>
where
    L: MessageListener,
{
    type Error = L::Error;

    async fn on_message(&self, message: Envelope) -> std::result::Result<(), Self::Error> {
        let res = self.inner.on_message(message).await;
        let _ = self.done.send(res.is_ok());
        res
    }
}

#[tokio::test]
async fn test_listener_delivers_in_order() -> Result<()> {
    // ---
    init_logging();

    let source = create_memory_source("in-order").await?;
    let runtime = Arc::new(CallbackRuntime::new("app"));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let dispatcher = MessageDispatcher::with_handler(runtime.clone(), forward_to(tx));
    let task = listen(source.clone(), &ListenerConfig::new("orders"), dispatcher).await?;

    for i in 0..5u8 {
        source
            .publish(Envelope::new(Destination::from("orders"), Bytes::from(vec![i])))
            .await?;
    }

    for i in 0..5u8 {
        assert_eq!(recv(&mut rx).await, Bytes::from(vec![i]));
    }
    assert_eq!(runtime.invocations(), 5);

    source.close().await?;
    timeout(Duration::from_millis(500), task)
        .await
        .expect("listener did not stop after close")
        .expect("listener task panicked");

    Ok(())
}

#[tokio::test]
async fn test_listener_survives_failed_deliveries() -> Result<()> {
    // ---
    init_logging();

    let source = create_memory_source("survives").await?;
    let runtime = Arc::new(CallbackRuntime::new("app"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    // Registered before a handler is attached: early messages fail
    let dispatcher = Arc::new(MessageDispatcher::new(runtime.clone()));
    let listener = Reporting {
        inner: dispatcher.clone(),
        done: done_tx,
    };
    let _task = listen(source.clone(), &ListenerConfig::new("late"), listener).await?;

    source
        .publish(Envelope::new(Destination::from("late"), Bytes::from_static(b"lost")))
        .await?;

    // The unattached delivery has been handled and reported as failed
    assert!(!recv(&mut done_rx).await);
    assert_eq!(runtime.invocations(), 0);

    dispatcher.attach_handler(forward_to(tx));

    source
        .publish(Envelope::new(Destination::from("late"), Bytes::from_static(b"kept")))
        .await?;

    assert_eq!(recv(&mut rx).await, Bytes::from_static(b"kept"));
    assert!(recv(&mut done_rx).await);
    assert_eq!(runtime.invocations(), 1);

    source.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_listener_runs_deliveries_concurrently() -> Result<()> {
    // ---
    init_logging();

    const SLOTS: usize = 4;

    let source = create_memory_source("concurrent").await?;
    let runtime = Arc::new(CallbackRuntime::new("app"));
    let barrier = Arc::new(Barrier::new(SLOTS));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Every delivery waits until SLOTS deliveries are running at once
    let handler = Callback::raw(move |env: Envelope| {
        let barrier = barrier.clone();
        let tx = tx.clone();
        async move {
            barrier.wait().await;
            let _ = tx.send(env.payload.clone());
            Ok(env.payload)
        }
    });

    let config = ListenerConfig::builder()
        .destination("fan-out")
        .concurrency(SLOTS)
        .listener_id("fan-out-listener")
        .build()?;

    let dispatcher = MessageDispatcher::with_handler(runtime.clone(), handler);
    let task = listen(source.clone(), &config, dispatcher).await?;

    for i in 0..SLOTS as u8 {
        source
            .publish(Envelope::new(Destination::from("fan-out"), Bytes::from(vec![i])))
            .await?;
    }

    let mut seen = Vec::new();
    for _ in 0..SLOTS {
        seen.push(recv(&mut rx).await);
    }
    seen.sort();
    let expected: Vec<Bytes> = (0..SLOTS as u8).map(|i| Bytes::from(vec![i])).collect();
    assert_eq!(seen, expected);

    source.close().await?;
    timeout(Duration::from_millis(500), task)
        .await
        .expect("listener did not drain after close")
        .expect("listener task panicked");

    Ok(())
}

#[tokio::test]
async fn test_listen_on_closed_source_fails() -> Result<()> {
    // ---
    let source = create_memory_source("closed").await?;
    source.close().await?;

    let runtime = Arc::new(CallbackRuntime::new("app"));
    let dispatcher = MessageDispatcher::<CallbackRuntime>::new(runtime);

    let res = listen(source, &ListenerConfig::new("orders"), dispatcher).await;
    assert!(matches!(res, Err(Error::SourceClosed)));

    Ok(())
}

#[tokio::test]
async fn test_listen_rejects_invalid_concurrency() -> Result<()> {
    // ---
    let source = create_memory_source("invalid").await?;
    let runtime = Arc::new(CallbackRuntime::new("app"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Arc::new(MessageDispatcher::with_handler(runtime.clone(), forward_to(tx)));

    // Fields are public, so the builder checks can be bypassed
    for concurrency in [0, usize::MAX] {
        let mut config = ListenerConfig::new("orders");
        config.concurrency = concurrency;

        let res = listen(source.clone(), &config, dispatcher.clone()).await;
        assert!(matches!(res, Err(Error::InvalidConfig(_))));
    }

    // Nothing was subscribed, so this publish reaches no handler
    source
        .publish(Envelope::new(Destination::from("orders"), Bytes::from_static(b"x")))
        .await?;
    assert!(rx.try_recv().is_err());
    assert_eq!(runtime.invocations(), 0);

    Ok(())
}

#[cfg(feature = "logging")]
mod imp {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

#[cfg(not(feature = "logging"))]
mod imp {
    #[inline]
    pub fn init() {}
}

pub fn init_logging() {
    imp::init();
}
