use super::{Frame, Socket, SocketEvent};
use crate::codec::ContentEncoder;
use crate::config::{LevelFilter, Logger, WebSocketConfig};
use crate::error::{NetError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

/// Connection state of a [`WebSocketChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Never connected.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Open.
    Connected,
    /// Tearing down.
    Disconnecting,
    /// Finished for good.
    Closed,
}

type Consumer = mpsc::Sender<Result<Bytes>>;

struct Inner {
    state: ChannelState,
    consumers: HashMap<Uuid, Consumer>,
    pump: Option<JoinHandle<()>>,
    ping: Option<JoinHandle<()>>,
}

/// State shared by every handle and stream of one channel.
struct Shared {
    socket: Arc<dyn Socket>,
    config: WebSocketConfig,
    logger: Logger,
    inner: Mutex<Inner>,
    state: watch::Sender<ChannelState>,
}

impl Shared {
    fn set_state(&self, inner: &mut Inner, state: ChannelState) {
        inner.state = state;
        self.state.send_replace(state);
    }

    fn attach(self: &Arc<Self>) -> (Uuid, mpsc::Receiver<Result<Bytes>>) {
        let id = Uuid::new_v4();
        // One extra slot stays free for the terminal error.
        let (tx, rx) = mpsc::channel(self.config.consumer_buffer.max(1) + 1);

        let mut inner = self.inner.lock();
        if inner.state == ChannelState::Closed || inner.state == ChannelState::Disconnecting {
            // Dropping `tx` ends the new stream immediately.
            return (id, rx);
        }
        inner.consumers.insert(id, tx);
        self.logger.trace(format_args!(
            "Consumer {} attached ({} total)",
            id,
            inner.consumers.len()
        ));

        if inner.state == ChannelState::Idle {
            self.start(&mut inner);
        }
        if inner.ping.is_none() && inner.state != ChannelState::Closed {
            inner.ping = self.spawn_ping();
        }
        (id, rx)
    }

    fn detach(self: &Arc<Self>, id: Uuid) {
        let last = {
            let mut inner = self.inner.lock();
            inner.consumers.remove(&id).is_some() && inner.consumers.is_empty()
        };
        if last {
            self.logger.debug(format_args!("Last consumer detached, closing"));
            self.finish(None);
        }
    }

    /// Open the connection. Caller holds the lock and has checked for `Idle`.
    fn start(self: &Arc<Self>, inner: &mut Inner) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                self.logger
                    .error(format_args!("Cannot connect outside a runtime: {}", err));
                self.close_locked(inner, Some(err.to_string()));
                return;
            }
        };
        self.set_state(inner, ChannelState::Connecting);

        let shared = self.clone();
        inner.pump = Some(handle.spawn(async move {
            match shared.socket.connect().await {
                Ok(mut events) => {
                    while let Some(event) = events.next().await {
                        if !shared.handle(event) {
                            return;
                        }
                    }
                    shared.finish(None);
                }
                Err(err) => {
                    shared.logger.error(format_args!("Socket connect failed: {}", err));
                    shared.finish(Some(err.to_string()));
                }
            }
        }));
    }

    fn spawn_ping(&self) -> Option<JoinHandle<()>> {
        let period = self.config.ping_interval?;
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let socket = self.socket.clone();
        let logger = self.logger;
        Some(handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if let Err(err) = socket.send(Frame::Ping(Bytes::new())).await {
                    logger.debug(format_args!("Ping failed: {}", err));
                }
            }
        }))
    }

    /// Process one socket event. Returns `false` once the channel is finished.
    fn handle(&self, event: SocketEvent) -> bool {
        match event {
            SocketEvent::Connected => {
                let mut inner = self.inner.lock();
                if inner.state == ChannelState::Connecting {
                    self.set_state(&mut inner, ChannelState::Connected);
                }
                self.logger.debug(format_args!("Socket connected"));
                true
            }
            SocketEvent::Text(text) => self.broadcast(Bytes::from(text)),
            SocketEvent::Binary(data) => self.broadcast(data),
            SocketEvent::Error(message) => {
                self.logger.error(format_args!("Socket error: {}", message));
                self.finish(Some(message));
                false
            }
            SocketEvent::Disconnected | SocketEvent::Cancelled | SocketEvent::PeerClosed => {
                self.logger.debug(format_args!("Socket closed: {:?}", event));
                self.finish(None);
                false
            }
            SocketEvent::Ping | SocketEvent::Pong | SocketEvent::ViabilityChanged(_) => true,
        }
    }

    fn broadcast(&self, data: Bytes) -> bool {
        let emptied = {
            let mut inner = self.inner.lock();
            if inner.state == ChannelState::Closed {
                return false;
            }
            if inner.consumers.is_empty() {
                return true;
            }
            let logger = self.logger;
            inner.consumers.retain(|id, consumer| {
                if consumer.is_closed() {
                    return false;
                }
                if consumer.capacity() <= 1 {
                    logger.warn(format_args!("Consumer {} is too slow, dropping it", id));
                    return false;
                }
                consumer.try_send(Ok(data.clone())).is_ok()
            });
            inner.consumers.is_empty()
        };
        if emptied {
            self.finish(None);
            return false;
        }
        true
    }

    fn finish(&self, error: Option<String>) {
        let mut inner = self.inner.lock();
        self.close_locked(&mut inner, error);
    }

    fn close_locked(&self, inner: &mut Inner, error: Option<String>) {
        if inner.state == ChannelState::Closed {
            return;
        }
        let was_open = inner.state != ChannelState::Idle;
        self.set_state(inner, ChannelState::Disconnecting);

        if let Some(ping) = inner.ping.take() {
            ping.abort();
        }
        let pump = inner.pump.take();
        for (id, consumer) in inner.consumers.drain() {
            if let Some(message) = &error {
                if let Err(mpsc::error::TrySendError::Full(_)) =
                    consumer.try_send(Err(NetError::Socket(message.clone())))
                {
                    self.logger.warn(format_args!(
                        "Consumer {} is full, dropped error: {}",
                        id, message
                    ));
                }
            }
        }

        if was_open {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let socket = self.socket.clone();
                handle.spawn(async move {
                    socket.disconnect().await;
                    if let Some(pump) = pump {
                        pump.abort();
                    }
                });
            }
        }
        self.set_state(inner, ChannelState::Closed);
    }

    async fn ensure_connected(self: &Arc<Self>) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                ChannelState::Connected => return Ok(()),
                ChannelState::Closed | ChannelState::Disconnecting => {
                    return Err(NetError::NotConnected)
                }
                ChannelState::Idle => self.start(&mut inner),
                ChannelState::Connecting => {}
            }
        }
        let mut state = self.state.subscribe();
        let reached = state
            .wait_for(|state| {
                matches!(
                    state,
                    ChannelState::Connected | ChannelState::Disconnecting | ChannelState::Closed
                )
            })
            .await
            .map(|state| *state);
        match reached {
            Ok(ChannelState::Connected) => Ok(()),
            _ => Err(NetError::NotConnected),
        }
    }

    async fn write(self: &Arc<Self>, frame: Frame) -> Result<()> {
        self.ensure_connected().await?;
        self.socket.send(frame).await
    }
}

type MapFn<T> = dyn Fn(Bytes) -> Result<T> + Send + Sync;

/// Held by every handle and stream; the last one dropped closes the channel.
struct Lifetime {
    shared: Arc<Shared>,
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.shared.finish(None);
    }
}

/// A shared, lazily connected, multi-consumer message channel.
///
/// Cloning a channel or mapping it never opens a second connection. Every
/// [`subscribe`](Self::subscribe) call attaches a new consumer to the same
/// socket. The connection is closed once every handle and stream is dropped.
///
/// # Examples
///
/// ```ignore
/// use futures::StreamExt;
///
/// let channel = api.path("feed").json_stream()?;
/// let mut first = channel.subscribe();
/// let mut second = channel.subscribe();
///
/// channel.send_text("hello").await?;
/// while let Some(message) = first.next().await {
///     println!("{}", message?);
/// }
/// ```
pub struct WebSocketChannel<T> {
    shared: Arc<Shared>,
    lifetime: Arc<Lifetime>,
    map: Arc<MapFn<T>>,
}

impl<T> Clone for WebSocketChannel<T> {
    fn clone(&self) -> Self {
        WebSocketChannel {
            shared: self.shared.clone(),
            lifetime: self.lifetime.clone(),
            map: self.map.clone(),
        }
    }
}

impl<T> fmt::Debug for WebSocketChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("state", &*self.shared.state.borrow())
            .finish_non_exhaustive()
    }
}

impl WebSocketChannel<Bytes> {
    /// Channel over `socket` with logging off.
    pub fn new(socket: Arc<dyn Socket>, config: WebSocketConfig) -> Self {
        Self::with_logger(socket, config, Logger::new(LevelFilter::OFF))
    }

    /// Channel over `socket` logging through `logger`.
    pub fn with_logger(socket: Arc<dyn Socket>, config: WebSocketConfig, logger: Logger) -> Self {
        let shared = Shared {
            socket,
            config,
            logger,
            inner: Mutex::new(Inner {
                state: ChannelState::Idle,
                consumers: HashMap::new(),
                pump: None,
                ping: None,
            }),
            state: watch::Sender::new(ChannelState::Idle),
        };
        let shared = Arc::new(shared);
        let identity: Arc<MapFn<Bytes>> = Arc::new(|data: Bytes| -> Result<Bytes> { Ok(data) });
        WebSocketChannel {
            lifetime: Arc::new(Lifetime {
                shared: shared.clone(),
            }),
            shared,
            map: identity,
        }
    }
}

impl<T: 'static> WebSocketChannel<T> {
    /// Attach a consumer, connecting on first use.
    ///
    /// Dropping the returned stream detaches it.
    pub fn subscribe(&self) -> ChannelStream<T> {
        let (id, receiver) = self.shared.attach();
        ChannelStream {
            id,
            shared: self.shared.clone(),
            _lifetime: self.lifetime.clone(),
            receiver: ReceiverStream::new(receiver),
            map: self.map.clone(),
        }
    }

    /// Transform every element.
    pub fn map<U: 'static, F>(&self, f: F) -> WebSocketChannel<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Transform every element, possibly failing.
    pub fn try_map<U: 'static, F>(&self, f: F) -> WebSocketChannel<U>
    where
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let inner = self.map.clone();
        let map: Arc<MapFn<U>> = Arc::new(move |data: Bytes| -> Result<U> { inner(data).and_then(&f) });
        WebSocketChannel {
            shared: self.shared.clone(),
            lifetime: self.lifetime.clone(),
            map,
        }
    }

    /// Send a binary frame.
    pub async fn send_bytes(&self, data: impl Into<Bytes>) -> Result<()> {
        self.shared.write(Frame::Binary(data.into())).await
    }

    /// Send a text frame.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.shared.write(Frame::Text(text.into())).await
    }

    /// Encode `value` and send it as a text frame.
    ///
    /// # Errors
    ///
    /// [`NetError::InvalidUtf8`] if the encoder output is not UTF-8.
    pub async fn send_encodable<V>(&self, value: &V, encoder: &dyn ContentEncoder) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(NetError::encode)?;
        let data = encoder.encode(&value)?;
        let text = String::from_utf8(data.to_vec()).map_err(|_| NetError::InvalidUtf8)?;
        self.send_text(text).await
    }

    /// Disconnect and finish every consumer.
    pub fn close(&self) {
        self.shared.finish(None);
    }

    /// Current connection state.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }
}

/// One consumer of a [`WebSocketChannel`].
pub struct ChannelStream<T> {
    id: Uuid,
    shared: Arc<Shared>,
    _lifetime: Arc<Lifetime>,
    receiver: ReceiverStream<Result<Bytes>>,
    map: Arc<MapFn<T>>,
}

impl<T> Stream for ChannelStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match Pin::new(&mut this.receiver).poll_next(cx) {
            Poll::Ready(Some(Ok(data))) => Poll::Ready(Some((this.map)(data))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for ChannelStream<T> {
    fn drop(&mut self) {
        self.shared.detach(self.id);
    }
}

impl<T> fmt::Debug for ChannelStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelStream").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    struct Scripted {
        events: Mutex<Option<mpsc::UnboundedReceiver<SocketEvent>>>,
        sent: Mutex<Vec<Frame>>,
        failing_sends: AtomicUsize,
        connects: AtomicUsize,
        disconnected: AtomicBool,
    }

    impl Scripted {
        fn new() -> (Arc<Self>, mpsc::UnboundedSender<SocketEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let socket = Arc::new(Scripted {
                events: Mutex::new(Some(rx)),
                sent: Mutex::new(Vec::new()),
                failing_sends: AtomicUsize::new(0),
                connects: AtomicUsize::new(0),
                disconnected: AtomicBool::new(false),
            });
            (socket, tx)
        }
    }

    #[async_trait]
    impl Socket for Scripted {
        async fn connect(&self) -> Result<BoxStream<'static, SocketEvent>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let events = self.events.lock().take().ok_or(NetError::NotConnected)?;
            Ok(UnboundedReceiverStream::new(events).boxed())
        }

        async fn send(&self, frame: Frame) -> Result<()> {
            let failing = self
                .failing_sends
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(NetError::Socket("write failed".into()));
            }
            self.sent.lock().push(frame);
            Ok(())
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    fn quiet() -> WebSocketConfig {
        WebSocketConfig {
            ping_interval: None,
            ..Default::default()
        }
    }

    async fn next<T: 'static>(stream: &mut ChannelStream<T>) -> Option<Result<T>> {
        timeout(Duration::from_secs(1), stream.next()).await.unwrap()
    }

    #[tokio::test]
    async fn test_lazy_connect() {
        let (socket, _events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        tokio::task::yield_now().await;
        assert_eq!(socket.connects.load(Ordering::SeqCst), 0);
        assert_eq!(channel.state(), ChannelState::Idle);

        let _stream = channel.subscribe();
        let _other = channel.subscribe();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(socket.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_map() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket, quiet())
            .map(|data| data.len())
            .try_map(|len| if len > 3 { Err(NetError::InvalidUtf8) } else { Ok(len) });
        let mut stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();
        events.send(SocketEvent::Text("abc".into())).unwrap();
        events.send(SocketEvent::Text("abcd".into())).unwrap();
        assert_eq!(next(&mut stream).await.unwrap().unwrap(), 3);
        assert!(matches!(next(&mut stream).await, Some(Err(NetError::InvalidUtf8))));
    }

    #[tokio::test]
    async fn test_error_finishes_consumers() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        let mut stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();
        events.send(SocketEvent::Error("boom".into())).unwrap();

        match next(&mut stream).await {
            Some(Err(NetError::Socket(message))) => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(next(&mut stream).await.is_none());
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(matches!(channel.send_text("x").await, Err(NetError::NotConnected)));
    }

    #[tokio::test]
    async fn test_slow_consumer_dropped() {
        let (socket, events) = Scripted::new();
        let config = WebSocketConfig {
            ping_interval: None,
            consumer_buffer: 1,
        };
        let channel = WebSocketChannel::new(socket, config);
        let mut slow = channel.subscribe();
        let mut fast = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();

        events.send(SocketEvent::Text("1".into())).unwrap();
        assert_eq!(&next(&mut fast).await.unwrap().unwrap()[..], b"1");
        events.send(SocketEvent::Text("2".into())).unwrap();
        assert_eq!(&next(&mut fast).await.unwrap().unwrap()[..], b"2");

        assert_eq!(&next(&mut slow).await.unwrap().unwrap()[..], b"1");
        assert!(next(&mut slow).await.is_none());
        assert_eq!(channel.state(), ChannelState::Connected);
    }

    #[tokio::test]
    async fn test_send_connects_without_consumers() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        events.send(SocketEvent::Connected).unwrap();
        channel.send_text("hi").await.unwrap();
        channel.send_bytes(vec![1_u8]).await.unwrap();
        assert_eq!(
            *socket.sent.lock(),
            vec![Frame::Text("hi".into()), Frame::Binary(Bytes::from_static(&[1]))]
        );
    }

    #[tokio::test]
    async fn test_send_encodable() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        events.send(SocketEvent::Connected).unwrap();
        channel
            .send_encodable(&serde_json::json!({"b": 1, "a": 2}), &crate::codec::JsonEncoder::default())
            .await
            .unwrap();
        assert_eq!(*socket.sent.lock(), vec![Frame::Text(r#"{"a":2,"b":1}"#.into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_while_subscribed() {
        let (socket, events) = Scripted::new();
        let config = WebSocketConfig {
            ping_interval: Some(Duration::from_secs(15)),
            ..Default::default()
        };
        let channel = WebSocketChannel::new(socket.clone(), config);
        let stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        let pings = socket
            .sent
            .lock()
            .iter()
            .filter(|frame| matches!(frame, Frame::Ping(_)))
            .count();
        assert_eq!(pings, 2);

        drop(stream);
        tokio::time::sleep(Duration::from_secs(60)).await;
        let after = socket
            .sent
            .lock()
            .iter()
            .filter(|frame| matches!(frame, Frame::Ping(_)))
            .count();
        assert_eq!(after, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_survives_failed_write() {
        let (socket, events) = Scripted::new();
        socket.failing_sends.store(1, Ordering::SeqCst);
        let config = WebSocketConfig {
            ping_interval: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let channel = WebSocketChannel::new(socket.clone(), config);
        let _stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let pings = socket
            .sent
            .lock()
            .iter()
            .filter(|frame| matches!(frame, Frame::Ping(_)))
            .count();
        assert_eq!(pings, 9);
    }

    #[tokio::test]
    async fn test_dropping_last_handle_disconnects() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        events.send(SocketEvent::Connected).unwrap();
        channel.send_text("hello").await.unwrap();

        let mapped = channel.map(|data| data.len());
        drop(channel);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!socket.disconnected.load(Ordering::SeqCst));

        drop(mapped);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(socket.disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stream_outlives_handle() {
        let (socket, events) = Scripted::new();
        let mut stream = WebSocketChannel::new(socket.clone(), quiet()).subscribe();
        events.send(SocketEvent::Connected).unwrap();
        events.send(SocketEvent::Text("still here".into())).unwrap();
        assert_eq!(&next(&mut stream).await.unwrap().unwrap()[..], b"still here");
        assert!(!socket.disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_error_delivered_to_full_consumer() {
        let (socket, events) = Scripted::new();
        let config = WebSocketConfig {
            ping_interval: None,
            consumer_buffer: 1,
        };
        let channel = WebSocketChannel::new(socket, config);
        let mut stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();
        events.send(SocketEvent::Text("a".into())).unwrap();
        events.send(SocketEvent::Error("boom".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(&next(&mut stream).await.unwrap().unwrap()[..], b"a");
        match next(&mut stream).await {
            Some(Err(NetError::Socket(message))) => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(next(&mut stream).await.is_none());
    }

    #[tokio::test]
    async fn test_close() {
        let (socket, events) = Scripted::new();
        let channel = WebSocketChannel::new(socket.clone(), quiet());
        let mut stream = channel.subscribe();
        events.send(SocketEvent::Connected).unwrap();
        channel.close();
        assert!(next(&mut stream).await.is_none());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(socket.disconnected.load(Ordering::SeqCst));

        let mut late = channel.subscribe();
        assert!(next(&mut late).await.is_none());
    }
}
