use super::{Frame, Socket, SocketEvent};
use crate::error::{NetError, Result};
use crate::protocol::websocket_url;
use crate::types::HttpRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, SplitSink};
use futures::{future, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Sink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// [`Socket`] over `tokio-tungstenite`.
///
/// `http`/`https` URLs are rewritten to `ws`/`wss`. Request headers are sent
/// with the upgrade request.
pub struct TungsteniteSocket {
    request: HttpRequest,
    sink: Mutex<Option<Sink>>,
}

impl TungsteniteSocket {
    /// Socket that will connect to `request.url`.
    pub fn new(request: HttpRequest) -> Self {
        TungsteniteSocket {
            request,
            sink: Mutex::new(None),
        }
    }
}

fn event(message: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>) -> Option<SocketEvent> {
    match message {
        Ok(Message::Text(text)) => Some(SocketEvent::Text(text)),
        Ok(Message::Binary(data)) => Some(SocketEvent::Binary(Bytes::from(data))),
        Ok(Message::Ping(_)) => Some(SocketEvent::Ping),
        Ok(Message::Pong(_)) => Some(SocketEvent::Pong),
        Ok(Message::Close(_)) => Some(SocketEvent::PeerClosed),
        Ok(Message::Frame(_)) => None,
        Err(err) => Some(SocketEvent::Error(err.to_string())),
    }
}

#[async_trait]
impl Socket for TungsteniteSocket {
    async fn connect(&self) -> Result<BoxStream<'static, SocketEvent>> {
        let url = websocket_url(&self.request.url);
        let mut upgrade = url.as_str().into_client_request()?;
        for (name, value) in &self.request.headers {
            upgrade.headers_mut().append(name.clone(), value.clone());
        }

        let (socket, _response) = connect_async(upgrade).await?;
        let (sink, stream) = socket.split();
        *self.sink.lock().await = Some(sink);

        let events = stream.filter_map(|message| future::ready(event(message)));
        Ok(stream::once(future::ready(SocketEvent::Connected))
            .chain(events)
            .chain(stream::once(future::ready(SocketEvent::Disconnected)))
            .boxed())
    }

    async fn send(&self, frame: Frame) -> Result<()> {
        let mut sink = self.sink.lock().await;
        let sink = sink.as_mut().ok_or(NetError::NotConnected)?;
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data.to_vec()),
            Frame::Ping(data) => Message::Ping(data.to_vec()),
        };
        sink.send(message).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(err) = sink.close().await {
                tracing::debug!("Socket close failed: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn test_send_before_connect() {
        let socket = TungsteniteSocket::new(HttpRequest::new(Url::parse("https://example.com/ws").unwrap()));
        assert!(matches!(
            socket.send(Frame::Text("x".into())).await,
            Err(NetError::NotConnected)
        ));
        socket.disconnect().await;
    }

    #[test]
    fn test_event_mapping() {
        assert_eq!(event(Ok(Message::Text("a".into()))), Some(SocketEvent::Text("a".into())));
        assert_eq!(event(Ok(Message::Close(None))), Some(SocketEvent::PeerClosed));
        assert_eq!(
            event(Ok(Message::Binary(vec![1]))),
            Some(SocketEvent::Binary(Bytes::from_static(&[1])))
        );
    }
}
