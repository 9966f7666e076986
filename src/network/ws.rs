//! Websocket transport.
//!
//! Thin wrapper around `tokio-tungstenite` that hands back split
//! reader/writer halves for use in a `tokio::select!` loop.

use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

use crate::error::NetworkError;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Received websocket message
#[derive(Debug)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Close { code: u16, reason: String },
}

/// Write half of a websocket connection
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    pub async fn send_text(&mut self, text: String) -> Result<(), NetworkError> {
        self.sink
            .send(tungstenite::Message::Text(text))
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()))
    }

    /// Send a normal-closure (1000) close frame and flush
    pub async fn close_normal(&mut self) -> Result<(), NetworkError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed("client closing"),
        };
        self.sink
            .send(tungstenite::Message::Close(Some(frame)))
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
        self.sink
            .close()
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()))
    }
}

/// Read half of a websocket connection
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Next data or close message; `None` when the stream ends.
    ///
    /// Ping/pong and raw frames are handled by tungstenite and skipped here.
    pub async fn recv(&mut self) -> Option<Result<WsMessage, NetworkError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return Some(Ok(WsMessage::Text(text)));
                }
                Some(Ok(tungstenite::Message::Binary(data))) => {
                    return Some(Ok(WsMessage::Binary(data)));
                }
                Some(Ok(tungstenite::Message::Close(close_frame))) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    return Some(Ok(WsMessage::Close { code, reason }));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Some(Err(NetworkError::ReceiveFailed(e.to_string())));
                }
                None => return None,
            }
        }
    }
}

/// Connect to a websocket URL with extra request headers
pub async fn connect(
    url: &str,
    headers: &[(&str, String)],
) -> Result<(WsWriter, WsReader), NetworkError> {
    use tungstenite::client::IntoClientRequest;

    let mut request = url
        .into_client_request()
        .map_err(|e| NetworkError::InvalidEndpoint(format!("{}: {}", url, e)))?;

    for (name, value) in headers {
        let header_name = tungstenite::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NetworkError::InvalidEndpoint(format!("header {}: {}", name, e)))?;
        let header_value = tungstenite::http::HeaderValue::from_str(value)
            .map_err(|e| NetworkError::InvalidEndpoint(format!("header {}: {}", name, e)))?;
        request.headers_mut().insert(header_name, header_value);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}

/// Append the model query parameter to the endpoint URL.
///
/// A URL without a path gets `/` so the request target stays valid.
pub fn endpoint_with_model(url: &str, model: &str) -> String {
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[authority_start..]
        .find(['/', '?', '#'])
        .map(|i| authority_start + i)
        .unwrap_or(url.len());

    let mut endpoint = url.to_string();
    if !url[path_start..].starts_with('/') {
        endpoint.insert(path_start, '/');
    }

    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}model={}", endpoint, separator, model)
}
