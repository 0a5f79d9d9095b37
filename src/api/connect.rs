//! Connect-protocol client for the Pulsar API.
//!
//! Unary calls are plain JSON POSTs. Server-streaming calls wrap each message
//! in an envelope: one flag byte and a big-endian `u32` length, followed by
//! the JSON payload. Only the first message of a stream is read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::wire::{
    ConnectErrorBody, CreateMonitorRequest, CreateMonitorResponse, DeleteMonitorResponse, Empty,
    EndStreamMessage, GetMonitorStatsResponse, ListMonitorsResponse, MonitorIdRequest,
    SystemStatsResponse,
};
use super::{ApiError, DashboardApi};
use crate::data::{MonitorTarget, ProbeRecord, SystemHistory};

/// Fully qualified name of the monitor service.
pub const SERVICE: &str = "pulsar.v1.MonitorService";

/// Default API address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Envelope flag: payload is compressed.
pub const FLAG_COMPRESSED: u8 = 0x01;

/// Envelope flag: this is the stream's trailing message.
pub const FLAG_END_STREAM: u8 = 0x02;

const ENVELOPE_HEADER_LEN: usize = 5;

/// Largest stream message accepted, in bytes.
pub const MAX_ENVELOPE_LEN: usize = 4 * 1024 * 1024;

/// One enveloped stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub flags: u8,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn is_end_stream(&self) -> bool {
        self.flags & FLAG_END_STREAM != 0
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Frame a payload for a streaming request.
pub fn encode_envelope(flags: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + payload.len());
    out.push(flags);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decode the first envelope in `buf`.
///
/// Returns the envelope and the number of bytes it used, or `None` if `buf`
/// does not yet hold a complete envelope.
pub fn decode_envelope(buf: &[u8]) -> Option<(Envelope, usize)> {
    if buf.len() < ENVELOPE_HEADER_LEN {
        return None;
    }
    let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    let end = ENVELOPE_HEADER_LEN.checked_add(len)?;
    if buf.len() < end {
        return None;
    }
    let envelope = Envelope {
        flags: buf[0],
        payload: buf[ENVELOPE_HEADER_LEN..end].to_vec(),
    };
    Some((envelope, end))
}

/// Reject a buffered envelope whose header claims more than
/// [`MAX_ENVELOPE_LEN`] bytes.
fn check_envelope_len(buf: &[u8]) -> Result<(), ApiError> {
    if buf.len() < ENVELOPE_HEADER_LEN {
        return Ok(());
    }
    let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    if len > MAX_ENVELOPE_LEN {
        return Err(ApiError::Decode(format!(
            "stream message of {} bytes exceeds the {} byte limit",
            len, MAX_ENVELOPE_LEN
        )));
    }
    Ok(())
}

/// HTTP client for `pulsar.v1.MonitorService`.
#[derive(Debug, Clone)]
pub struct ConnectClient {
    client: Client,
    base_url: String,
    stream_timeout: Duration,
}

impl ConnectClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ConnectClientBuilder {
        ConnectClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, SERVICE, method)
    }

    async fn unary<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(method, "Calling API");
        let response = self
            .client
            .post(self.method_url(method))
            .header("Connect-Protocol-Version", "1")
            .json(request)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Open a server stream and decode its first message.
    ///
    /// Returns `Ok(None)` if the stream ends without a message.
    async fn first_message<Req, Resp>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Option<Resp>, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(method, "Opening API stream");
        let body = encode_envelope(0, &serde_json::to_vec(request)?);
        let response = self
            .client
            .post(self.method_url(method))
            .header(CONTENT_TYPE, "application/connect+json")
            .header("Connect-Protocol-Version", "1")
            .timeout(self.stream_timeout)
            .body(body)
            .send()
            .await?;

        let mut response = check_status(response).await?;
        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
            check_envelope_len(&buf)?;
            if let Some((envelope, _)) = decode_envelope(&buf) {
                return decode_stream_message(envelope);
            }
        }

        if buf.is_empty() {
            Ok(None)
        } else {
            Err(ApiError::Decode(format!(
                "stream ended inside an envelope ({} bytes)",
                buf.len()
            )))
        }
    }
}

fn decode_stream_message<Resp: DeserializeOwned>(
    envelope: Envelope,
) -> Result<Option<Resp>, ApiError> {
    if envelope.is_compressed() {
        return Err(ApiError::Unsupported("compressed stream message".to_string()));
    }
    if envelope.is_end_stream() {
        let end: EndStreamMessage = if envelope.payload.is_empty() {
            EndStreamMessage::default()
        } else {
            serde_json::from_slice(&envelope.payload)?
        };
        return match end.error {
            Some(err) => Err(ApiError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(None),
        };
    }
    Ok(Some(serde_json::from_slice(&envelope.payload)?))
}

/// Map a non-success response to an error, preferring the RPC error body.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ConnectErrorBody>(&body) {
        Ok(err) if !err.code.is_empty() => Err(ApiError::Rpc {
            code: err.code,
            message: err.message,
        }),
        _ => Err(ApiError::Status(status.as_u16())),
    }
}

#[async_trait]
impl DashboardApi for ConnectClient {
    async fn list_targets(&self) -> Result<Vec<MonitorTarget>, ApiError> {
        let response: ListMonitorsResponse = self.unary("ListMonitors", &Empty {}).await?;
        Ok(response.monitors)
    }

    async fn target_history(&self, id: &str) -> Result<Vec<ProbeRecord>, ApiError> {
        let response: GetMonitorStatsResponse = self
            .unary("GetMonitorStats", &MonitorIdRequest { monitor_id: id })
            .await?;
        Ok(response.into_records())
    }

    async fn system_history(&self) -> Result<Option<SystemHistory>, ApiError> {
        let first: Option<SystemStatsResponse> =
            self.first_message("GetSystemStats", &Empty {}).await?;
        Ok(first.and_then(|msg| msg.into_history(Local::now())))
    }

    async fn create_target(
        &self,
        url: &str,
        interval_seconds: u32,
    ) -> Result<MonitorTarget, ApiError> {
        let request = CreateMonitorRequest {
            url,
            interval_seconds,
        };
        let response: CreateMonitorResponse = self.unary("CreateMonitor", &request).await?;
        response
            .monitor
            .ok_or_else(|| ApiError::Decode("CreateMonitor returned no monitor".to_string()))
    }

    async fn delete_target(&self, id: &str) -> Result<(), ApiError> {
        let response: DeleteMonitorResponse = self
            .unary("DeleteMonitor", &MonitorIdRequest { monitor_id: id })
            .await?;
        if response.success {
            Ok(())
        } else {
            Err(ApiError::Rpc {
                code: "unknown".to_string(),
                message: format!("monitor {} was not deleted", id),
            })
        }
    }
}

/// Builder for ConnectClient.
#[derive(Debug, Default)]
pub struct ConnectClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    stream_timeout: Option<Duration>,
}

impl ConnectClientBuilder {
    /// Set the API address (default: "http://localhost:8081").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout of unary calls (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set how long to wait for the first stream message (default: 20
    /// seconds, longer than the server's 15 s collection tick).
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ConnectClient, ApiError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ConnectClient {
            client,
            base_url,
            stream_timeout: self.stream_timeout.unwrap_or(Duration::from_secs(20)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn envelope_layout() {
        let framed = encode_envelope(0, b"{}");
        assert_eq!(framed, vec![0, 0, 0, 0, 2, b'{', b'}']);

        let (envelope, used) = decode_envelope(&framed).unwrap();
        assert_eq!(used, 7);
        assert_eq!(envelope.payload, b"{}");
        assert!(!envelope.is_end_stream());
    }

    #[test]
    fn partial_envelope_waits_for_more() {
        let framed = encode_envelope(FLAG_END_STREAM, b"{\"error\":null}");
        assert!(decode_envelope(&framed[..3]).is_none());
        assert!(decode_envelope(&framed[..framed.len() - 1]).is_none());
        let (envelope, _) = decode_envelope(&framed).unwrap();
        assert!(envelope.is_end_stream());
    }

    #[test]
    fn oversized_envelope_is_rejected() {
        let mut header = vec![0u8];
        header.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            check_envelope_len(&header),
            Err(ApiError::Decode(msg)) if msg.contains("exceeds")
        ));

        let fits = encode_envelope(0, &vec![b' '; 64]);
        assert!(check_envelope_len(&fits).is_ok());
        assert!(check_envelope_len(&fits[..2]).is_ok());
    }

    #[tokio::test]
    async fn system_history_stops_on_oversized_envelope() {
        let mut body = vec![0u8];
        body.extend_from_slice(&((MAX_ENVELOPE_LEN as u32) + 1).to_be_bytes());
        body.extend_from_slice(b"{}");
        let (base, server) = serve_once("200 OK", "application/connect+json", body).await;

        let client = ConnectClient::builder().base_url(base).build().unwrap();
        let result = client.system_history().await;
        assert!(matches!(result, Err(ApiError::Decode(msg)) if msg.contains("exceeds")));
        server.await.unwrap();
    }

    #[test]
    fn end_stream_error_becomes_rpc_error() {
        let envelope = Envelope {
            flags: FLAG_END_STREAM,
            payload: br#"{"error":{"code":"internal","message":"db down"}}"#.to_vec(),
        };
        let result: Result<Option<SystemStatsResponse>, _> = decode_stream_message(envelope);
        assert!(matches!(result, Err(ApiError::Rpc { code, .. }) if code == "internal"));
    }

    #[test]
    fn compressed_message_is_rejected() {
        let envelope = Envelope {
            flags: FLAG_COMPRESSED,
            payload: vec![1, 2, 3],
        };
        let result: Result<Option<SystemStatsResponse>, _> = decode_stream_message(envelope);
        assert!(matches!(result, Err(ApiError::Unsupported(_))));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = ConnectClient::builder()
            .base_url("http://api.local:8081/")
            .build()
            .unwrap();
        assert_eq!(
            client.method_url("ListMonitors"),
            "http://api.local:8081/pulsar.v1.MonitorService/ListMonitors"
        );
    }

    /// Serve one canned HTTP response and return the request head.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                content_type,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= split + 4 + length
    }

    #[tokio::test]
    async fn list_targets_over_http() {
        let body = br#"{"monitors":[{"id":"a","url":"http://x.com","intervalSeconds":5,"isActive":true}]}"#;
        let (base, server) = serve_once("200 OK", "application/json", body.to_vec()).await;

        let client = ConnectClient::builder().base_url(base).build().unwrap();
        let targets = client.list_targets().await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].url, "http://x.com");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pulsar.v1.MonitorService/ListMonitors"));
    }

    #[tokio::test]
    async fn system_history_reads_first_envelope() {
        let message = br#"{"cpu":{"history":[5,4]},"memory":{"history":[10,20]}}"#;
        let mut body = encode_envelope(0, message);
        body.extend(encode_envelope(FLAG_END_STREAM, b"{}"));
        let (base, server) = serve_once("200 OK", "application/connect+json", body).await;

        let client = ConnectClient::builder().base_url(base).build().unwrap();
        let history = client.system_history().await.unwrap().unwrap();
        assert_eq!(history.cpu, vec![5.0, 4.0]);
        assert_eq!(history.ram_percent, vec![10.0, 20.0]);

        let request = server.await.unwrap();
        assert!(request.contains("application/connect+json"));
    }

    #[tokio::test]
    async fn rpc_error_body_is_surfaced() {
        let body = br#"{"code":"invalid_argument","message":"bad id"}"#;
        let (base, _server) = serve_once("400 Bad Request", "application/json", body.to_vec()).await;

        let client = ConnectClient::builder().base_url(base).build().unwrap();
        let err = client.target_history("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::Rpc { ref code, .. } if code == "invalid_argument"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ConnectClient::builder()
            .base_url(format!("http://{}", addr))
            .build()
            .unwrap();
        let err = client.list_targets().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error {:?}", err);
    }
}
