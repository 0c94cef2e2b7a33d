use futures::StreamExt;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL } };
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use super::sse::SseDecoder;
use super::{ Connector, EventStream };
use crate::error::{ ConfigError, TransportError };
use crate::models::events::{ PushEvent, TransportEvent };

/// Opens `GET <endpoint>?question=...` as a `text/event-stream`.
#[derive(Clone)]
pub struct HttpConnector {
    http: HttpClient,
    endpoint: Url,
    idle_timeout: Option<Duration>,
}

impl HttpConnector {
    pub fn new(
        server_url: &str,
        stream_path: &str,
        idle_timeout: Option<Duration>
    ) -> Result<Self, ConfigError> {
        let base = Url::parse(server_url).map_err(|source| ConfigError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::NotABase(server_url.to_string()));
        }
        let mut endpoint = base;
        endpoint.set_path(stream_path);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http, endpoint, idle_timeout })
    }

    pub fn stream_url(&self, question: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("question", question);
        url
    }
}

impl Connector for HttpConnector {
    fn open(&self, question: &str) -> EventStream {
        let (tx, rx) = mpsc::channel(32);
        let http = self.http.clone();
        let url = self.stream_url(question);
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            tokio::select! {
                _ = tx.closed() => debug!("Stream receiver dropped; abandoning request"),
                result = pump_events(http, url, idle_timeout, &tx) => {
                    if let Err(e) = result {
                        warn!("Push stream failed: {}", e);
                        let _ = tx.send(TransportEvent::Failure(e.to_string())).await;
                    }
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

/// Forwards decoded events until the server ends the body or the receiver goes
/// away. A clean end of body returns `Ok`; the caller sees the stream end.
async fn pump_events(
    http: HttpClient,
    url: Url,
    idle_timeout: Option<Duration>,
    tx: &mpsc::Sender<TransportEvent>
) -> Result<(), TransportError> {
    info!("Opening push stream: {}", url);
    let resp = http.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(TransportError::Status(resp.status()));
    }
    if tx.send(TransportEvent::Connected).await.is_err() {
        return Ok(());
    }

    let body = resp.bytes_stream();
    tokio::pin!(body);
    let mut decoder = SseDecoder::new();

    loop {
        let next = match idle_timeout {
            Some(limit) =>
                tokio::time::timeout(limit, body.next()).await
                    .map_err(|_| TransportError::IdleTimeout(limit))?,
            None => body.next().await,
        };
        let chunk = match next {
            Some(chunk) => chunk?,
            None => {
                debug!("Push stream body ended");
                return Ok(());
            }
        };
        for sse in decoder.feed(&chunk) {
            let name = sse.event.clone();
            match PushEvent::from_sse(sse) {
                Some(event) => {
                    if tx.send(TransportEvent::Event(event)).await.is_err() {
                        return Ok(());
                    }
                }
                None => debug!("Ignoring unrecognized event type '{}'", name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_url_encoded() {
        let connector = HttpConnector::new("http://127.0.0.1:8000", "/api/chat/stream", None).unwrap();
        let url = connector.stream_url("What is X? & why");
        assert_eq!(url.path(), "/api/chat/stream");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("question".to_string(), "What is X? & why".to_string())]);
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn stream_url_keeps_only_current_question() {
        let connector = HttpConnector::new("http://localhost:8000/", "/api/chat/stream", None).unwrap();
        connector.stream_url("first");
        let url = connector.stream_url("second");
        assert_eq!(url.query(), Some("question=second"));
    }

    #[test]
    fn rejects_invalid_server_url() {
        assert!(matches!(
            HttpConnector::new("not a url", "/api/chat/stream", None),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpConnector::new("mailto:someone@example.com", "/api/chat/stream", None),
            Err(ConfigError::NotABase(_))
        ));
    }
}
