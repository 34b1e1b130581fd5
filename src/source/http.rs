//! HTTP page source implementation.
//!
//! Issues `GET <api>/<resource>?page=N` against a JSON REST backend.  The body
//! is an array of [`Incident`]s and the server reports the size of the whole
//! collection in the `x-total-count` response header.

use log::debug;
use reqwest::header::HeaderMap;

use super::{Incident, Page, PageSource};
use crate::error::FetchError;

/// Response header carrying the size of the whole collection.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// A paginated REST resource fetched with [`reqwest`].
pub struct HttpIncidentSource {
    client: reqwest::Client,
    /// Full URL of the resource, e.g. `http://localhost:3333/incidents`.
    url: String,
    label: String,
}

impl HttpIncidentSource {
    /// Create a source for `resource` under the API base URL `api`.
    pub fn new(api: &str, resource: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api, resource)
    }

    pub fn with_client(client: reqwest::Client, api: &str, resource: &str) -> Self {
        let url = format!(
            "{}/{}",
            api.trim_end_matches('/'),
            resource.trim_start_matches('/')
        );
        Self {
            client,
            label: resource.to_string(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Read the collection total from the response headers.
///
/// A missing or non-numeric header is a decode failure: without it the
/// loader cannot tell when pagination is exhausted.
pub fn parse_total(headers: &HeaderMap) -> Result<u64, FetchError> {
    let raw = headers
        .get(TOTAL_COUNT_HEADER)
        .ok_or_else(|| FetchError::Decode(format!("missing {TOTAL_COUNT_HEADER} header")))?;
    let text = raw
        .to_str()
        .map_err(|e| FetchError::Decode(format!("{TOTAL_COUNT_HEADER}: {e}")))?;
    text.trim()
        .parse()
        .map_err(|e| FetchError::Decode(format!("{TOTAL_COUNT_HEADER} {text:?}: {e}")))
}

/// Decode a response body into incidents.
///
/// Pure function (no I/O) so tests can exercise it without a server.
pub fn decode_page(body: &[u8]) -> Result<Vec<Incident>, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}

impl PageSource for HttpIncidentSource {
    type Record = Incident;

    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch_page(&self, page: u32) -> Result<Page<Incident>, FetchError> {
        debug!("GET {} page={page}", self.url);
        let response = self
            .client
            .get(&self.url)
            .query(&[("page", page)])
            .send()
            .await?
            .error_for_status()?;

        let total = parse_total(response.headers())?;
        let body = response.bytes().await?;
        let records = decode_page(&body)?;
        Ok(Page { records, total })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(total: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from_static(total));
        headers
    }

    #[test]
    fn parse_total_reads_header() {
        assert_eq!(parse_total(&headers_with("12")).unwrap(), 12);
        assert_eq!(parse_total(&headers_with(" 0 ")).unwrap(), 0);
    }

    #[test]
    fn parse_total_missing_header_is_decode_error() {
        let err = parse_total(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn parse_total_rejects_garbage() {
        assert!(matches!(
            parse_total(&headers_with("twelve")),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            parse_total(&headers_with("-3")),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn decode_page_keeps_arrival_order() {
        let body = br#"[{"id": 3, "title": "c"}, {"id": 1, "title": "a"}, {"id": 3, "title": "c"}]"#;
        let records = decode_page(body).unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 3], "no sorting, no de-duplication");
    }

    #[test]
    fn decode_page_empty_array() {
        assert!(decode_page(b"[]").unwrap().is_empty());
    }

    #[test]
    fn decode_page_rejects_non_array() {
        assert!(matches!(
            decode_page(br#"{"error": "nope"}"#),
            Err(FetchError::Decode(_))
        ));
    }

    // -- fetch_page against a local server -----------------------------------

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status: &str, headers: &[&str], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {status}\r\n");
        for header in headers {
            response.push_str(header);
            response.push_str("\r\n");
        }
        response.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));
        response
    }

    /// Talks to 127.0.0.1 directly even if a proxy is configured.
    fn local_source(api: &str) -> HttpIncidentSource {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpIncidentSource::with_client(client, api, "incidents")
    }

    /// Accept one connection, answer it with `response`, and hand back the
    /// request line that was received.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn fetch_page_sends_page_query_and_reads_total() {
        let body = r#"[{"id": 11, "title": "a"}, {"id": 12, "title": "b"}]"#;
        let (api, server) = serve_once(http_response(
            "200 OK",
            &["Content-Type: application/json", "X-Total-Count: 12"],
            body,
        ))
        .await;

        let page = local_source(&api)
            .fetch_page(3)
            .await
            .unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![11, 12]);

        let request_line = server.await.unwrap();
        assert!(
            request_line.starts_with("GET /incidents?page=3 "),
            "got {request_line:?}"
        );
    }

    #[tokio::test]
    async fn fetch_page_without_total_header_is_decode_error() {
        let (api, _server) = serve_once(http_response("200 OK", &[], "[]")).await;
        let err = local_source(&api)
            .fetch_page(1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fetch_page_with_malformed_body_is_decode_error() {
        let (api, _server) =
            serve_once(http_response("200 OK", &["x-total-count: 1"], "<html>")).await;
        let err = local_source(&api)
            .fetch_page(1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fetch_page_non_2xx_is_server_error() {
        let (api, _server) = serve_once(http_response(
            "500 Internal Server Error",
            &["x-total-count: 4"],
            "oops",
        ))
        .await;
        let err = local_source(&api)
            .fetch_page(1)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Server { status: 500 });
    }

    #[tokio::test]
    async fn fetch_page_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local_source(&format!("http://{addr}"))
            .fetch_page(1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn new_joins_base_and_resource() {
        let src = HttpIncidentSource::new("http://localhost:3333/", "/incidents");
        assert_eq!(src.url(), "http://localhost:3333/incidents");
        assert_eq!(src.name(), "incidents");
    }
}
