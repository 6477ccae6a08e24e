//! REST tester.

use reqwest::Method;

/// Issues REST requests against the server's HTTP base address.
pub struct ApiTester {
    http: reqwest::Client,
    base: String,
}

impl ApiTester {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: http_base(base),
        }
    }

    /// Sends `method path` and renders the response body.
    ///
    /// JSON bodies are pretty-printed; anything else (including transport
    /// errors) is returned as plain text.
    pub async fn request(&self, method: Method, path: &str) -> String {
        let url = format!("{}{path}", self.base);
        tracing::debug!(%method, %url, "REST request");

        let response = match self.http.request(method, &url).send().await {
            Ok(r) => r,
            Err(e) => return format!("request to {url} failed: {e}"),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return format!("failed to read response from {url}: {e}"),
        };

        let rendered = match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(body),
            Err(_) => body,
        };
        format!("{status}\n{rendered}")
    }
}

/// Maps a WebSocket or bare address to its HTTP base.
fn http_base(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    match base.split_once("://") {
        Some(("wss", rest)) | Some(("https", rest)) => format!("https://{rest}"),
        Some((_, rest)) => format!("http://{rest}"),
        None => format!("http://{base}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_base_maps_schemes() {
        assert_eq!(http_base("http://localhost:3000/"), "http://localhost:3000");
        assert_eq!(http_base("ws://localhost:3000"), "http://localhost:3000");
        assert_eq!(http_base("wss://example.com"), "https://example.com");
        assert_eq!(http_base("127.0.0.1:3000"), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn unreachable_server_reports_error() {
        let api = ApiTester::new("http://127.0.0.1:1");
        let out = api.request(Method::GET, "/api/hello").await;
        assert!(out.starts_with("request to http://127.0.0.1:1/api/hello failed"));
    }
}
