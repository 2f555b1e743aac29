//! HTTP transport for backend calls.
//!
//! A thin wrapper over `reqwest` that applies bearer auth, the per-call
//! timeout and the optional proxy, and classifies failures into
//! [`GenerationError`] variants.

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{ConfigError, GenerationError};

/// Syscall reported for host resolution failures.
const DNS_SYSCALL: &str = "getaddrinfo";

/// Messages resolvers put in the error chain when a host cannot be resolved.
const DNS_FAILURE_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "temporary failure in name resolution",
];

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with the given timeout and optional proxy URL.
    ///
    /// Only an explicitly configured proxy is used; proxy environment
    /// variables are ignored.
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let builder = Client::builder();
        let builder = match proxy {
            Some(url) => {
                let proxy =
                    reqwest::Proxy::all(url).map_err(|source| ConfigError::InvalidProxy {
                        url: url.to_string(),
                        source,
                    })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };
        let client = builder.build().map_err(ConfigError::HttpClient)?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET` a JSON document.
    pub async fn get_json<T>(&self, url: &str, api_key: &str) -> Result<T, GenerationError>
    where
        T: DeserializeOwned,
    {
        debug!("GET {}", url);
        self.send(self.client.get(url), url, api_key).await
    }

    /// `POST` a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<T, GenerationError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        self.send(self.client.post(url).json(body), url, api_key).await
    }

    async fn send<T>(
        &self,
        request: RequestBuilder,
        url: &str,
        api_key: &str,
    ) -> Result<T, GenerationError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .bearer_auth(api_key)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_error(&e, url, self.timeout))?;

        let status = response.status();
        trace!("Response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(&e, url, self.timeout))?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GenerationError::Decode(e.to_string()))
    }
}

/// Map a `reqwest` failure onto the generation error taxonomy.
fn classify_error(err: &reqwest::Error, url: &str, timeout: Duration) -> GenerationError {
    let host = host_of(url);

    if err.is_timeout() {
        return GenerationError::Timeout { host, timeout };
    }

    if is_dns_failure(err) {
        return GenerationError::HostNotFound {
            host,
            syscall: DNS_SYSCALL.to_string(),
        };
    }

    GenerationError::Request(error_chain(err))
}

/// Whether any error in the source chain reports a host resolution failure.
pub(crate) fn is_dns_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if DNS_FAILURE_MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::io;

    #[derive(Debug)]
    struct ConnectError {
        source: io::Error,
    }

    impl fmt::Display for ConnectError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl StdError for ConnectError {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_dns_failure_found_in_source_chain() {
        let err = ConnectError {
            source: io::Error::other("failed to lookup address information: Name or service not known"),
        };
        assert!(is_dns_failure(&err));
    }

    #[test]
    fn test_connection_refused_is_not_dns() {
        let err = ConnectError {
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused"),
        };
        assert!(!is_dns_failure(&err));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = ConnectError {
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused"),
        };
        assert_eq!(error_chain(&err), "client error (Connect): Connection refused");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://api.mistral.ai/v1/models"), "api.mistral.ai");
        assert_eq!(host_of("not a url"), "not a url");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = HttpTransport::new(Duration::ZERO, None);
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let result = HttpTransport::new(Duration::from_secs(1), Some("http://[bad"));
        assert!(matches!(result, Err(ConfigError::InvalidProxy { .. })));
    }
}
