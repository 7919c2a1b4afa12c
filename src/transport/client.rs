use async_trait::async_trait;
use http::Method;
use reqwest::Client;

use super::{HttpTransport, TransportError, TransportResponse};
use crate::config::TransportConfig;

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, url: &str, method: Method) -> Result<TransportResponse, TransportError> {
        let resp = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let mut out = TransportResponse::new(resp.status().as_u16());
        for (name, value) in resp.headers() {
            if let Ok(value) = value.to_str() {
                out = out.with_header(name.as_str(), value);
            }
        }

        out.body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(out)
    }

    #[inline]
    fn name(&self) -> &'static str {
        "reqwest"
    }
}
