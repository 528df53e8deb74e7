use super::Transport;
use super::protocol::{ENDPOINT_EVENT, ENDPOINT_INVOKE, InvokeRequest, InvokeResponse};
use crate::cluster::{ClusterTopology, MemberId};
use crate::config::ServiceConfig;
use crate::error::{MultiMapError, Result};
use crate::multimap::listener::EntryEvent;
use crate::multimap::operation::OpResponse;
use crate::serialization::Datum;

use async_trait::async_trait;
use std::time::Duration;

pub struct HttpTransport {
    topology: ClusterTopology,
    http_client: reqwest::Client,
    timeout: Duration,
    read_attempts: usize,
    write_attempts: usize,
}

impl HttpTransport {
    pub fn new(topology: ClusterTopology, config: &ServiceConfig) -> Self {
        Self {
            topology,
            http_client: reqwest::Client::new(),
            timeout: config.request_timeout,
            read_attempts: config.read_attempts.max(1),
            write_attempts: config.write_attempts.max(1),
        }
    }

    fn url(&self, target: &MemberId, endpoint: &str) -> Result<String> {
        let member = self
            .topology
            .get_member(target)
            .ok_or_else(|| MultiMapError::UnknownMember(target.to_string()))?;
        Ok(format!("http://{}{}", member.http_addr, endpoint))
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(e.into());
                    }
                    tracing::debug!("POST {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(MultiMapError::Transport("Retry attempts exhausted".to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, target: &MemberId, request: InvokeRequest) -> Result<OpResponse> {
        let url = self.url(target, ENDPOINT_INVOKE)?;
        let attempts = match (request.is_retry_safe(), request.operation.is_mutating()) {
            (false, _) => 1,
            (true, true) => self.write_attempts,
            (true, false) => self.read_attempts,
        };

        let response = self.post_with_retry(url, &request, attempts).await?;
        let status = response.status();

        // Errors raised by the owner come back as a body with a non-2xx status
        let body: InvokeResponse = response.json().await.map_err(|e| {
            MultiMapError::Transport(format!(
                "unreadable response from {} ({}): {}",
                target, status, e
            ))
        })?;

        body.into_result()
    }

    async fn publish(&self, target: &MemberId, event: EntryEvent<Datum, Datum>) -> Result<()> {
        let url = self.url(target, ENDPOINT_EVENT)?;
        let response = self.post_with_retry(url, &event, 1).await?;

        if !response.status().is_success() {
            return Err(MultiMapError::Remote(format!(
                "event publish to {} failed: {}",
                target,
                response.status()
            )));
        }
        Ok(())
    }
}
