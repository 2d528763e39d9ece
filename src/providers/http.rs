use super::RateFetcher;
use crate::core::config::{MyfinProviderConfig, ProvidersConfig, TwelvedataProviderConfig};
use crate::core::{DataSource, FetchError, FetchResult, HttpMethod, RatePayload};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MyfinRequest<'a> {
    city: &'a str,
    include_online: bool,
    availability: &'a str,
}

/// Error envelope twelvedata sends with an HTTP 200 status.
#[derive(Debug, Deserialize)]
struct TwelvedataErrorBody {
    status: String,
    code: Option<u16>,
    message: Option<String>,
}

/// reqwest-backed client for every [`DataSource`].
pub struct HttpRateClient {
    client: reqwest::Client,
    myfin: MyfinProviderConfig,
    twelvedata: TwelvedataProviderConfig,
}

impl HttpRateClient {
    pub fn new(providers: &ProvidersConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("rateboard/1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            myfin: providers.myfin.clone(),
            twelvedata: providers.twelvedata.clone(),
        })
    }

    fn endpoint(&self, source: DataSource) -> String {
        let base_url = match source {
            DataSource::Myfin => &self.myfin.base_url,
            DataSource::Twelvedata => &self.twelvedata.base_url,
        };
        format!("{}{}", base_url.trim_end_matches('/'), source.path())
    }

    fn build_request(&self, source: DataSource) -> Result<RequestBuilder, FetchError> {
        let endpoint = self.endpoint(source);
        let url = match source {
            DataSource::Myfin => Url::parse(&endpoint),
            DataSource::Twelvedata => {
                let outputsize = self.twelvedata.outputsize.to_string();
                let mut params = vec![
                    ("symbol", self.twelvedata.symbol.as_str()),
                    ("interval", self.twelvedata.interval.as_str()),
                    ("outputsize", outputsize.as_str()),
                ];
                if let Some(key) = &self.twelvedata.api_key {
                    params.push(("apikey", key.as_str()));
                }
                Url::parse_with_params(&endpoint, &params)
            }
        }
        .map_err(|e| FetchError::transport(format!("Invalid endpoint {endpoint}: {e}")))?;

        let method = match source.method() {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut request = self.client.request(method, url);
        for (name, value) in source.headers() {
            request = request.header(*name, *value);
        }

        if source == DataSource::Myfin {
            request = request.json(&MyfinRequest {
                city: &self.myfin.city,
                include_online: self.myfin.include_online,
                availability: &self.myfin.availability,
            });
        }
        Ok(request)
    }
}

fn api_error(source: DataSource, body: &[u8]) -> Option<FetchError> {
    if source != DataSource::Twelvedata {
        return None;
    }
    let envelope: TwelvedataErrorBody = serde_json::from_slice(body).ok()?;
    (envelope.status == "error").then(|| FetchError::Transport {
        status: envelope.code,
        message: envelope
            .message
            .unwrap_or_else(|| "Unknown API error".to_string()),
    })
}

#[async_trait]
impl RateFetcher for HttpRateClient {
    #[instrument(name = "RateFetch", skip(self), fields(source = %source))]
    async fn fetch(&self, source: DataSource) -> FetchResult {
        let request = self.build_request(source)?;
        debug!(
            "Requesting rates with {} {}",
            source.method().as_str(),
            self.endpoint(source)
        );

        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, "Received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transport {
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let body = response.bytes().await?;
        if let Some(err) = api_error(source, &body) {
            return Err(err);
        }

        match RatePayload::decode(source, &body) {
            Ok(payload) => Ok(payload),
            Err(e) => {
                error!(
                    error = ?e,
                    response = %String::from_utf8_lossy(&body),
                    "Failed to parse rates response"
                );
                Err(e.into())
            }
        }
    }
}
