//! Authenticated JSON transport shared by the Compute Engine and Cloud Storage clients.

use std::sync::Arc;

use reqwest::{Client as HttpClient, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::auth::TokenProvider;
use super::error::{ApiError, ApiResult};
use crate::constants::HTTP_TIMEOUT;

/// Bearer-authenticated JSON client rooted at one API endpoint.
#[derive(Clone)]
pub struct GoogleHttp {
    base: Url,
    http: HttpClient,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleHttp {
    /// `endpoint` is the API root, e.g. `https://compute.googleapis.com`.
    pub fn new(endpoint: &str, tokens: Arc<dyn TokenProvider>) -> ApiResult<Self> {
        let base = Url::parse(endpoint).map_err(|_| ApiError::InvalidUrl {
            url: endpoint.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: endpoint.to_string(),
            });
        }

        let http = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Ok(Self { base, http, tokens })
    }

    /// Joins percent-encoded path segments onto the endpoint root.
    pub fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| ApiError::InvalidUrl {
                url: self.base.to_string(),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    pub async fn get_json<T>(&self, url: Url, resource: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::GET, url);
        self.send(request, resource).await
    }

    /// POSTs `body` as JSON, or an empty body when `None`.
    pub async fn post_json<B, T>(&self, url: Url, body: Option<&B>, resource: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::POST, url);
        let request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };
        self.send(request, resource).await
    }

    pub async fn delete_json<T>(&self, url: Url, resource: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::DELETE, url);
        self.send(request, resource).await
    }

    async fn send<T>(&self, request: RequestBuilder, resource: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, resource, "Google API call failed");
            return Err(ApiError::from_status(status, resource, &body));
        }

        response.json().await.map_err(|source| ApiError::Decode {
            resource: resource.to_string(),
            source,
        })
    }
}
