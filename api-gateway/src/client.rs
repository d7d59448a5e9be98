// api-gateway/src/client.rs
use std::sync::Arc;
use std::time::Duration;

use common::{ApiConfig, LocalStorage};
use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::GatewayError;
use crate::interceptors::{self, Navigator};

/// Single point of outbound HTTP communication with the backend
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn LocalStorage>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, storage: Arc<dyn LocalStorage>) -> Result<Self, GatewayError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::other(e.to_string()))?;

        let base_url = Url::parse(&format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.prefix.trim_end_matches('/')
        ))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::other(format!("{} cannot be used as a base URL", base_url)));
        }

        tracing::debug!("API client targeting {}", base_url);

        Ok(Self {
            http,
            base_url,
            storage,
            navigator: None,
        })
    }

    /// Install the hook called after a 401 wiped the stored session
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL. Segments are percent-encoded individually.
    pub fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::other("base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        self.execute(self.http.request(Method::GET, url)).await
    }

    pub(crate) async fn get_with_query<Q, T>(&self, url: Url, query: &Q) -> Result<T, GatewayError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.request(Method::GET, url).query(query)).await
    }

    pub(crate) async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.request(Method::POST, url).json(body)).await
    }

    pub(crate) async fn put<B, T>(&self, url: Url, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.request(Method::PUT, url).json(body)).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), GatewayError> {
        self.dispatch(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.dispatch(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::other(format!("invalid response body: {}", e)))
    }

    /// Run both interceptors around the actual send. No retries.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let builder = interceptors::attach_bearer(builder, self.storage.as_ref());
        let request = builder.build().map_err(GatewayError::from_send)?;
        tracing::debug!("{} {}", request.method(), request.url());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| {
                tracing::warn!("Request failed without response: {}", e);
                GatewayError::from_send(e)
            })?;

        interceptors::inspect_response(response, self.storage.as_ref(), self.navigator.as_deref()).await
    }
}
