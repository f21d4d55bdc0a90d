use crate::{
    data::{RequestData, ResponseData},
    error::Error,
};
use async_trait::async_trait;
use hyper::{
    body,
    header::{HeaderName, HeaderValue, HOST},
    Body, HeaderMap, Request,
};
use hyper_tls::HttpsConnector;
use std::{collections::HashMap, fmt::Debug};
use url::Url;

/// Sends replayed requests to the provider under test.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    /// `request_data.uri` is appended to `base_url`.
    async fn make_request(
        &self,
        base_url: &str,
        request_data: &RequestData,
    ) -> Result<ResponseData, Error>;
}

pub(crate) fn join_url(base_url: &str, uri: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), uri))?)
}

/// The replayed request headers, without `Host` which the client derives from the URL.
fn request_headers(request_data: &RequestData) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    for (name, value) in &request_data.headers {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        if name != HOST {
            headers.append(name, HeaderValue::from_str(value)?);
        }
    }

    Ok(headers)
}

/// Response headers by lowercase name. Repeated headers are joined with ", " and values that
/// are not visible ASCII are dropped.
fn response_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();

    for (name, value) in header_map {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }

    headers
}

#[derive(Debug, Default)]
pub struct HyperHttpClient {}

impl HyperHttpClient {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn make_request(
        &self,
        base_url: &str,
        request_data: &RequestData,
    ) -> Result<ResponseData, Error> {
        let url = join_url(base_url, &request_data.uri)?;
        let mut request_builder = Request::builder()
            .uri(url.as_str())
            .method(request_data.method.as_str());

        if let Some(headers_mut) = request_builder.headers_mut() {
            headers_mut.extend(request_headers(request_data)?);
        }

        let request: Request<Body> = request_builder.body(request_data.body.clone().into())?;

        let client = hyper::Client::builder().build::<_, Body>(HttpsConnector::new());

        let response = client.request(request).await?;

        let status_code = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = body::to_bytes(response.into_body()).await?;
        let body: String = String::from_utf8_lossy(&body).into();

        Ok(ResponseData {
            status_code,
            body,
            headers,
        })
    }
}
