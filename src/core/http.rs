use crate::error::Result;
use std::io::Read;
use std::time::Duration;

const USER_AGENT: &str = concat!("qdata/", env!("CARGO_PKG_VERSION"));

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    /// Declared `Content-Length`, if the server sent one.
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

/// Blocking GET requests, following redirects.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send()?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
