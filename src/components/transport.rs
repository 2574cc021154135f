use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {reason}")]
    Failed { url: String, reason: String },
}

/// Connect and read timeouts of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Blocking HTTP access to the catalog.
pub trait Transport: Debug {
    /// `GET url`, without a timeout.
    fn get(&self, url: &str) -> Result<Response, TransportError>;
    /// `POST url` with a JSON body.
    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeouts: &Timeouts,
    ) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        (**self).get(url)
    }

    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeouts: &Timeouts,
    ) -> Result<Response, TransportError> {
        (**self).post_json(url, body, timeouts)
    }
}

/// Implementations for reqwest
pub mod reqwest_backend {
    use super::*;
    use log::debug;
    use reqwest::blocking::{Client, Response as ReqwestResponse};

    fn transport_error(url: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Failed {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }

    fn read_response(url: &str, response: ReqwestResponse) -> Result<Response, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| transport_error(url, e))?
            .to_vec();
        debug!("{url} answered {status} with {} bytes", body.len());
        Ok(Response { status, body })
    }

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, TransportError> {
            let client = Client::builder()
                .timeout(None::<Duration>)
                .build()
                .map_err(|e| transport_error("<client>", e))?;
            Ok(Self { client })
        }
    }

    impl Transport for ReqwestTransport {
        fn get(&self, url: &str) -> Result<Response, TransportError> {
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| transport_error(url, e))?;
            read_response(url, response)
        }

        fn post_json(
            &self,
            url: &str,
            body: &serde_json::Value,
            timeouts: &Timeouts,
        ) -> Result<Response, TransportError> {
            // reqwest only exposes a connect timeout per client, so searches get their own.
            let client = Client::builder()
                .connect_timeout(timeouts.connect)
                .timeout(timeouts.connect + timeouts.read)
                .build()
                .map_err(|e| transport_error(url, e))?;
            let response = client
                .post(url)
                .json(body)
                .send()
                .map_err(|e| transport_error(url, e))?;
            read_response(url, response)
        }
    }
}
