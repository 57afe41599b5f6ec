//! Synchronous image submission client: one file, one POST, one printed
//! result.

use std::{io::Write, path::Path};

use tracing::debug;

use crate::{
    error::ClientError,
    payload::{self, DescribeRequest, DescriptionResult},
};

pub const DEFAULT_ENDPOINT: &str =
    "https://multimodal-internvl2-5-78b--web-process-image.modal.run";

pub struct DescriptionClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl DescriptionClient {
    /// Waits as long as the server takes to answer; requests are never
    /// retried.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder().timeout(None).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn submit(&self, image_data: String) -> Result<DescriptionResult, ClientError> {
        debug!(endpoint = %self.endpoint, bytes = image_data.len(), "submitting image");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&DescribeRequest { image_data })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status != reqwest::StatusCode::OK {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        parse_description(&body)
    }
}

fn parse_description(body: &str) -> Result<DescriptionResult, ClientError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("body is not JSON: {e}")))?;
    let description = value
        .get("description")
        .ok_or_else(|| ClientError::MalformedResponse("missing 'description' field".into()))?
        .as_str()
        .ok_or_else(|| {
            ClientError::MalformedResponse("'description' is not a string".into())
        })?;
    Ok(DescriptionResult {
        description: description.to_string(),
    })
}

/// Encodes `image` and submits it. Local failures return before any request
/// is made.
pub fn describe(image: &Path, endpoint: &str) -> Result<DescriptionResult, ClientError> {
    let image_data = payload::encode(image)?;
    DescriptionClient::new(endpoint)?.submit(image_data)
}

/// Writes the human-readable outcome of [`describe`].
pub fn report<W: Write>(
    outcome: &Result<DescriptionResult, ClientError>,
    out: &mut W,
) -> std::io::Result<()> {
    match outcome {
        Ok(result) => {
            writeln!(out, "Image Description:")?;
            writeln!(out, "{}", result.description)
        }
        Err(err @ ClientError::Remote { body, .. }) => {
            writeln!(out, "Error: {err}")?;
            writeln!(out, "{body}")
        }
        Err(err) => writeln!(out, "Error: {err}"),
    }
}
