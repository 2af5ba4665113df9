//! Evidence hosting on Imgur (anonymous uploads keyed by client id)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};
use vigil_core::{Evidence, PublishedEvidence};

use crate::config::ImgurConfig;
use crate::error::{ActionError, Result};

const API_BASE: &str = "https://api.imgur.com/3";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    link: String,
    deletehash: String,
}

#[derive(Clone)]
pub struct ImgurClient {
    client: Client,
    client_id: String,
}

impl ImgurClient {
    pub fn new(client: Client, config: ImgurConfig) -> Self {
        Self {
            client,
            client_id: config.client_id,
        }
    }

    fn authorization(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }

    /// Extract the public link and delete token from an upload response
    pub fn parse_upload(body: &[u8]) -> Result<PublishedEvidence> {
        let parsed: UploadResponse =
            serde_json::from_slice(body).map_err(|source| ActionError::Response {
                service: "Imgur",
                source,
            })?;
        Ok(PublishedEvidence {
            link: parsed.data.link,
            delete_token: parsed.data.deletehash,
        })
    }

    pub async fn upload(&self, evidence: &Evidence) -> Result<PublishedEvidence> {
        let image = STANDARD.encode(tokio::fs::read(&evidence.path).await?);
        let response = self
            .client
            .post(format!("{}/image", API_BASE))
            .header(AUTHORIZATION, self.authorization())
            .form(&[("image", image.as_str()), ("type", "base64")])
            .send()
            .await?;

        let body = check(response).await?.bytes().await?;
        let published = Self::parse_upload(&body)?;
        info!("Evidence uploaded to {}", published.link);
        Ok(published)
    }

    pub async fn delete(&self, delete_token: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/image/{}", API_BASE, delete_token))
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?;
        check(response).await?;
        debug!("Remote evidence deleted");
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ActionError::Api {
        service: "Imgur",
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}
