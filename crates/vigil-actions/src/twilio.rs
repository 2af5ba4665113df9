//! SMS/MMS alerts through the Twilio REST API

use reqwest::Client;
use tracing::info;

use crate::config::TwilioConfig;
use crate::error::{ActionError, Result};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(client: Client, config: TwilioConfig) -> Self {
        Self { client, config }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            API_BASE, self.config.account_sid
        )
    }

    /// Form fields for a message; `MediaUrl` turns it into an MMS
    pub fn form(&self, body: &str, media: Option<&str>) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("From", self.config.from.clone()),
            ("To", self.config.to.clone()),
            ("Body", body.to_string()),
        ];
        if let Some(url) = media {
            form.push(("MediaUrl", url.to_string()));
        }
        form
    }

    pub async fn send(&self, body: &str, media: Option<&str>) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&self.form(body, media))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::Api {
                service: "Twilio",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        info!("Alert sent to {}", self.config.to);
        Ok(())
    }
}
