//! Garmin Connect implementation of the [`Authenticator`] / [`ActivitySession`]
//! boundary.
//!
//! Login goes through the SSO web form: fetch the sign-in page for its CSRF
//! token, post the credentials, pull the service ticket URL out of the
//! response and follow it so the cookie store holds a Connect session.

use crate::client::{ActivitySession, Authenticator};
use crate::error::DownloaderError;
use crate::types::{Activity, ActivityId, ExportFormat};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_SSO_URL: &str = "https://sso.garmin.com/sso";
pub const DEFAULT_CONNECT_URL: &str = "https://connect.garmin.com";
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub sso_url: String,
    pub connect_url: String,
    pub page_size: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            sso_url: DEFAULT_SSO_URL.to_string(),
            connect_url: DEFAULT_CONNECT_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
            user_agent: concat!("garmin-downloader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConnectConfig {
    pub fn with_urls(sso_url: &str, connect_url: &str) -> Self {
        Self {
            sso_url: sso_url.trim_end_matches('/').to_string(),
            connect_url: connect_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

pub struct GarminConnect {
    config: ConnectConfig,
}

impl GarminConnect {
    pub fn new(config: ConnectConfig) -> Self {
        Self { config }
    }

    fn signin_url(&self) -> String {
        format!("{}/signin", self.config.sso_url)
    }

    fn signin_params(&self) -> Vec<(&'static str, String)> {
        let connect = &self.config.connect_url;
        let service = format!("{connect}/modern/");
        vec![
            ("service", service.clone()),
            ("webhost", connect.clone()),
            ("source", format!("{connect}/signin/")),
            ("redirectAfterAccountLoginUrl", service.clone()),
            ("redirectAfterAccountCreationUrl", service),
            ("gauthHost", self.config.sso_url.clone()),
            ("clientId", "GarminConnect".to_string()),
            ("consumeServiceTicket", "false".to_string()),
            ("embedWidget", "false".to_string()),
        ]
    }
}

#[async_trait]
impl Authenticator for GarminConnect {
    type Session = GarminSession;

    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<GarminSession, DownloaderError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.as_str())
            .build()?;

        let signin_url = self.signin_url();
        let params = self.signin_params();

        debug!("Fetching sign-in page {}", signin_url);
        let page = client.get(&signin_url).query(&params).send().await?;
        let page = ensure_success(page)?.text().await?;
        let csrf = extract_csrf(&page).ok_or_else(|| {
            DownloaderError::InvalidResponse("sign-in page carried no CSRF token".into())
        })?;

        debug!("Submitting credentials for {}", username);
        let resp = client
            .post(&signin_url)
            .query(&params)
            .header(reqwest::header::REFERER, signin_url.as_str())
            .form(&[
                ("username", username),
                ("password", password.expose_secret()),
                ("embed", "true"),
                ("_csrf", csrf.as_str()),
            ])
            .send()
            .await?;
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(DownloaderError::Authentication(format!(
                "credentials rejected (HTTP {})",
                resp.status().as_u16()
            )));
        }
        let body = ensure_success(resp)?.text().await?;
        let ticket_url = extract_ticket_url(&body).ok_or_else(|| {
            DownloaderError::Authentication("sign-in returned no service ticket".into())
        })?;

        debug!("Exchanging service ticket");
        ensure_success(client.get(&ticket_url).send().await?)?;
        info!("Garmin Connect session established for {}", username);

        Ok(GarminSession {
            client,
            connect_url: self.config.connect_url.clone(),
            page_size: self.config.page_size.max(1),
        })
    }
}

pub struct GarminSession {
    client: reqwest::Client,
    connect_url: String,
    page_size: usize,
}

impl GarminSession {
    fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).header("NK", "NT")
    }

    fn download_url(&self, activity_id: &ActivityId, format: ExportFormat) -> String {
        let base = format!("{}/modern/proxy/download-service", self.connect_url);
        match format {
            ExportFormat::Gpx => format!("{base}/export/gpx/activity/{activity_id}"),
            ExportFormat::Tcx => format!("{base}/export/tcx/activity/{activity_id}"),
            ExportFormat::Original => format!("{base}/files/activity/{activity_id}"),
        }
    }
}

#[async_trait]
impl ActivitySession for GarminSession {
    async fn activities_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Activity>, DownloaderError> {
        let url = format!(
            "{}/modern/proxy/activitylist-service/activities/search/activities",
            self.connect_url
        );
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();
        let mut activities = Vec::new();

        loop {
            let offset = activities.len();
            let resp = self
                .get(&url)
                .query(&[
                    ("startDate", start_date.clone()),
                    ("endDate", end_date.clone()),
                    ("start", offset.to_string()),
                    ("limit", self.page_size.to_string()),
                ])
                .send()
                .await?;
            let page: Vec<Activity> = ensure_success(resp)?.json().await?;
            debug!("Activity page at offset {} returned {} entries", offset, page.len());

            let page_len = page.len();
            activities.extend(page);
            if page_len < self.page_size {
                break;
            }
        }

        Ok(activities)
    }

    async fn download_activity(
        &self,
        activity_id: &ActivityId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DownloaderError> {
        let url = self.download_url(activity_id, format);
        debug!("Downloading {}", url);
        let resp = self.get(&url).send().await?;
        let bytes = ensure_success(resp)?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn ensure_success(resp: Response) -> Result<Response, DownloaderError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(DownloaderError::HttpStatus {
            status: resp.status().as_u16(),
            url: resp.url().to_string(),
        })
    }
}

fn extract_csrf(page: &str) -> Option<String> {
    static CSRF: OnceLock<Regex> = OnceLock::new();
    let re = CSRF.get_or_init(|| {
        Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("csrf pattern is valid")
    });
    re.captures(page).map(|c| c[1].to_string())
}

fn extract_ticket_url(body: &str) -> Option<String> {
    static TICKET: OnceLock<Regex> = OnceLock::new();
    let re = TICKET.get_or_init(|| {
        Regex::new(r#""(https?:[^"]+?ticket=[^"]+)""#).expect("ticket pattern is valid")
    });
    re.captures(body).map(|c| c[1].replace("\\/", "/"))
}
