//! Scripted collaborators for unit tests.
#![cfg(test)]

use crate::client::{ActivitySession, Authenticator};
use crate::error::DownloaderError;
use crate::types::{Activity, ActivityId, ExportFormat};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

/// Build an in-memory stored ZIP archive.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// `count` activities with ids 1..=count, one day apart from 2024-01-01.
pub fn numbered_activities(count: u64) -> Vec<Activity> {
    (1..=count)
        .map(|i| {
            let start = format!("2024-01-{:02} 08:00:00", i.min(28));
            let name = format!("Activity {i}");
            Activity::new(i, Some(name.as_str()), Some(start.as_str()))
        })
        .collect()
}

#[derive(Default)]
pub struct FakeSession {
    activities: Vec<Activity>,
    payloads: HashMap<ActivityId, Vec<u8>>,
    default_payload: Vec<u8>,
    failing: HashSet<ActivityId>,
    fail_listing: bool,
    downloads: Mutex<Vec<(ActivityId, ExportFormat)>>,
    listings: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl FakeSession {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self {
            activities,
            default_payload: b"<gpx/>".to_vec(),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.default_payload = payload;
        self
    }

    pub fn with_payload_for(mut self, id: impl Into<ActivityId>, payload: Vec<u8>) -> Self {
        self.payloads.insert(id.into(), payload);
        self
    }

    pub fn failing_on(mut self, id: impl Into<ActivityId>) -> Self {
        self.failing.insert(id.into());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn requested_formats(&self) -> Vec<ExportFormat> {
        self.downloads.lock().unwrap().iter().map(|(_, f)| *f).collect()
    }

    pub fn downloaded_ids(&self) -> Vec<ActivityId> {
        self.downloads.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn listings(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.listings.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySession for FakeSession {
    async fn activities_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Activity>, DownloaderError> {
        self.listings.lock().unwrap().push((start, end));
        if self.fail_listing {
            return Err(DownloaderError::HttpStatus {
                status: 500,
                url: "fake://activities".into(),
            });
        }
        Ok(self.activities.clone())
    }

    async fn download_activity(
        &self,
        activity_id: &ActivityId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DownloaderError> {
        self.downloads
            .lock()
            .unwrap()
            .push((activity_id.clone(), format));
        if self.failing.contains(activity_id) {
            return Err(DownloaderError::HttpStatus {
                status: 503,
                url: format!("fake://download/{activity_id}"),
            });
        }
        Ok(self
            .payloads
            .get(activity_id)
            .cloned()
            .unwrap_or_else(|| self.default_payload.clone()))
    }
}

pub enum LoginOutcome {
    Accept,
    Reject,
    Unreachable,
}

pub struct FakeAuthenticator {
    session: Arc<FakeSession>,
    outcome: LoginOutcome,
}

impl FakeAuthenticator {
    pub fn new(session: FakeSession, outcome: LoginOutcome) -> Self {
        Self {
            session: Arc::new(session),
            outcome,
        }
    }

    pub fn session(&self) -> &FakeSession {
        &self.session
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    type Session = Arc<FakeSession>;

    async fn login(
        &self,
        _username: &str,
        _password: &SecretString,
    ) -> Result<Arc<FakeSession>, DownloaderError> {
        match self.outcome {
            LoginOutcome::Accept => Ok(Arc::clone(&self.session)),
            LoginOutcome::Reject => Err(DownloaderError::Authentication(
                "credentials rejected (HTTP 401)".into(),
            )),
            LoginOutcome::Unreachable => Err(DownloaderError::InvalidResponse(
                "sign-in page carried no CSRF token".into(),
            )),
        }
    }
}
