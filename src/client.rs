//! Remote service boundary: logging in, listing and downloading activities.

use crate::error::DownloaderError;
use crate::types::{Activity, ActivityId, ExportFormat};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;

#[async_trait]
pub trait Authenticator: Send + Sync {
    type Session: ActivitySession;

    /// Fails with [`DownloaderError::Authentication`] for rejected
    /// credentials and any other variant for transport problems.
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Self::Session, DownloaderError>;
}

#[async_trait]
pub trait ActivitySession: Send + Sync {
    /// Activities whose start falls in `[start, end]` as the service defines
    /// it, in the order the service returns them.
    async fn activities_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Activity>, DownloaderError>;

    async fn download_activity(
        &self,
        activity_id: &ActivityId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DownloaderError>;
}

#[async_trait]
impl<T: ActivitySession + ?Sized> ActivitySession for std::sync::Arc<T> {
    async fn activities_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Activity>, DownloaderError> {
        (**self).activities_by_date(start, end).await
    }

    async fn download_activity(
        &self,
        activity_id: &ActivityId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, DownloaderError> {
        (**self).download_activity(activity_id, format).await
    }
}
