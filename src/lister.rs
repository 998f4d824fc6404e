use crate::client::ActivitySession;
use crate::error::DownloaderError;
use crate::types::{Activity, DateRange};
use log::info;
use std::num::NonZeroUsize;

#[derive(Debug)]
pub struct ActivityListing {
    /// Number of activities the service returned before the limit applied.
    pub found: usize,
    pub activities: Vec<Activity>,
}

impl ActivityListing {
    pub fn was_limited(&self) -> bool {
        self.activities.len() < self.found
    }
}

pub async fn list_activities<S: ActivitySession + ?Sized>(
    session: &S,
    range: DateRange,
    limit: Option<NonZeroUsize>,
) -> Result<ActivityListing, DownloaderError> {
    let mut activities = session.activities_by_date(range.start, range.end).await?;
    let found = activities.len();
    info!("Service listed {} activities between {} and {}", found, range.start, range.end);

    if let Some(limit) = limit {
        activities.truncate(limit.get());
    }

    Ok(ActivityListing { found, activities })
}
