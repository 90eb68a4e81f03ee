use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::MediaService;

/// Cron expression (with seconds) for an every-`hours` job. Intervals of a
/// day or more run once at midnight.
#[must_use]
pub fn refresh_cron(hours: u32) -> String {
    let hours = hours.max(1);
    if hours >= 24 {
        "0 0 0 * * *".to_string()
    } else {
        format!("0 0 */{hours} * * *")
    }
}

/// Periodic metadata refresh.
pub struct Scheduler {
    media_service: Arc<dyn MediaService>,
    config: SchedulerConfig,
    inner: Option<JobScheduler>,
}

impl Scheduler {
    pub fn new(media_service: Arc<dyn MediaService>, config: SchedulerConfig) -> Self {
        Self {
            media_service,
            config,
            inner: None,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        let sched = JobScheduler::new().await?;
        let cron = refresh_cron(self.config.metadata_refresh_hours);

        let media_service = Arc::clone(&self.media_service);
        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let media_service = Arc::clone(&media_service);
            Box::pin(async move {
                if let Err(e) = media_service.refresh_all().await {
                    error!(event = "job_failed", job_name = "metadata_refresh", error = %e, "Scheduled metadata refresh failed");
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;
        info!("Metadata refresh scheduled: {}", cron);

        self.inner = Some(sched);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut sched) = self.inner.take() {
            sched.shutdown().await?;
            info!("Scheduler stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_for_short_and_daily_intervals() {
        assert_eq!(refresh_cron(6), "0 0 */6 * * *");
        assert_eq!(refresh_cron(0), "0 0 */1 * * *");
        assert_eq!(refresh_cron(24), "0 0 0 * * *");
        assert_eq!(refresh_cron(72), "0 0 0 * * *");
    }
}
