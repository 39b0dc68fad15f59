use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use teloxide::Bot;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::connection::DatabaseManager;
use crate::database::models::{ActivePoll, PollSchedule, PollTemplate};
use crate::error::AppError;
use crate::services::transport::{ChatTransport, TelegramTransport};
use crate::utils::datetime::{next_occurrence, parse_training_time, weekday_from_name};

/// Daily poll-posting service. Once a day it walks the enabled
/// schedules and posts an attendance poll for every schedule whose
/// poll day is today.
pub struct PollService {
    transport: Arc<dyn ChatTransport>,
    db: Arc<DatabaseManager>,
    scheduler: JobScheduler,
}

impl PollService {
    pub async fn new(
        bot: Bot,
        db: Arc<DatabaseManager>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            transport: Arc::new(TelegramTransport::new(bot)),
            db,
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let transport = self.transport.clone();
        let db = self.db.clone();

        let poll_job = Job::new_async("0 0 12 * * *", move |_uuid, _l| {
            let transport = transport.clone();
            let db = db.clone();
            Box::pin(async move {
                let today = Utc::now().date_naive();
                if let Err(e) = post_due_polls(transport.as_ref(), &db, today).await {
                    tracing::error!("Failed to post scheduled polls: {}", e);
                }
            })
        })?;

        self.scheduler.add(poll_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Poll service started - posting due polls daily at 12:00 UTC");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Manual trigger, used by the /pollnow bot command.
    pub async fn post_now(&self) -> Result<(), AppError> {
        post_due_polls(self.transport.as_ref(), &self.db, Utc::now().date_naive()).await
    }
}

/// One tick of the orchestrator: posts a poll for the default template
/// (if due) and for every enabled schedule whose poll day matches
/// `today`. A transport failure skips only the schedule it hit; the
/// rest of the tick proceeds.
///
/// Nothing stops a second invocation on the same day from posting the
/// same polls again.
pub async fn post_due_polls(
    transport: &dyn ChatTransport,
    db: &DatabaseManager,
    today: NaiveDate,
) -> Result<(), AppError> {
    let template = PollTemplate::load(&db.pool).await?;

    if template.enabled && !template.default_chat_id.is_empty() {
        match weekday_from_name(&template.poll_day) {
            Ok(poll_day) if poll_day == today.weekday() => {
                let chat_id = template.default_chat_id.clone();
                let topic_id = template.default_topic_id;
                if let Err(e) = post_training_poll(
                    transport,
                    db,
                    &template,
                    &chat_id,
                    topic_id,
                    &template.training_day,
                    &template.training_time,
                    None,
                    today,
                )
                .await
                {
                    tracing::error!("Failed to post default template poll: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Default template has a bad poll day: {}", e),
        }
    }

    let schedules = PollSchedule::list_enabled_for_today(&db.pool, today.weekday()).await?;
    tracing::info!("Posting polls for {} due schedule(s)", schedules.len());

    for schedule in schedules {
        if let Err(e) = post_training_poll(
            transport,
            db,
            &template,
            &schedule.chat_id,
            schedule.topic_id,
            &schedule.training_day,
            &schedule.training_time,
            Some(&schedule.id),
            today,
        )
        .await
        {
            tracing::error!(
                "Failed to post poll for schedule {} in chat {}: {}",
                schedule.id,
                schedule.chat_id,
                e
            );
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn post_training_poll(
    transport: &dyn ChatTransport,
    db: &DatabaseManager,
    template: &PollTemplate,
    chat_id: &str,
    topic_id: Option<i64>,
    training_day: &str,
    training_time: &str,
    schedule_id: Option<&str>,
    today: NaiveDate,
) -> Result<(), AppError> {
    let training_weekday = weekday_from_name(training_day)?;
    parse_training_time(training_time)?;

    let training_date = next_occurrence(training_weekday, today);
    let question = template.render(training_date, training_time);

    let message = transport
        .publish_poll(chat_id, &question, &template.options, topic_id)
        .await?;

    // Pin failure is independent of the publish: the poll stays up.
    if let Err(e) = transport.pin(chat_id, &message).await {
        tracing::error!(
            "Failed to pin poll message {} in chat {}: {}",
            message.message_id,
            chat_id,
            e
        );
    }

    ActivePoll::record(&db.pool, chat_id, message.message_id, topic_id, schedule_id).await?;

    tracing::info!(
        "Poll posted in chat {} for training on {}",
        chat_id,
        training_date
    );

    Ok(())
}
