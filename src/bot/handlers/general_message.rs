use std::sync::Arc;
use teloxide::prelude::*;

use crate::bot::handlers::HandlerResult;
use crate::bot::state::{WizardState, WizardStore};
use crate::database::connection::DatabaseManager;
use crate::database::models::{NewSchedule, PollSchedule};
use crate::utils::datetime::{parse_training_time, weekday_from_name, weekday_name};
use crate::utils::validation::validate_schedule_name;

/// Advances the schedule-creation wizard with the user's text input.
/// Users with no active wizard session are ignored.
pub async fn wizard_message_handler(
    bot: Bot,
    msg: Message,
    db: DatabaseManager,
    wizard: Arc<WizardStore>,
) -> HandlerResult {
    let Some(user_id) = msg.from().map(|u| u.id.0 as i64) else {
        return Ok(());
    };
    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };

    let Some(state) = wizard.take(user_id) else {
        return Ok(());
    };

    match state {
        WizardState::AwaitingName => {
            if let Err(e) = validate_schedule_name(text) {
                wizard.set(user_id, WizardState::AwaitingName);
                bot.send_message(msg.chat.id, format!("❌ {e}\nВведите название расписания:"))
                    .await?;
                return Ok(());
            }

            wizard.set(
                user_id,
                WizardState::AwaitingTrainingDay {
                    name: text.to_string(),
                },
            );
            bot.send_message(
                msg.chat.id,
                "День тренировки (например, friday):",
            )
            .await?;
        }
        WizardState::AwaitingTrainingDay { name } => match weekday_from_name(text) {
            Ok(day) => {
                wizard.set(
                    user_id,
                    WizardState::AwaitingPollDay {
                        name,
                        training_day: weekday_name(day).to_string(),
                    },
                );
                bot.send_message(
                    msg.chat.id,
                    "День публикации опроса (например, tuesday):",
                )
                .await?;
            }
            Err(e) => {
                wizard.set(user_id, WizardState::AwaitingTrainingDay { name });
                bot.send_message(msg.chat.id, format!("❌ {e}\nДень тренировки:")).await?;
            }
        },
        WizardState::AwaitingPollDay { name, training_day } => match weekday_from_name(text) {
            Ok(day) => {
                wizard.set(
                    user_id,
                    WizardState::AwaitingTime {
                        name,
                        training_day,
                        poll_day: weekday_name(day).to_string(),
                    },
                );
                bot.send_message(msg.chat.id, "Время тренировки (ЧЧ:ММ):").await?;
            }
            Err(e) => {
                wizard.set(user_id, WizardState::AwaitingPollDay { name, training_day });
                bot.send_message(msg.chat.id, format!("❌ {e}\nДень публикации опроса:"))
                    .await?;
            }
        },
        WizardState::AwaitingTime {
            name,
            training_day,
            poll_day,
        } => match parse_training_time(text) {
            Ok(_) => {
                wizard.set(
                    user_id,
                    WizardState::AwaitingChat {
                        name,
                        training_day,
                        poll_day,
                        training_time: text.to_string(),
                    },
                );
                bot.send_message(
                    msg.chat.id,
                    "ID чата для опросов (или «.» для текущего чата):",
                )
                .await?;
            }
            Err(e) => {
                wizard.set(
                    user_id,
                    WizardState::AwaitingTime {
                        name,
                        training_day,
                        poll_day,
                    },
                );
                bot.send_message(msg.chat.id, format!("❌ {e}\nВремя тренировки (ЧЧ:ММ):"))
                    .await?;
            }
        },
        WizardState::AwaitingChat {
            name,
            training_day,
            poll_day,
            training_time,
        } => {
            let chat_id = if text == "." {
                msg.chat.id.0.to_string()
            } else {
                text.to_string()
            };

            let new = NewSchedule {
                name: name.clone(),
                chat_id,
                topic_id: msg.thread_id.map(i64::from),
                training_day: training_day.clone(),
                poll_day: poll_day.clone(),
                training_time: training_time.clone(),
                enabled: true,
            };

            match PollSchedule::create(&db.pool, new).await {
                Ok(schedule) => {
                    bot.send_message(
                        msg.chat.id,
                        format!(
                            "✅ Расписание «{}» создано: тренировка {} {}, опрос {}",
                            schedule.name,
                            schedule.training_day,
                            schedule.training_time,
                            schedule.poll_day
                        ),
                    )
                    .await?;
                }
                Err(e) => {
                    tracing::error!("Failed to create schedule from wizard: {}", e);
                    wizard.set(
                        user_id,
                        WizardState::AwaitingChat {
                            name,
                            training_day,
                            poll_day,
                            training_time,
                        },
                    );
                    bot.send_message(msg.chat.id, format!("❌ {e}\nID чата для опросов:"))
                        .await?;
                }
            }
        }
    }

    Ok(())
}
