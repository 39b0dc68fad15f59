use std::sync::Arc;
use teloxide::prelude::*;

use crate::bot::handlers::message::is_admin;
use crate::bot::handlers::HandlerResult;
use crate::bot::state::{WizardState, WizardStore};
use crate::database::connection::DatabaseManager;
use crate::database::models::{PollSchedule, ScheduleUpdate};
use crate::services::poller::post_due_polls;
use crate::services::transport::ChatTransport;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    db: DatabaseManager,
    transport: Arc<dyn ChatTransport>,
    wizard: Arc<WizardStore>,
) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    let chat_id = match q.message.as_ref() {
        Some(msg) => msg.chat.id,
        None => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).text("Некорректные данные").await?;
        return Ok(());
    };

    tracing::info!("Callback '{}' from user {} in chat {}", data, user_id, chat_id.0);

    if !is_admin(&db, user_id).await {
        bot.answer_callback_query(q.id)
            .text("Доступно только администраторам")
            .await?;
        return Ok(());
    }

    match data.as_str() {
        "wizard:new_schedule" => {
            wizard.set(user_id, WizardState::AwaitingName);
            bot.send_message(chat_id, "Введите название расписания:").await?;
            bot.answer_callback_query(q.id).await?;
        }
        "schedules:list" => {
            handle_schedules_list(&bot, chat_id, &db).await?;
            bot.answer_callback_query(q.id).await?;
        }
        "polls:post_now" => {
            let today = chrono::Utc::now().date_naive();
            match post_due_polls(transport.as_ref(), &db, today).await {
                Ok(_) => {
                    bot.answer_callback_query(q.id).text("✅ Опросы опубликованы").await?;
                }
                Err(e) => {
                    tracing::error!("Manual poll posting failed: {}", e);
                    bot.answer_callback_query(q.id)
                        .text("❌ Не удалось опубликовать опросы")
                        .await?;
                }
            }
        }
        _ if data.starts_with("schedule:toggle:") => {
            let schedule_id = data.trim_start_matches("schedule:toggle:");
            handle_schedule_toggle(&bot, chat_id, &db, schedule_id).await?;
            bot.answer_callback_query(q.id).await?;
        }
        _ => {
            bot.answer_callback_query(q.id).text("Неизвестное действие").await?;
        }
    }

    Ok(())
}

async fn handle_schedules_list(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
) -> HandlerResult {
    let schedules = match PollSchedule::list_all(&db.pool).await {
        Ok(schedules) => schedules,
        Err(e) => {
            tracing::error!("Failed to list schedules: {}", e);
            bot.send_message(chat_id, "❌ Не удалось загрузить расписания").await?;
            return Ok(());
        }
    };

    if schedules.is_empty() {
        bot.send_message(chat_id, "Расписаний пока нет").await?;
        return Ok(());
    }

    let mut text = String::from("📋 Расписания:\n\n");
    let mut buttons = Vec::new();
    for schedule in &schedules {
        let status = if schedule.enabled { "вкл" } else { "выкл" };
        text.push_str(&format!(
            "• {} — тренировка: {} {}, опрос: {} [{}]\n",
            schedule.name,
            schedule.training_day,
            schedule.training_time,
            schedule.poll_day,
            status
        ));
        buttons.push(vec![teloxide::types::InlineKeyboardButton::callback(
            format!("⏯ {}", schedule.name),
            format!("schedule:toggle:{}", schedule.id),
        )]);
    }

    bot.send_message(chat_id, text)
        .reply_markup(teloxide::types::InlineKeyboardMarkup::new(buttons))
        .await?;

    Ok(())
}

async fn handle_schedule_toggle(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    schedule_id: &str,
) -> HandlerResult {
    let schedule = match PollSchedule::find_by_id(&db.pool, schedule_id).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            bot.send_message(chat_id, "❌ Расписание не найдено").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load schedule {}: {}", schedule_id, e);
            bot.send_message(chat_id, "❌ Не удалось загрузить расписание").await?;
            return Ok(());
        }
    };

    let update = ScheduleUpdate {
        enabled: Some(!schedule.enabled),
        ..Default::default()
    };

    match PollSchedule::update(&db.pool, schedule_id, update).await {
        Ok(updated) => {
            let status = if updated.enabled { "включено" } else { "выключено" };
            bot.send_message(chat_id, format!("Расписание «{}» {}", updated.name, status))
                .await?;
        }
        Err(e) => {
            tracing::error!("Failed to toggle schedule {}: {}", schedule_id, e);
            bot.send_message(chat_id, "❌ Не удалось изменить расписание").await?;
        }
    }

    Ok(())
}
