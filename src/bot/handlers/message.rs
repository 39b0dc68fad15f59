use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

use crate::bot::commands::Command;
use crate::bot::handlers::HandlerResult;
use crate::database::connection::DatabaseManager;
use crate::database::models::User;
use crate::services::poller::post_due_polls;
use crate::services::transport::ChatTransport;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    db: DatabaseManager,
    transport: Arc<dyn ChatTransport>,
) -> HandlerResult {
    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
        }
        Command::Start => {
            handle_start(&bot, &msg, &db).await?;
        }
        Command::GetId => {
            let user_id = msg.from().map(|u| u.id.0).unwrap_or(0);
            bot.send_message(msg.chat.id, format!("Ваш Telegram ID: {user_id}")).await?;
        }
        Command::PollNow => {
            handle_poll_now(&bot, &msg, &db, transport.as_ref()).await?;
        }
    }

    Ok(())
}

pub(super) async fn is_admin(db: &DatabaseManager, telegram_id: i64) -> bool {
    match User::find_by_telegram_id(&db.pool, telegram_id).await {
        Ok(Some(user)) => user.is_admin,
        Ok(None) => false,
        Err(e) => {
            tracing::error!("Failed to look up user {}: {}", telegram_id, e);
            false
        }
    }
}

pub(super) fn admin_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "➕ Новое расписание",
            "wizard:new_schedule",
        )],
        vec![InlineKeyboardButton::callback(
            "📋 Расписания",
            "schedules:list",
        )],
        vec![InlineKeyboardButton::callback(
            "📤 Опубликовать опросы",
            "polls:post_now",
        )],
    ])
}

async fn handle_start(bot: &Bot, msg: &Message, db: &DatabaseManager) -> HandlerResult {
    let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or(0);

    tracing::info!("Start command from user {} in chat {}", user_id, msg.chat.id.0);

    if is_admin(db, user_id).await {
        bot.send_message(
            msg.chat.id,
            "🏐 Бот волейбольных опросов.\n\nВыберите действие:",
        )
        .reply_markup(admin_menu())
        .await?;
    } else {
        bot.send_message(
            msg.chat.id,
            "🏐 Привет! Этот бот публикует опросы о волейбольных тренировках.\n\nЗапись на тренировки доступна через веб-календарь.",
        )
        .await?;
    }

    Ok(())
}

async fn handle_poll_now(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
    transport: &dyn ChatTransport,
) -> HandlerResult {
    let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or(0);

    if !is_admin(db, user_id).await {
        bot.send_message(msg.chat.id, "❌ Команда доступна только администраторам").await?;
        return Ok(());
    }

    let today = chrono::Utc::now().date_naive();
    match post_due_polls(transport, db, today).await {
        Ok(_) => {
            bot.send_message(msg.chat.id, "✅ Опросы по сегодняшним расписаниям опубликованы").await?;
        }
        Err(e) => {
            tracing::error!("Manual poll posting failed: {}", e);
            bot.send_message(msg.chat.id, "❌ Не удалось опубликовать опросы").await?;
        }
    }

    Ok(())
}
