use anyhow::Result;
use chrono::Weekday;
use tempfile::{tempdir, TempDir};
use volley_poll_bot::database::connection::DatabaseManager;
use volley_poll_bot::database::models::{NewSchedule, PollSchedule, ScheduleUpdate};
use volley_poll_bot::error::AppError;

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn sunday_schedule(name: &str) -> NewSchedule {
    NewSchedule {
        name: name.to_string(),
        chat_id: "-100200300".to_string(),
        topic_id: None,
        training_day: "sunday".to_string(),
        poll_day: "friday".to_string(),
        training_time: "18:00".to_string(),
        enabled: true,
    }
}

#[tokio::test]
async fn test_schedule_create_and_find() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let schedule = PollSchedule::create(&db.pool, sunday_schedule("Воскресенье")).await?;
    assert_eq!(schedule.name, "Воскресенье");
    assert_eq!(schedule.training_day, "sunday");
    assert_eq!(schedule.poll_day, "friday");
    assert!(schedule.enabled);
    assert!(!schedule.id.is_empty());

    let found = PollSchedule::find_by_id(&db.pool, &schedule.id).await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().id, schedule.id);

    Ok(())
}

#[tokio::test]
async fn test_schedule_create_normalizes_weekday_case() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let mut new = sunday_schedule("Case test");
    new.training_day = "SUNDAY".to_string();
    new.poll_day = "Friday".to_string();

    let schedule = PollSchedule::create(&db.pool, new).await?;
    assert_eq!(schedule.training_day, "sunday");
    assert_eq!(schedule.poll_day, "friday");

    Ok(())
}

#[tokio::test]
async fn test_schedule_create_rejects_bad_input() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let mut bad_day = sunday_schedule("Bad day");
    bad_day.training_day = "someday".to_string();
    assert!(matches!(
        PollSchedule::create(&db.pool, bad_day).await,
        Err(AppError::InvalidWeekday(_))
    ));

    let mut bad_time = sunday_schedule("Bad time");
    bad_time.training_time = "25:99".to_string();
    assert!(matches!(
        PollSchedule::create(&db.pool, bad_time).await,
        Err(AppError::InvalidTimeFormat(_))
    ));

    let mut bad_chat = sunday_schedule("Bad chat");
    bad_chat.chat_id = "not-a-chat".to_string();
    assert!(matches!(
        PollSchedule::create(&db.pool, bad_chat).await,
        Err(AppError::Validation(_))
    ));

    let mut bad_name = sunday_schedule("");
    bad_name.name = String::new();
    assert!(matches!(
        PollSchedule::create(&db.pool, bad_name).await,
        Err(AppError::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_sparse_update_preserves_unspecified_fields() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let schedule = PollSchedule::create(&db.pool, sunday_schedule("Original")).await?;

    let update = ScheduleUpdate {
        training_time: Some("20:30".to_string()),
        ..Default::default()
    };
    let updated = PollSchedule::update(&db.pool, &schedule.id, update).await?;

    assert_eq!(updated.training_time, "20:30");
    // everything else is untouched
    assert_eq!(updated.name, "Original");
    assert_eq!(updated.chat_id, schedule.chat_id);
    assert_eq!(updated.training_day, "sunday");
    assert_eq!(updated.poll_day, "friday");
    assert!(updated.enabled);

    // the write is persisted, not cached
    let reread = PollSchedule::find_by_id(&db.pool, &schedule.id).await?.unwrap();
    assert_eq!(reread.training_time, "20:30");

    Ok(())
}

#[tokio::test]
async fn test_update_unknown_schedule_is_not_found() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let update = ScheduleUpdate {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        PollSchedule::update(&db.pool, "missing-id", update).await,
        Err(AppError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_list_enabled_for_today_matches_poll_day() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let mut friday_poll = sunday_schedule("Friday poll");
    friday_poll.poll_day = "friday".to_string();
    PollSchedule::create(&db.pool, friday_poll).await?;

    let mut tuesday_poll = sunday_schedule("Tuesday poll");
    tuesday_poll.poll_day = "tuesday".to_string();
    PollSchedule::create(&db.pool, tuesday_poll).await?;

    let due_friday = PollSchedule::list_enabled_for_today(&db.pool, Weekday::Fri).await?;
    assert_eq!(due_friday.len(), 1);
    assert_eq!(due_friday[0].name, "Friday poll");

    let due_monday = PollSchedule::list_enabled_for_today(&db.pool, Weekday::Mon).await?;
    assert!(due_monday.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_disabling_removes_schedule_from_todays_list() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let schedule = PollSchedule::create(&db.pool, sunday_schedule("Toggled")).await?;

    let due = PollSchedule::list_enabled_for_today(&db.pool, Weekday::Fri).await?;
    assert_eq!(due.len(), 1);

    let update = ScheduleUpdate {
        enabled: Some(false),
        ..Default::default()
    };
    PollSchedule::update(&db.pool, &schedule.id, update).await?;

    // even on the matching day, a disabled schedule no longer fires
    let due = PollSchedule::list_enabled_for_today(&db.pool, Weekday::Fri).await?;
    assert!(due.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_schedule_delete() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let schedule = PollSchedule::create(&db.pool, sunday_schedule("Short-lived")).await?;

    assert!(PollSchedule::delete(&db.pool, &schedule.id).await?);
    assert!(PollSchedule::find_by_id(&db.pool, &schedule.id).await?.is_none());
    assert!(!PollSchedule::delete(&db.pool, &schedule.id).await?);

    Ok(())
}
