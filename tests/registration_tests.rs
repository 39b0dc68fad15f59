use anyhow::Result;
use tempfile::{tempdir, TempDir};
use volley_poll_bot::database::connection::DatabaseManager;
use volley_poll_bot::database::models::{
    OccurrenceKey, Registration, RegistrationStatus, User, UserProfile, TRAINING_CAPACITY,
};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn sunday_evening() -> OccurrenceKey {
    OccurrenceKey {
        training_date: "2026-02-15".to_string(),
        training_time: "18:00".to_string(),
        chat_id: "-100200300".to_string(),
    }
}

async fn statuses(
    db: &DatabaseManager,
    key: &OccurrenceKey,
) -> Result<(Vec<i64>, Vec<i64>)> {
    let roster = Registration::list_for_occurrence(&db.pool, key).await?;
    let registered = roster
        .iter()
        .filter(|r| r.status == "registered")
        .map(|r| r.user_telegram_id)
        .collect();
    let waitlist = roster
        .iter()
        .filter(|r| r.status == "waitlist")
        .map(|r| r.user_telegram_id)
        .collect();
    Ok((registered, waitlist))
}

#[tokio::test]
async fn test_capacity_and_waitlist_promotion_scenario() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    // u1..u12 all get regular slots
    for user_id in 1..=12i64 {
        let status = Registration::register(&db.pool, &key, None, user_id).await?;
        assert_eq!(status, RegistrationStatus::Registered, "user {user_id}");
    }

    // the 13th lands on the waitlist
    let status = Registration::register(&db.pool, &key, None, 13).await?;
    assert_eq!(status, RegistrationStatus::Waitlist);

    // u1 leaves, u13 takes the freed slot
    Registration::unregister(&db.pool, &key, 1).await?;

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert_eq!(registered.len(), 12);
    assert!(registered.contains(&13));
    assert!(!registered.contains(&1));
    assert!(waitlist.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_registered_count_never_exceeds_capacity() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    for user_id in 1..=20i64 {
        Registration::register(&db.pool, &key, None, user_id).await?;
        let (registered, _) = statuses(&db, &key).await?;
        assert!(registered.len() as i64 <= TRAINING_CAPACITY);
    }

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert_eq!(registered.len() as i64, TRAINING_CAPACITY);
    assert_eq!(waitlist.len(), 8);

    Ok(())
}

#[tokio::test]
async fn test_repeat_registration_is_idempotent() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    let first = Registration::register(&db.pool, &key, None, 5).await?;
    let second = Registration::register(&db.pool, &key, None, 5).await?;

    assert_eq!(first, RegistrationStatus::Registered);
    assert_eq!(second, first);

    let roster = Registration::list_for_occurrence(&db.pool, &key).await?;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].user_telegram_id, 5);

    Ok(())
}

#[tokio::test]
async fn test_repeat_registration_keeps_a_full_roster_stable() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    for user_id in 1..=13i64 {
        Registration::register(&db.pool, &key, None, user_id).await?;
    }

    // A registered user re-registering must stay registered even
    // though the occurrence is at capacity.
    let status = Registration::register(&db.pool, &key, None, 5).await?;
    assert_eq!(status, RegistrationStatus::Registered);

    // A waitlisted user re-registering stays waitlisted.
    let status = Registration::register(&db.pool, &key, None, 13).await?;
    assert_eq!(status, RegistrationStatus::Waitlist);

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert_eq!(registered.len(), 12);
    assert_eq!(waitlist, vec![13]);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_registrations_admit_exactly_one_into_the_last_slot() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    for user_id in 1..=11i64 {
        Registration::register(&db.pool, &key, None, user_id).await?;
    }

    let (first, second) = tokio::join!(
        Registration::register(&db.pool, &key, None, 101),
        Registration::register(&db.pool, &key, None, 102),
    );
    let first = first?;
    let second = second?;

    let outcomes = [first, second];
    assert!(
        outcomes.contains(&RegistrationStatus::Registered)
            && outcomes.contains(&RegistrationStatus::Waitlist),
        "expected one registered and one waitlisted, got {outcomes:?}"
    );

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert_eq!(registered.len(), 12);
    assert_eq!(waitlist.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_promotion_is_fifo_by_original_registration_time() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    for user_id in 1..=12i64 {
        Registration::register(&db.pool, &key, None, user_id).await?;
    }

    Registration::register(&db.pool, &key, None, 13).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    Registration::register(&db.pool, &key, None, 14).await?;

    // u13 joined the waitlist first and is promoted first.
    Registration::unregister(&db.pool, &key, 3).await?;

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert!(registered.contains(&13));
    assert_eq!(waitlist, vec![14]);

    Registration::unregister(&db.pool, &key, 4).await?;

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert!(registered.contains(&14));
    assert!(waitlist.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_waitlisted_user_leaving_does_not_promote_anyone() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    for user_id in 1..=14i64 {
        Registration::register(&db.pool, &key, None, user_id).await?;
    }

    // u13 gives up their waitlist spot; the 12 regular slots are still
    // taken, so nobody may be promoted.
    Registration::unregister(&db.pool, &key, 13).await?;

    let (registered, waitlist) = statuses(&db, &key).await?;
    assert_eq!(registered.len(), 12);
    assert_eq!(waitlist, vec![14]);

    Ok(())
}

#[tokio::test]
async fn test_unregister_of_absent_user_is_harmless() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    Registration::register(&db.pool, &key, None, 1).await?;
    Registration::unregister(&db.pool, &key, 999).await?;

    let (registered, _) = statuses(&db, &key).await?;
    assert_eq!(registered, vec![1]);

    Ok(())
}

#[tokio::test]
async fn test_morning_and_evening_sessions_are_distinct_occurrences() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let morning = OccurrenceKey {
        training_date: "2026-02-15".to_string(),
        training_time: "09:00".to_string(),
        chat_id: "-100200300".to_string(),
    };
    let evening = sunday_evening();

    let first = Registration::register(&db.pool, &morning, None, 7).await?;
    let second = Registration::register(&db.pool, &evening, None, 7).await?;

    assert_eq!(first, RegistrationStatus::Registered);
    assert_eq!(second, RegistrationStatus::Registered);

    let mine = Registration::list_for_user(&db.pool, 7).await?;
    assert_eq!(mine.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_list_for_user_is_ordered_by_date_then_time() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let keys = [
        ("2026-03-01", "18:00"),
        ("2026-02-15", "18:00"),
        ("2026-02-15", "09:00"),
    ];
    for (date, time) in keys {
        let key = OccurrenceKey {
            training_date: date.to_string(),
            training_time: time.to_string(),
            chat_id: "-100200300".to_string(),
        };
        Registration::register(&db.pool, &key, None, 7).await?;
    }

    let mine = Registration::list_for_user(&db.pool, 7).await?;
    let ordered: Vec<(&str, &str)> = mine
        .iter()
        .map(|r| (r.training_date.as_str(), r.training_time.as_str()))
        .collect();

    assert_eq!(
        ordered,
        vec![
            ("2026-02-15", "09:00"),
            ("2026-02-15", "18:00"),
            ("2026-03-01", "18:00"),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_occurrence_roster_joins_profiles_in_signup_order() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let key = sunday_evening();

    User::upsert_from_login(
        &db.pool,
        &UserProfile {
            telegram_id: 1,
            first_name: "Анна".to_string(),
            last_name: None,
            username: Some("anna".to_string()),
            photo_url: None,
        },
    )
    .await?;

    Registration::register(&db.pool, &key, None, 1).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    Registration::register(&db.pool, &key, None, 2).await?;

    let roster = Registration::list_for_occurrence(&db.pool, &key).await?;
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].user_telegram_id, 1);
    assert_eq!(roster[0].first_name.as_deref(), Some("Анна"));
    assert_eq!(roster[0].username.as_deref(), Some("anna"));
    // user 2 never logged in, so the join finds no profile
    assert_eq!(roster[1].user_telegram_id, 2);
    assert!(roster[1].first_name.is_none());

    Ok(())
}

#[tokio::test]
async fn test_unprovisioned_store_surfaces_an_error_not_an_empty_list() -> Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("empty.db");
    let database_url = format!("sqlite:{}", db_path.display());

    // No migrations: the registrations table does not exist.
    let db = DatabaseManager::new(&database_url).await?;

    let result = Registration::list_for_user(&db.pool, 1).await;
    assert!(result.is_err());

    let result = Registration::register(&db.pool, &sunday_evening(), None, 1).await;
    assert!(result.is_err());

    Ok(())
}
