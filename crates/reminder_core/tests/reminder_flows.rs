use chrono::{Duration, TimeZone, Utc, Weekday};
use reminder_core::db::open_db_in_memory;
use reminder_core::{
    CoreConfig, InMemoryAlarmBackend, ManualClock, RecurrenceDays, RegistrationKey,
    ReminderDraft, ReminderListQuery, ReminderService, ReminderServiceError,
    ReminderValidationError, SchedulingService, SqliteReminderRepository,
};
use rusqlite::Connection;

type TestService<'conn> =
    ReminderService<SqliteReminderRepository<'conn>, InMemoryAlarmBackend, ManualClock<Utc>>;

// 2024-01-01 is a Monday.
fn at(day: u32, hour: u32, minute: u32) -> i64 {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0)
        .unwrap()
        .timestamp_millis()
}

fn new_service(conn: &Connection, now_ms: i64) -> TestService<'_> {
    ReminderService::new(SchedulingService::new(
        SqliteReminderRepository::new(conn),
        InMemoryAlarmBackend::new(),
        ManualClock::new(Utc, now_ms),
    ))
}

fn backend<'a>(service: &'a TestService<'_>) -> &'a InMemoryAlarmBackend {
    service.scheduler().backend()
}

#[test]
fn create_saves_and_schedules() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));

    let created = service
        .create_reminder(&ReminderDraft::new("Pay rent", "Transfer to landlord", at(5, 10, 0)))
        .unwrap();

    assert_eq!(created.fire_at_ms, at(5, 10, 0));
    assert_eq!(
        backend(&service).pending(),
        vec![(RegistrationKey::series(created.id), at(5, 10, 0))]
    );
    assert_eq!(service.get_reminder(created.id).unwrap(), Some(created));
}

#[test]
fn create_recurring_stores_the_computed_instant() {
    let conn = open_db_in_memory().unwrap();
    // Tuesday 10:00.
    let mut service = new_service(&conn, at(2, 10, 0));

    let created = service
        .create_reminder(
            &ReminderDraft::new("Gym", "Leg day", at(1, 9, 0))
                .with_recurrence(RecurrenceDays::from_days([Weekday::Mon, Weekday::Wed])),
        )
        .unwrap();

    assert_eq!(created.fire_at_ms, at(3, 9, 0));
}

#[test]
fn create_rejects_blank_fields_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));

    let err = service
        .create_reminder(&ReminderDraft::new("Title", "  ", at(2, 9, 0)))
        .unwrap_err();

    assert!(matches!(
        err,
        ReminderServiceError::Validation(ReminderValidationError::EmptyDescription)
    ));
    assert!(service
        .list_reminders(&ReminderListQuery::default())
        .unwrap()
        .is_empty());
    assert!(backend(&service).is_empty());
}

#[test]
fn denied_create_keeps_reminder_and_reschedule_recovers() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    backend(&service).set_exact_alarms_allowed(false);

    let err = service
        .create_reminder(&ReminderDraft::new("Pills", "Evening dose", at(1, 20, 0)))
        .unwrap_err();
    assert!(err.is_scheduling_denied());
    assert!(backend(&service).is_empty());

    let stored = service
        .list_reminders(&ReminderListQuery::default())
        .unwrap();
    assert_eq!(stored.len(), 1);

    backend(&service).set_exact_alarms_allowed(true);
    let rescheduled = service.reschedule(stored[0].id).unwrap();
    assert_eq!(
        backend(&service).fire_at(&RegistrationKey::series(rescheduled.id)),
        Some(at(1, 20, 0))
    );
}

#[test]
fn text_only_edit_leaves_the_alarm_alone() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(&ReminderDraft::new("Call", "Call the bank", at(2, 9, 0)))
        .unwrap();

    // Any backend call during the edit would fail.
    backend(&service).fail_next_call("backend must not be touched");
    let edited = service
        .edit_reminder(
            created.id,
            &ReminderDraft::new("Call bank", "Ask about the card", at(2, 9, 0)),
        )
        .unwrap();

    assert_eq!(edited.id, created.id);
    assert_eq!(edited.title, "Call bank");
    assert_eq!(edited.description, "Ask about the card");
    assert_eq!(
        backend(&service).fire_at(&RegistrationKey::series(created.id)),
        Some(at(2, 9, 0))
    );
}

#[test]
fn time_edit_replaces_the_alarm() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(&ReminderDraft::new("Call", "Call the bank", at(2, 9, 0)))
        .unwrap();

    let edited = service
        .edit_reminder(
            created.id,
            &ReminderDraft::new("Call", "Call the bank", at(4, 15, 30)),
        )
        .unwrap();

    assert_eq!(edited.fire_at_ms, at(4, 15, 30));
    assert_eq!(
        backend(&service).pending(),
        vec![(RegistrationKey::series(created.id), at(4, 15, 30))]
    );
}

#[test]
fn denied_edit_changes_neither_store_nor_alarm() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(&ReminderDraft::new("Call", "Call the bank", at(2, 9, 0)))
        .unwrap();

    backend(&service).set_exact_alarms_allowed(false);
    let err = service
        .edit_reminder(
            created.id,
            &ReminderDraft::new("Call later", "Call the bank", at(6, 9, 0)),
        )
        .unwrap_err();

    assert!(err.is_scheduling_denied());
    assert_eq!(service.get_reminder(created.id).unwrap(), Some(created.clone()));
    assert_eq!(
        backend(&service).fire_at(&RegistrationKey::series(created.id)),
        Some(at(2, 9, 0))
    );
}

#[test]
fn edit_of_missing_reminder_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));

    let err = service
        .edit_reminder(77, &ReminderDraft::new("Ghost", "Nothing", at(2, 9, 0)))
        .unwrap_err();
    assert!(matches!(err, ReminderServiceError::NotFound(77)));
}

#[test]
fn completing_cancels_and_reopening_schedules_again() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(
            &ReminderDraft::new("Water plants", "Balcony", at(1, 18, 0))
                .with_recurrence(RecurrenceDays::every_day()),
        )
        .unwrap();
    service
        .on_snooze_requested(created.id, Duration::minutes(10))
        .unwrap();

    let completed = service.toggle_completion(created.id).unwrap();
    assert!(completed.is_completed);
    assert!(backend(&service).is_empty());
    assert_eq!(service.scheduler().pending_count(), 0);

    let reopened = service.toggle_completion(created.id).unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(
        backend(&service).pending(),
        vec![(RegistrationKey::series(created.id), at(1, 18, 0))]
    );
    assert_eq!(service.get_reminder(created.id).unwrap(), Some(reopened));
}

#[test]
fn delete_cancels_every_registration() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(&ReminderDraft::new("Laundry", "Darks", at(1, 19, 0)))
        .unwrap();
    service
        .on_snooze_requested(created.id, Duration::minutes(15))
        .unwrap();
    assert_eq!(backend(&service).len(), 2);

    service.delete_reminder(created.id).unwrap();

    assert!(backend(&service).is_empty());
    assert_eq!(service.get_reminder(created.id).unwrap(), None);
    assert!(matches!(
        service.delete_reminder(created.id).unwrap_err(),
        ReminderServiceError::NotFound(_)
    ));
}

#[test]
fn reschedule_all_restores_open_reminders_on_a_fresh_backend() {
    let conn = open_db_in_memory().unwrap();
    {
        let mut service = new_service(&conn, at(1, 8, 0));
        service
            .create_reminder(&ReminderDraft::new("A", "first", at(2, 9, 0)))
            .unwrap();
        service
            .create_reminder(
                &ReminderDraft::new("B", "second", at(1, 7, 0))
                    .with_recurrence(RecurrenceDays::from_days([Weekday::Fri])),
            )
            .unwrap();
        let done = service
            .create_reminder(&ReminderDraft::new("C", "third", at(3, 9, 0)))
            .unwrap();
        service.toggle_completion(done.id).unwrap();
    }

    // Simulates a reboot: same store, empty alarm table.
    let mut service = new_service(&conn, at(1, 12, 0));
    assert_eq!(service.reschedule_all().unwrap(), 2);

    let fire_times: Vec<i64> = backend(&service)
        .pending()
        .into_iter()
        .map(|(_, fire_at_ms)| fire_at_ms)
        .collect();
    assert_eq!(fire_times, vec![at(2, 9, 0), at(5, 7, 0)]);
}

#[test]
fn fired_recurring_reminder_rolls_forward_through_the_service() {
    let conn = open_db_in_memory().unwrap();
    let mut service = new_service(&conn, at(1, 8, 0));
    let created = service
        .create_reminder(
            &ReminderDraft::new("Stretch", "Five minutes", at(1, 9, 0))
                .with_recurrence(RecurrenceDays::from_days([Weekday::Mon])),
        )
        .unwrap();

    service.scheduler().clock().set(at(1, 9, 0));
    let due = backend(&service).take_due(at(1, 9, 0));
    let outcome = service.on_alarm(&due[0].0).unwrap();

    assert_eq!(outcome.next_fire_at_ms, Some(at(8, 9, 0)));
    assert_eq!(
        service.get_reminder(created.id).unwrap().unwrap().fire_at_ms,
        at(8, 9, 0)
    );
}

#[test]
fn configured_presets_shape_notifications_and_cancellation() {
    let conn = open_db_in_memory().unwrap();
    let config = CoreConfig::from_json_str(
        r#"{"snooze_presets_minutes":[30,1],"default_notification_body":"Ping"}"#,
    )
    .unwrap();
    let mut service = ReminderService::new(SchedulingService::with_config(
        SqliteReminderRepository::new(&conn),
        InMemoryAlarmBackend::new(),
        ManualClock::new(Utc, at(1, 8, 0)),
        &config,
    ));
    let created = service
        .create_reminder(&ReminderDraft::new("Tea", "Steep", at(1, 8, 5)))
        .unwrap();

    let content = service.scheduler().notification_for(created.id).unwrap();
    let minutes: Vec<u32> = content.actions.iter().map(|a| a.minutes).collect();
    assert_eq!(minutes, vec![1, 30]);

    service
        .on_snooze_requested(created.id, Duration::minutes(30))
        .unwrap();
    service.delete_reminder(created.id).unwrap();
    assert!(service.scheduler().backend().is_empty());
}
