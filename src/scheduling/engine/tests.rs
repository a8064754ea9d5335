use super::*;

use std::sync::Arc;

use chrono::{Duration, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use proptest::prelude::*;
use proptest_arbitrary_interop::arb;

use crate::storage::InMemoryReminderStorage;

fn fire_time(hhmm: &str) -> ReminderFireTime {
    ReminderFireTime::parse(hhmm).unwrap()
}

fn utc(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

const MOSCOW: Tz = chrono_tz::Europe::Moscow; // fixed UTC+3 since 2014
const BERLIN: Tz = chrono_tz::Europe::Berlin;

#[test]
fn fires_same_day_when_time_is_ahead() {
    // 08:00 local, reminder at 09:00 local.
    let next = compute_next_fire_at(&fire_time("09:00"), utc("2024-01-01T05:00:00Z"), MOSCOW);
    assert_eq!(next, utc("2024-01-01T06:00:00Z"));
}

#[test]
fn fires_next_day_when_time_has_passed() {
    // 10:00 local, reminder at 09:00 local.
    let next = compute_next_fire_at(&fire_time("09:00"), utc("2024-01-01T07:00:00Z"), MOSCOW);
    assert_eq!(next, utc("2024-01-02T06:00:00Z"));
}

#[test]
fn rolls_forward_on_exact_minute_boundary() {
    // now is exactly 09:00 local; never fire at the same instant.
    let next = compute_next_fire_at(&fire_time("09:00"), utc("2024-01-01T06:00:00Z"), MOSCOW);
    assert_eq!(next, utc("2024-01-02T06:00:00Z"));
}

#[test]
fn spring_forward_gap_shifts_past_the_transition() {
    // Berlin skips 02:00-03:00 local on 2024-03-31; a 02:30 reminder lands
    // on 03:30 CEST that day, like the original zoneinfo normalization.
    let next = compute_next_fire_at(&fire_time("02:30"), utc("2024-03-30T11:00:00Z"), BERLIN);
    assert_eq!(next, utc("2024-03-31T01:30:00Z"));
}

#[test]
fn fall_back_ambiguity_takes_the_earlier_hit() {
    // Berlin repeats 02:00-03:00 local on 2024-10-27.
    let next = compute_next_fire_at(&fire_time("02:30"), utc("2024-10-26T12:00:00Z"), BERLIN);
    assert_eq!(next, utc("2024-10-27T00:30:00Z"));
}

#[test]
fn fall_back_can_stretch_the_gap_past_a_day() {
    // Moscow dropped from UTC+4 to UTC+3 on 2014-10-26, making that
    // wall-clock day 25 hours long.
    let now = utc("2014-10-24T23:30:00Z"); // 03:30 local
    let next = compute_next_fire_at(&fire_time("03:00"), now, MOSCOW);
    assert_eq!(next, utc("2014-10-26T00:00:00Z"));
    assert_eq!(next - now, Duration::hours(24) + Duration::minutes(30));
}

#[tokio::test]
async fn schedule_validates_time_format() {
    let engine = SchedulingEngine::new(Arc::new(InMemoryReminderStorage::new()), MOSCOW);

    let result = engine.schedule_reminder(1, 1, "25:99").await;
    assert!(matches!(result, Err(ScheduleError::InvalidTime(_))));

    let result = engine.schedule_reminder(1, 1, "soon").await;
    assert!(matches!(result, Err(ScheduleError::InvalidTime(_))));
}

#[tokio::test]
async fn listing_is_ordered_and_stable() {
    let engine = SchedulingEngine::new(Arc::new(InMemoryReminderStorage::new()), MOSCOW);
    let now = utc("2024-01-01T07:00:00Z"); // 10:00 local

    // 11:00 fires today, 09:00 only tomorrow.
    let later = engine.schedule_reminder_at(1, 1, "09:00", now).await.unwrap();
    let sooner = engine.schedule_reminder_at(1, 2, "11:00", now).await.unwrap();
    engine.schedule_reminder_at(2, 3, "12:00", now).await.unwrap();

    let listed = engine.list_active_reminders(1).await.unwrap();
    let ids: Vec<ReminderId> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    // Idempotent without mutation in between.
    assert_eq!(listed, engine.list_active_reminders(1).await.unwrap());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let engine = SchedulingEngine::new(Arc::new(InMemoryReminderStorage::new()), MOSCOW);
    let reminder = engine.schedule_reminder(1, 1, "09:00").await.unwrap();

    engine.cancel_reminder(reminder.id).await.unwrap();
    engine.cancel_reminder(reminder.id).await.unwrap();
    engine.cancel_reminder(9000).await.unwrap();

    assert!(engine.list_active_reminders(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_all_for_task_leaves_other_tasks_alone() {
    let engine = SchedulingEngine::new(Arc::new(InMemoryReminderStorage::new()), MOSCOW);
    engine.schedule_reminder(1, 1, "09:00").await.unwrap();
    engine.schedule_reminder(1, 1, "18:00").await.unwrap();
    let kept = engine.schedule_reminder(1, 2, "12:00").await.unwrap();

    engine.cancel_all_for_task(1, 1).await.unwrap();

    let remaining = engine.list_active_reminders(1).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 1990..2040, enough to cross plenty of DST transitions.
    (631_152_000i64..2_208_988_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn timezone_strategy() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(chrono_tz::Europe::Moscow),
        Just(chrono_tz::Europe::Berlin),
        Just(chrono_tz::America::New_York),
        Just(chrono_tz::Asia::Kathmandu),
        Just(chrono_tz::Pacific::Auckland),
        Just(chrono_tz::UTC),
    ]
}

proptest::proptest! {
    #[test]
    fn next_fire_is_strictly_future_and_within_a_day(
        time in arb::<NaiveTime>(),
        now in now_strategy(),
        tz in timezone_strategy(),
    ) {
        let fire_time = ReminderFireTime::new(time);
        let next = compute_next_fire_at(&fire_time, now, tz);

        prop_assert!(next > now, "next fire must be in the future, got {next} for now {now}");
        // 24h plus at most one hour of DST shift.
        prop_assert!(next - now <= Duration::hours(25), "next = {next}, now = {now}, tz = {tz}");
    }

    #[test]
    fn next_fire_matches_wall_clock_without_dst(
        time in arb::<NaiveTime>(),
        now in now_strategy(),
    ) {
        // Etc/GMT-3 is a fixed UTC+3 offset across the whole sampled range;
        // Europe/Moscow only became one in late 2014.
        let fixed: Tz = chrono_tz::Etc::GMTMinus3;
        let fire_time = ReminderFireTime::new(time);
        let next = compute_next_fire_at(&fire_time, now, fixed);
        let local = next.with_timezone(&fixed);

        prop_assert_eq!(local.time().hour(), fire_time.time().hour());
        prop_assert_eq!(local.time().minute(), fire_time.time().minute());
        prop_assert_eq!(local.time().second(), 0);
        prop_assert!(next - now <= Duration::hours(24));
    }
}
