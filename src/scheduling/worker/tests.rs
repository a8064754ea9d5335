use super::*;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;

use crate::reminder::{ReminderFireTime, UserId};
use crate::scheduling::DeliveryError;
use crate::storage::{InMemoryReminderStorage, InMemoryTaskStorage, NewReminder, NewTask};
use crate::task::TaskRecord;

type SentMessages = Arc<Mutex<Vec<(UserId, String)>>>;

struct TestDeliveryChannel {
    sent: SentMessages,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport(anyhow::anyhow!(
                "simulated transport failure"
            )));
        }
        self.sent.lock().unwrap().push((user_id, text.to_owned()));
        Ok(())
    }
}

struct HangingDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for HangingDeliveryChannel {
    async fn send_message(&self, _user_id: UserId, _text: &str) -> Result<(), DeliveryError> {
        std::future::pending().await
    }
}

struct TestContext {
    reminders: Arc<InMemoryReminderStorage>,
    tasks: Arc<InMemoryTaskStorage>,
    sent: SentMessages,
    fail: Arc<AtomicBool>,
    firing_loop: FiringLoop,
}

impl TestContext {
    fn new() -> Self {
        let reminders = Arc::new(InMemoryReminderStorage::new());
        let tasks = Arc::new(InMemoryTaskStorage::new());
        let sent: SentMessages = Arc::new(Mutex::new(Vec::new()));
        let fail = Arc::new(AtomicBool::new(false));
        let delivery = Arc::new(TestDeliveryChannel {
            sent: sent.clone(),
            fail: fail.clone(),
        });
        let firing_loop = FiringLoop::new(
            reminders.clone(),
            tasks.clone(),
            delivery,
            Duration::from_secs(45),
        );

        Self {
            reminders,
            tasks,
            sent,
            fail,
            firing_loop,
        }
    }

    async fn seed_task(&self, user_id: UserId, title: &str) -> TaskRecord {
        self.tasks
            .insert(NewTask {
                user_id,
                task: Task {
                    title: title.to_owned(),
                    due_date: None,
                },
            })
            .await
            .unwrap()
    }

    async fn seed_reminder(
        &self,
        user_id: UserId,
        task_id: i64,
        next_fire_at: DateTime<Utc>,
    ) -> Reminder {
        self.reminders
            .insert(NewReminder {
                user_id,
                task_id,
                fire_time: ReminderFireTime::parse("09:00").unwrap(),
                next_fire_at,
            })
            .await
            .unwrap()
    }
}

fn utc(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

#[tokio::test]
async fn due_reminder_is_delivered_once_and_removed() {
    let ctx = TestContext::new();
    let now = utc("2024-01-01T09:00:00Z");
    let record = ctx.seed_task(1, "Купить хлеб").await;
    ctx.seed_reminder(1, record.id, now - ChronoDuration::minutes(1)).await;

    ctx.firing_loop.poll_and_fire(now).await.unwrap();

    let sent = ctx.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 1);
    assert!(sent[0].1.contains("Купить хлеб"));

    // One-shot: delivered reminders do not come back.
    assert!(ctx.reminders.get_due(now).await.unwrap().is_empty());
    ctx.firing_loop.poll_and_fire(now).await.unwrap();
    assert_eq!(ctx.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn future_reminder_is_left_alone() {
    let ctx = TestContext::new();
    let now = utc("2024-01-01T09:00:00Z");
    let record = ctx.seed_task(1, "Позвонить маме").await;
    ctx.seed_reminder(1, record.id, now + ChronoDuration::hours(1)).await;

    ctx.firing_loop.poll_and_fire(now).await.unwrap();

    assert!(ctx.sent.lock().unwrap().is_empty());
    assert_eq!(ctx.reminders.list_active(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn orphaned_reminder_is_purged_without_delivery() {
    let ctx = TestContext::new();
    let now = utc("2024-01-01T09:00:00Z");
    ctx.seed_reminder(1, 777, now).await;

    ctx.firing_loop.poll_and_fire(now).await.unwrap();

    assert!(ctx.sent.lock().unwrap().is_empty());
    assert!(ctx.reminders.list_active(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_orphan_does_not_block_the_rest_of_the_cycle() {
    let ctx = TestContext::new();
    let now = utc("2024-01-01T09:00:00Z");
    // First reminder's task was deleted, second is intact.
    ctx.seed_reminder(1, 777, now - ChronoDuration::minutes(2)).await;
    let record = ctx.seed_task(1, "Сдать отчёт").await;
    ctx.seed_reminder(1, record.id, now - ChronoDuration::minutes(1)).await;

    ctx.firing_loop.poll_and_fire(now).await.unwrap();

    let sent = ctx.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Сдать отчёт"));
    assert!(ctx.reminders.list_active(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_delivery_keeps_the_reminder_for_retry() {
    let ctx = TestContext::new();
    let now = utc("2024-01-01T09:00:00Z");
    let record = ctx.seed_task(1, "Полить цветы").await;
    let reminder = ctx.seed_reminder(1, record.id, now).await;
    ctx.fail.store(true, Ordering::SeqCst);

    ctx.firing_loop.poll_and_fire(now).await.unwrap();

    assert!(ctx.sent.lock().unwrap().is_empty());
    let retained = ctx.reminders.list_active(1).await.unwrap();
    assert_eq!(retained.len(), 1);
    assert_eq!(retained[0].next_fire_at, reminder.next_fire_at);
    assert_eq!(retained[0].last_fired_at, None);

    // Reappears as due and goes through once the transport recovers.
    ctx.fail.store(false, Ordering::SeqCst);
    ctx.firing_loop
        .poll_and_fire(now + ChronoDuration::seconds(45))
        .await
        .unwrap();
    assert_eq!(ctx.sent.lock().unwrap().len(), 1);
    assert!(ctx.reminders.list_active(1).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_delivery_is_bounded_by_the_timeout() {
    let reminders = Arc::new(InMemoryReminderStorage::new());
    let tasks = Arc::new(InMemoryTaskStorage::new());
    let firing_loop = FiringLoop::new(
        reminders.clone(),
        tasks.clone(),
        Arc::new(HangingDeliveryChannel),
        Duration::from_secs(45),
    );

    let now = utc("2024-01-01T09:00:00Z");
    let record = tasks
        .insert(NewTask {
            user_id: 1,
            task: Task {
                title: "Задача".to_owned(),
                due_date: None,
            },
        })
        .await
        .unwrap();
    reminders
        .insert(NewReminder {
            user_id: 1,
            task_id: record.id,
            fire_time: ReminderFireTime::parse("09:00").unwrap(),
            next_fire_at: now,
        })
        .await
        .unwrap();

    // Completes instead of hanging forever, and the reminder is retained.
    firing_loop.poll_and_fire(now).await.unwrap();
    assert_eq!(reminders.list_active(1).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_polls_immediately_at_startup() {
    let ctx = TestContext::new();
    let record = ctx.seed_task(1, "Отправить письмо").await;
    ctx.seed_reminder(1, record.id, Utc::now()).await;

    let token = CancellationToken::new();
    let child = token.child_token();
    let firing_loop = ctx.firing_loop;
    let handle = tokio::spawn(async move { firing_loop.run(child).await });

    // Well under one poll interval; the startup poll has already fired it.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(ctx.sent.lock().unwrap().len(), 1);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn run_fires_on_cadence_and_stops_on_cancellation() {
    let ctx = TestContext::new();
    let record = ctx.seed_task(1, "Выучить Rust").await;
    ctx.seed_reminder(1, record.id, Utc::now()).await;

    let token = CancellationToken::new();
    let child = token.child_token();
    let firing_loop = ctx.firing_loop;
    let handle = tokio::spawn(async move { firing_loop.run(child).await });

    tokio::time::sleep(Duration::from_secs(46)).await;
    assert_eq!(ctx.sent.lock().unwrap().len(), 1);

    token.cancel();
    handle.await.unwrap();
}
