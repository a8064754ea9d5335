mod delivery;
mod engine;
mod worker;

pub use delivery::{DeliveryError, ReminderDeliveryChannel};
pub use engine::{SchedulingEngine, ScheduleError, compute_next_fire_at};
pub use worker::FiringLoop;
