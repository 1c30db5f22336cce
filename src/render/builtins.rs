//! Time and identity sources behind the `{{now}}` and `{{uuid}}` built-ins.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `id-1`, `id-2`, … in call order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("id-{}", n)
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ`, sub-seconds dropped.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.with_nanosecond(0)
        .unwrap_or(dt)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
