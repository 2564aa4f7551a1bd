//! Daily job scheduler.
//!
//! Jobs are registered for a wall-clock time of day and run synchronously
//! from [`Scheduler::run_pending`]. [`Scheduler::run_forever`] polls once a
//! second and never returns. Nothing is persisted: a restart forgets every
//! job, and a job whose time passed while the loop was not running fires
//! once, not once per missed day.

use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use std::time::Duration;

use crate::config::DeliveryConfig;

/// Polling interval of [`Scheduler::run_forever`].
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Parses `HH:MM` or `HH:MM:SS` into a time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| anyhow!("invalid time of day '{}': expected HH:MM or HH:MM:SS", s))
}

struct Job {
    at: NaiveTime,
    next_run: NaiveDateTime,
    task: Box<dyn FnMut() + Send>,
}

/// First occurrence of `at` strictly after `now`.
fn next_occurrence(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        now.date()
            .checked_add_days(Days::new(1))
            .unwrap_or(now.date())
            .and_time(at)
    }
}

#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Registers `task` to run once a day at `at` (local time).
    pub fn every_day_at<F>(&mut self, at: &str, task: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.every_day_at_from(at, task, Local::now().naive_local())
    }

    /// Like [`every_day_at`](Self::every_day_at) with an explicit "now",
    /// which fixes the first run.
    pub fn every_day_at_from<F>(&mut self, at: &str, task: F, now: NaiveDateTime) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        let at = parse_time_of_day(at)?;
        self.jobs.push(Job {
            at,
            next_run: next_occurrence(at, now),
            task: Box::new(task),
        });
        Ok(())
    }

    /// Earliest upcoming run across all jobs.
    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.jobs.iter().map(|j| j.next_run).min()
    }

    /// Runs every due job against the current local time.
    pub fn run_pending(&mut self) -> usize {
        self.run_pending_at(Local::now().naive_local())
    }

    /// Runs every job due at `now` and reschedules it for its next
    /// occurrence after `now`. Returns how many jobs ran.
    pub fn run_pending_at(&mut self, now: NaiveDateTime) -> usize {
        let mut ran = 0;
        for job in self.jobs.iter_mut().filter(|j| j.next_run <= now) {
            (job.task)();
            job.next_run = next_occurrence(job.at, now);
            ran += 1;
        }
        ran
    }

    /// Blocks the calling thread forever, running due jobs once a second.
    pub fn run_forever(&mut self) {
        loop {
            self.run_pending();
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Stand-in for actual delivery: records the send as a log event.
pub fn send_content(email: &str, content: &str) {
    tracing::info!(%email, %content, "sending content");
}

/// Registers a daily job that sends `delivery.content` to `delivery.email`.
pub fn schedule_delivery(scheduler: &mut Scheduler, delivery: &DeliveryConfig) -> Result<()> {
    let email = delivery.email.clone();
    let content = delivery.content.clone();
    scheduler.every_day_at(&delivery.at, move || send_content(&email, &content))
}
