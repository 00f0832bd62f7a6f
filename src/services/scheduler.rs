//! Weekly trigger for pairing cycles
//!
//! The engine never manages time itself. This loop wakes at the configured
//! local weekday and time, runs the cycle of the ISO week it woke in, and goes
//! back to sleep. Runs are serialised with the admin API through `run_lock`.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ScheduleSettings;
use crate::core::PairingEngine;
use crate::models::CycleId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("weekday must be 0 (Monday) to 6 (Sunday), got {0}")]
    InvalidWeekday(u8),

    #[error("invalid time of day {0:02}:{1:02}")]
    InvalidTime(u32, u32),

    #[error("invalid UTC offset of {0} hours")]
    InvalidOffset(i32),
}

fn weekday_from_index(index: u8) -> Result<Weekday, ScheduleError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(ScheduleError::InvalidWeekday(other)),
    }
}

/// First trigger strictly after `now`, in the schedule's local offset
pub fn next_run_after(
    now: DateTime<Utc>,
    schedule: &ScheduleSettings,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let offset = schedule
        .utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(ScheduleError::InvalidOffset(schedule.utc_offset_hours))?;
    let weekday = weekday_from_index(schedule.weekday)?;
    let time = NaiveTime::from_hms_opt(schedule.hour, schedule.minute, 0)
        .ok_or(ScheduleError::InvalidTime(schedule.hour, schedule.minute))?;

    let local_now = now.with_timezone(&offset);
    let today = local_now.date_naive();
    let days_ahead = (7 + i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
        % 7;

    let at = |days: i64| {
        offset
            .from_local_datetime(&(today + Duration::days(days)).and_time(time))
            .single()
            .ok_or(ScheduleError::InvalidOffset(schedule.utc_offset_hours))
    };

    let candidate = at(days_ahead)?;
    if candidate > local_now {
        Ok(candidate)
    } else {
        at(days_ahead + 7)
    }
}

/// Run the pairing cycle every week, forever
///
/// Returns only if the schedule itself is invalid. Cycle failures are logged
/// by the engine and the loop carries on to the next week.
pub async fn run_weekly(
    engine: PairingEngine,
    schedule: ScheduleSettings,
    run_lock: Arc<Mutex<()>>,
) -> Result<(), ScheduleError> {
    loop {
        let now = Utc::now();
        let next = next_run_after(now, &schedule)?;
        let wait = (next.with_timezone(&Utc) - now).to_std().unwrap_or_default();

        tracing::info!("Next pairing cycle scheduled at {}", next);
        tokio::time::sleep(wait).await;

        let cycle = CycleId::from_date(next.date_naive());
        let _guard = run_lock.lock().await;
        if engine.run_cycle(cycle).await.is_err() {
            tracing::warn!("Scheduled cycle {} failed; waiting for manual re-run", cycle);
        }
    }
}
