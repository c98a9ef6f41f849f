//! Unit tests for interval to cron conversion

use cron::Schedule;
use std::str::FromStr;
use stockwatch::core::scheduler::interval_to_cron;
use stockwatch::error::SchedulerError;

#[test]
fn sub_minute_intervals_tick_on_seconds() {
    assert_eq!(interval_to_cron(30).unwrap(), "*/30 * * * * *");
    assert_eq!(interval_to_cron(1).unwrap(), "*/1 * * * * *");
}

#[test]
fn whole_minutes_tick_on_minutes() {
    assert_eq!(interval_to_cron(60).unwrap(), "0 */1 * * * *");
    assert_eq!(interval_to_cron(900).unwrap(), "0 */15 * * * *");
}

#[test]
fn whole_hours_tick_on_hours() {
    assert_eq!(interval_to_cron(3600).unwrap(), "0 0 */1 * * *");
    assert_eq!(interval_to_cron(7200).unwrap(), "0 0 */2 * * *");
    assert_eq!(interval_to_cron(86_400).unwrap(), "0 0 0 * * *");
}

#[test]
fn zero_interval_is_rejected() {
    assert!(matches!(interval_to_cron(0), Err(SchedulerError::ZeroInterval)));
}

#[test]
fn ragged_intervals_are_rejected() {
    assert!(matches!(
        interval_to_cron(90),
        Err(SchedulerError::UnsupportedInterval(90))
    ));
    assert!(matches!(
        interval_to_cron(5400),
        Err(SchedulerError::UnsupportedInterval(5400))
    ));
    assert!(matches!(
        interval_to_cron(172_800),
        Err(SchedulerError::UnsupportedInterval(172_800))
    ));
}

#[test]
fn steps_that_do_not_divide_their_field_are_rejected() {
    for interval in [45, 7, 2700, 420, 18_000, 25_200] {
        assert!(
            matches!(
                interval_to_cron(interval),
                Err(SchedulerError::UnsupportedInterval(i)) if i == interval
            ),
            "{}s should be rejected",
            interval
        );
    }
}

#[test]
fn accepted_schedules_tick_evenly() {
    for interval in [5, 20, 60, 300, 900, 1200, 3600, 10_800, 43_200] {
        let schedule = Schedule::from_str(&interval_to_cron(interval).unwrap()).unwrap();
        let ticks: Vec<_> = schedule.upcoming(chrono::Utc).take(8).collect();
        for pair in ticks.windows(2) {
            assert_eq!(
                (pair[1] - pair[0]).num_seconds(),
                interval as i64,
                "{}s schedule ticks unevenly",
                interval
            );
        }
    }
}

#[test]
fn generated_expressions_parse() {
    for interval in [5, 30, 60, 300, 900, 1800, 3600, 21_600, 86_400] {
        let expr = interval_to_cron(interval).unwrap();
        assert!(
            Schedule::from_str(&expr).is_ok(),
            "{} should parse as cron",
            expr
        );
    }
}
