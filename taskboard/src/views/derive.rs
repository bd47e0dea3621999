//! Filtered and sorted task subsets.
//!
//! Every function here is pure: the same tasks, parameters and clock always
//! give the same answer, and the input slice is never reordered.

use std::cmp::Reverse;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use taskboard_proto::moment::Moment;
use taskboard_proto::task::Task;

use super::filters::{CompletedSort, DateFilter, FilterSet, SortOrder};

/// First instant of `date` in `tz`.
pub(crate) fn midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    Moment::Date(date).in_zone(tz)
}

/// `date` moved by `days`, saturating at the calendar's ends.
pub(crate) fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Ordering key: `createdAt`, then `created_at`, then `dueDate`, then epoch.
pub fn sort_key<Tz: TimeZone>(task: &Task, tz: &Tz) -> i64 {
    task.created_at
        .or(task.created_at_alt)
        .or(task.due_date)
        .map_or(0, |m| m.timestamp_millis_in(tz))
}

/// Whether a due moment falls inside `filter`'s window.
///
/// Windows are measured from local midnight `T0` of `now`'s date:
/// `today` is `[T0, T0+1d)`, `tomorrow` is `[T0+1d, T0+2d)`, `week` runs
/// from `T0` through the end of the seventh day after, and `month` is the
/// current calendar month.
pub fn due_in_window<Tz: TimeZone>(due: &Moment, filter: DateFilter, now: &DateTime<Tz>) -> bool {
    let tz = now.timezone();
    let today = now.date_naive();
    let at = due.in_zone(&tz);
    let bound = |days| midnight(shift_days(today, days), &tz);

    match filter {
        DateFilter::All => true,
        DateFilter::Today => at >= bound(0) && at < bound(1),
        DateFilter::Tomorrow => at >= bound(1) && at < bound(2),
        DateFilter::Week => at >= bound(0) && at < bound(8),
        DateFilter::Month => {
            let date = due.date_in(&tz);
            date.year() == today.year() && date.month() == today.month()
        }
    }
}

/// Whether `task` passes the date filter. Undated tasks only pass `all`.
pub fn matches_date<Tz: TimeZone>(task: &Task, filter: DateFilter, now: &DateTime<Tz>) -> bool {
    match (filter, &task.due_date) {
        (DateFilter::All, _) => true,
        (_, None) => false,
        (_, Some(due)) => due_in_window(due, filter, now),
    }
}

/// The dashboard: incomplete tasks passing `filters`, in the chosen order.
pub fn dashboard<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    filters: &FilterSet,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let tz = now.timezone();
    let mut keyed: Vec<(i64, &Task)> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter(|t| matches_date(t, filters.date, now))
        .filter(|t| filters.priority.admits(t.priority))
        .map(|t| (sort_key(t, &tz), t))
        .collect();

    match filters.sort {
        SortOrder::Newest => keyed.sort_by_key(|(k, _)| Reverse(*k)),
        SortOrder::Oldest => keyed.sort_by_key(|(k, _)| *k),
    }
    keyed.into_iter().map(|(_, t)| t).collect()
}

/// The completed view: completed tasks in the chosen order.
pub fn completed<'a, Tz: TimeZone>(tasks: &'a [Task], sort: CompletedSort, tz: &Tz) -> Vec<&'a Task> {
    let mut done: Vec<&Task> = tasks.iter().filter(|t| t.is_completed()).collect();
    match sort {
        CompletedSort::Newest => done.sort_by_key(|t| Reverse(sort_key(t, tz))),
        CompletedSort::Oldest => done.sort_by_key(|t| sort_key(t, tz)),
        CompletedSort::Priority => done.sort_by_key(|t| Reverse(t.priority.weight())),
    }
    done
}
