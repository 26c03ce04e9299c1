use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;

pub const DAYS_PER_WEEK: usize = 7;

/// How a reference date that already falls on a Monday is anchored.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// A Monday anchors to itself.
    #[default]
    OnOrAfter,
    /// A Monday anchors to the Monday one week later.
    StrictlyAfter,
}

/// Monday that labels the first grid column for `reference`.
///
/// Returns `None` only when the result would fall past the end of the
/// calendar supported by chrono.
pub fn next_monday(reference: NaiveDate, policy: AnchorPolicy) -> Option<NaiveDate> {
    let from_monday = u64::from(reference.weekday().num_days_from_monday());
    let offset = match (policy, from_monday) {
        (AnchorPolicy::OnOrAfter, 0) => 0,
        (_, days) => 7 - days,
    };
    reference.checked_add_days(Days::new(offset))
}

/// Column labels for the seven days starting at `anchor`, or `None` when the
/// week runs past the end of the calendar.
pub fn day_labels(anchor: NaiveDate) -> Option<[String; DAYS_PER_WEEK]> {
    let labels: Vec<String> = anchor
        .iter_days()
        .take(DAYS_PER_WEEK)
        .map(|date| date.format("%a %m/%d").to_string())
        .collect();
    labels.try_into().ok()
}
