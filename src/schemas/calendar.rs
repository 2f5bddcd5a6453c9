use serde::{Deserialize, Serialize};
use time::Date;

use crate::core::time::format_date;
use crate::schemas::task::TaskSummary;
use crate::services::calendar::{CalendarView, DayBucket, MonthCell};
use crate::db::models::Task;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarQuery {
    #[serde(default)]
    pub(crate) offset: Option<i32>,
    #[serde(default)]
    pub(crate) tz_offset_minutes: Option<i32>,
    #[serde(default)]
    pub(crate) target: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarDay {
    pub(crate) date: String,
    pub(crate) weekday: String,
    pub(crate) tasks: Vec<TaskSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarCell {
    pub(crate) date: Option<String>,
    pub(crate) day: Option<u8>,
    pub(crate) in_week: bool,
    pub(crate) is_today: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarMonth {
    pub(crate) year: i32,
    pub(crate) month: u8,
    pub(crate) label: String,
    pub(crate) rows: Vec<Vec<CalendarCell>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarPayload {
    pub(crate) today: String,
    pub(crate) week_offset: i32,
    pub(crate) week_range: String,
    pub(crate) focus_index: Option<usize>,
    pub(crate) days: Vec<CalendarDay>,
    pub(crate) month: CalendarMonth,
}

impl CalendarPayload {
    pub(crate) fn build(
        today: Date,
        view: CalendarView,
        buckets: Vec<DayBucket<Task>>,
        target: Option<Date>,
    ) -> Self {
        let focus_index =
            target.and_then(|target| buckets.iter().position(|bucket| bucket.date == target));

        let days = buckets
            .into_iter()
            .map(|bucket| CalendarDay {
                date: format_date(bucket.date),
                weekday: bucket.date.weekday().to_string(),
                tasks: bucket.items.into_iter().map(TaskSummary::from_db).collect(),
            })
            .collect();

        let month = view.month();
        let rows = month
            .rows
            .iter()
            .map(|row| row.iter().map(cell).collect())
            .collect();

        Self {
            today: format_date(today),
            week_offset: view.week_offset(),
            week_range: view.week_range_label(),
            focus_index,
            days,
            month: CalendarMonth {
                year: month.year,
                month: u8::from(month.month),
                label: format!("{} {}", month.month, month.year),
                rows,
            },
        }
    }
}

fn cell(cell: &MonthCell) -> CalendarCell {
    CalendarCell {
        date: cell.date.map(format_date),
        day: cell.date.map(|date| date.day()),
        in_week: cell.in_week,
        is_today: cell.is_today,
    }
}
