use time::{Date, Duration, Month, PrimitiveDateTime, UtcOffset};

use crate::db::models::Task;

pub(crate) const DAYS_PER_WEEK: usize = 7;
pub(crate) const MAX_WEEK_OFFSET: i32 = 520;

pub(crate) trait Scheduled {
    fn deadline(&self) -> PrimitiveDateTime;
}

impl Scheduled for Task {
    fn deadline(&self) -> PrimitiveDateTime {
        self.deadline
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DayBucket<T> {
    pub(crate) date: Date,
    pub(crate) items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonthCell {
    pub(crate) date: Option<Date>,
    pub(crate) in_week: bool,
    pub(crate) is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MonthView {
    pub(crate) year: i32,
    pub(crate) month: Month,
    pub(crate) rows: Vec<[MonthCell; DAYS_PER_WEEK]>,
}

/// The Monday on or before `date`.
pub(crate) fn week_start(date: Date) -> Date {
    date.checked_sub(Duration::days(i64::from(date.weekday().number_days_from_monday())))
        .unwrap_or(Date::MIN)
}

pub(crate) fn week_dates(anchor: Date) -> [Date; DAYS_PER_WEEK] {
    let start = week_start(anchor);
    std::array::from_fn(|index| start.checked_add(Duration::days(index as i64)).unwrap_or(Date::MAX))
}

pub(crate) fn local_date(instant: PrimitiveDateTime, offset: UtcOffset) -> Date {
    instant.assume_utc().to_offset(offset).date()
}

/// Buckets items by the local calendar date of their deadline. Items outside
/// the week are dropped; each bucket keeps the input order.
pub(crate) fn group_by_week<T: Scheduled>(
    items: Vec<T>,
    week: &[Date; DAYS_PER_WEEK],
    offset: UtcOffset,
) -> Vec<DayBucket<T>> {
    let mut buckets: Vec<DayBucket<T>> =
        week.iter().map(|date| DayBucket { date: *date, items: Vec::new() }).collect();

    for item in items {
        let date = local_date(item.deadline(), offset);
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.date == date) {
            bucket.items.push(item);
        }
    }

    buckets
}

/// Sunday-first rows covering one month; cells outside the month are `None`.
pub(crate) fn month_grid(year: i32, month: Month) -> Vec<[Option<Date>; DAYS_PER_WEEK]> {
    let Ok(first) = Date::from_calendar_date(year, month, 1) else {
        return Vec::new();
    };
    let days = month.length(year);

    let mut rows = Vec::with_capacity(6);
    let mut row = [None; DAYS_PER_WEEK];
    let mut column = usize::from(first.weekday().number_days_from_sunday());

    for day in 0..days {
        row[column] = Some(first + Duration::days(i64::from(day)));
        column += 1;
        if column == DAYS_PER_WEEK {
            rows.push(row);
            row = [None; DAYS_PER_WEEK];
            column = 0;
        }
    }
    if column > 0 {
        rows.push(row);
    }

    rows
}

/// Week offset that brings `target` into view when `today` is at offset zero.
pub(crate) fn offset_for(today: Date, target: Date) -> i32 {
    ((week_start(target) - week_start(today)).whole_days() / 7) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CalendarView {
    today: Date,
    week_offset: i32,
}

impl CalendarView {
    pub(crate) fn new(today: Date, week_offset: i32) -> Self {
        Self { today, week_offset: week_offset.clamp(-MAX_WEEK_OFFSET, MAX_WEEK_OFFSET) }
    }

    /// `None` when `target` lies further than `MAX_WEEK_OFFSET` weeks away.
    pub(crate) fn focused_on(today: Date, target: Date) -> Option<Self> {
        let offset = offset_for(today, target);
        (offset.abs() <= MAX_WEEK_OFFSET).then(|| Self::new(today, offset))
    }

    pub(crate) fn week_offset(&self) -> i32 {
        self.week_offset
    }

    pub(crate) fn anchor(&self) -> Date {
        let fallback = if self.week_offset < 0 { Date::MIN } else { Date::MAX };
        self.today.checked_add(Duration::weeks(i64::from(self.week_offset))).unwrap_or(fallback)
    }

    pub(crate) fn week(&self) -> [Date; DAYS_PER_WEEK] {
        week_dates(self.anchor())
    }

    pub(crate) fn next_week(self) -> Self {
        Self::new(self.today, self.week_offset + 1)
    }

    pub(crate) fn previous_week(self) -> Self {
        Self::new(self.today, self.week_offset - 1)
    }

    pub(crate) fn month(&self) -> MonthView {
        let anchor = self.anchor();
        let week = self.week();

        let rows = month_grid(anchor.year(), anchor.month())
            .into_iter()
            .map(|row| {
                row.map(|date| MonthCell {
                    date,
                    in_week: date.is_some_and(|date| week.contains(&date)),
                    is_today: date == Some(self.today),
                })
            })
            .collect();

        MonthView { year: anchor.year(), month: anchor.month(), rows }
    }

    pub(crate) fn week_range_label(&self) -> String {
        let week = self.week();
        format!("{} - {}", short_date(week[0]), short_date(week[DAYS_PER_WEEK - 1]))
    }
}

fn short_date(date: Date) -> String {
    format!("{}/{}/{}", date.day(), u8::from(date.month()), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    struct Item(&'static str, PrimitiveDateTime);

    impl Scheduled for Item {
        fn deadline(&self) -> PrimitiveDateTime {
            self.1
        }
    }

    #[test]
    fn weeks_start_on_monday() {
        assert_eq!(week_start(date!(2025 - 07 - 09)), date!(2025 - 07 - 07));
        assert_eq!(week_start(date!(2025 - 07 - 07)), date!(2025 - 07 - 07));
        // Sunday belongs to the week that began the previous Monday.
        assert_eq!(week_start(date!(2025 - 07 - 13)), date!(2025 - 07 - 07));

        let week = week_dates(date!(2025 - 07 - 13));
        assert_eq!(week[0], date!(2025 - 07 - 07));
        assert_eq!(week[6], date!(2025 - 07 - 13));
    }

    #[test]
    fn week_crossing_a_year_boundary() {
        let week = week_dates(date!(2026 - 01 - 01));
        assert_eq!(week[0], date!(2025 - 12 - 29));
        assert_eq!(week[6], date!(2026 - 01 - 04));
    }

    #[test]
    fn grouping_uses_local_calendar_date() {
        let week = week_dates(date!(2025 - 07 - 09));
        let items = vec![
            Item("monday", datetime!(2025-07-07 08:00)),
            Item("late sunday utc", datetime!(2025-07-13 23:30)),
            Item("next week", datetime!(2025-07-14 10:00)),
            Item("wednesday", datetime!(2025-07-09 12:00)),
        ];

        let utc = group_by_week(items, &week, UtcOffset::UTC);
        assert_eq!(utc.len(), 7);
        assert_eq!(utc[0].items.iter().map(|item| item.0).collect::<Vec<_>>(), vec!["monday"]);
        assert_eq!(utc[2].items[0].0, "wednesday");
        assert_eq!(utc[6].items[0].0, "late sunday utc");

        let items = vec![Item("late sunday utc", datetime!(2025-07-13 23:30))];
        let ahead = group_by_week(items, &week, offset!(+2));
        assert!(ahead.iter().all(|bucket| bucket.items.is_empty()));

        let items = vec![Item("early monday utc", datetime!(2025-07-07 01:00))];
        let behind = group_by_week(items, &week, offset!(-5));
        assert!(behind.iter().all(|bucket| bucket.items.is_empty()));
    }

    #[test]
    fn month_grid_is_sunday_first_with_empty_edges() {
        let rows = month_grid(2025, Month::July);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0], None);
        assert_eq!(rows[0][1], None);
        assert_eq!(rows[0][2], Some(date!(2025 - 07 - 01)));
        assert_eq!(rows[4][4], Some(date!(2025 - 07 - 31)));
        assert_eq!(rows[4][5], None);
        assert_eq!(rows[4][6], None);
    }

    #[test]
    fn month_grid_without_padding() {
        let rows = month_grid(2026, Month::February);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.iter().all(Option::is_some)));
        assert_eq!(rows[0][0], Some(date!(2026 - 02 - 01)));
        assert_eq!(rows[3][6], Some(date!(2026 - 02 - 28)));
    }

    #[test]
    fn navigation_moves_by_whole_weeks() {
        let today = date!(2025 - 07 - 09);
        let view = CalendarView::new(today, 0);

        let next = view.next_week();
        assert_eq!(next.week()[0], date!(2025 - 07 - 14));
        assert_eq!(next.week()[6], date!(2025 - 07 - 20));

        let back = view.previous_week().previous_week();
        assert_eq!(back.week_offset(), -2);
        assert_eq!(back.week()[0], date!(2025 - 06 - 23));
        assert_eq!(back.next_week().next_week(), view);
    }

    #[test]
    fn offset_for_targets_the_week_containing_the_day() {
        let today = date!(2025 - 07 - 09);
        assert_eq!(offset_for(today, date!(2025 - 08 - 01)), 3);
        assert_eq!(offset_for(today, date!(2025 - 07 - 13)), 0);
        assert_eq!(offset_for(today, date!(2025 - 07 - 06)), -1);

        let view = CalendarView::focused_on(today, date!(2025 - 08 - 01)).expect("within range");
        assert!(view.week().contains(&date!(2025 - 08 - 01)));
    }

    #[test]
    fn far_targets_and_offsets_stay_in_range() {
        let today = date!(2026 - 10 - 19);
        assert_eq!(CalendarView::focused_on(today, date!(9999 - 12 - 31)), None);
        assert_eq!(CalendarView::focused_on(today, date!(0001 - 01 - 01)), None);

        let clamped = CalendarView::new(today, i32::MAX);
        assert_eq!(clamped.week_offset(), MAX_WEEK_OFFSET);
        assert_eq!(clamped.next_week().week_offset(), MAX_WEEK_OFFSET);
        assert_eq!(CalendarView::new(today, i32::MIN).week_offset(), -MAX_WEEK_OFFSET);

        let week = week_dates(Date::MAX);
        assert_eq!(week[DAYS_PER_WEEK - 1], Date::MAX);
        assert!(week.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn month_view_flags_today_and_visible_week() {
        let view = CalendarView::new(date!(2025 - 07 - 09), 0);
        let month = view.month();
        assert_eq!(month.month, Month::July);

        let cells: Vec<MonthCell> = month.rows.iter().flatten().copied().collect();
        let today: Vec<_> = cells.iter().filter(|cell| cell.is_today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].date, Some(date!(2025 - 07 - 09)));

        let in_week: Vec<_> = cells.iter().filter_map(|cell| cell.in_week.then_some(cell.date)).collect();
        assert_eq!(in_week.len(), 7);
        assert_eq!(in_week[0], Some(date!(2025 - 07 - 07)));

        let june = view.previous_week().previous_week().month();
        assert_eq!(june.month, Month::June);
        assert!(june.rows.iter().flatten().all(|cell| !cell.is_today));
    }

    #[test]
    fn week_range_label_is_day_month_year() {
        let view = CalendarView::new(date!(2025 - 07 - 09), 0);
        assert_eq!(view.week_range_label(), "7/7/2025 - 13/7/2025");
    }
}
