use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> Option<PrimitiveDateTime> {
    let utc = value.checked_to_offset(UtcOffset::UTC)?;
    Some(PrimitiveDateTime::new(utc.date(), utc.time()))
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_instant(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return to_primitive_utc(value);
    }

    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(value) = PrimitiveDateTime::parse(raw, with_seconds) {
        return Some(value);
    }

    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(value) = PrimitiveDateTime::parse(raw, without_seconds) {
        return Some(value);
    }

    parse_date(raw).map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
}

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(value) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(value);
    }

    OffsetDateTime::parse(raw, &Rfc3339).ok().map(|value| value.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(datetime!(2025-01-02 10:20:30)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_instant_normalizes_offsets_to_utc() {
        assert_eq!(
            parse_instant("2025-03-10T18:30:00+03:00"),
            Some(datetime!(2025-03-10 15:30:00))
        );
        assert_eq!(parse_instant("2025-03-10T15:30:00.000Z"), Some(datetime!(2025-03-10 15:30:00)));
    }

    #[test]
    fn parse_instant_rejects_offsets_past_the_last_date() {
        assert_eq!(parse_instant("9999-12-31T23:00:00-05:00"), None);
        assert_eq!(parse_instant("9999-12-31T23:00:00+05:00"), Some(datetime!(9999-12-31 18:00:00)));
    }

    #[test]
    fn parse_instant_accepts_local_forms() {
        assert_eq!(parse_instant("2025-03-10T09:15"), Some(datetime!(2025-03-10 09:15:00)));
        assert_eq!(parse_instant("2025-03-10"), Some(datetime!(2025-03-10 00:00:00)));
        assert_eq!(parse_instant(""), None);
        assert_eq!(parse_instant("next tuesday"), None);
    }

    #[test]
    fn parse_date_accepts_timestamps() {
        assert_eq!(parse_date("2001-07-04"), Some(date!(2001 - 07 - 04)));
        assert_eq!(parse_date("2001-07-04T00:00:00.000Z"), Some(date!(2001 - 07 - 04)));
        assert_eq!(format_date(date!(2001 - 07 - 04)), "2001-07-04");
    }
}
