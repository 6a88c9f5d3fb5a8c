use time::{
    Date, Duration, Month, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::Error;

/// The date format used by date inputs in forms.
pub const FORM_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date from a form field in the `YYYY-MM-DD` format.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if `raw` is not a valid date in that format.
pub fn parse_form_date(raw: &str) -> Result<Date, Error> {
    Date::parse(raw.trim(), FORM_DATE_FORMAT).map_err(|_| Error::InvalidDateFormat(raw.to_owned()))
}

/// A half-open span of time, `start <= t < end_exclusive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: PrimitiveDateTime,
    pub end_exclusive: PrimitiveDateTime,
}

impl DateRange {
    /// The span from the start of `first` to the end of `last`.
    pub fn from_dates(first: Date, last: Date) -> Self {
        Self {
            start: first.midnight(),
            end_exclusive: last.midnight() + Duration::days(1),
        }
    }

    pub fn contains(&self, date_time: PrimitiveDateTime) -> bool {
        self.start <= date_time && date_time < self.end_exclusive
    }
}

/// Which transactions to show in the transaction listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    /// The calendar day of "now".
    Today,
    /// The calendar month of "now".
    Month,
    /// From the start of `start` to the end of `end`.
    Custom { start: Date, end: Date },
}

impl DateFilter {
    /// Read a filter from the query parameters of the transaction listing.
    ///
    /// Unknown filter names, and custom filters missing either date, show everything.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateFormat] if a custom filter has a date that is not `YYYY-MM-DD`.
    pub fn parse(
        filter_by: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, Error> {
        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.filter(|value| !value.trim().is_empty())
        }

        match filter_by.map(str::trim).unwrap_or_default() {
            "today" => Ok(DateFilter::Today),
            "month" => Ok(DateFilter::Month),
            "custom" => match (non_empty(start_date), non_empty(end_date)) {
                (Some(start), Some(end)) => Ok(DateFilter::Custom {
                    start: parse_form_date(start)?,
                    end: parse_form_date(end)?,
                }),
                _ => Ok(DateFilter::All),
            },
            _ => Ok(DateFilter::All),
        }
    }

    /// The name used for the filter in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Today => "today",
            DateFilter::Month => "month",
            DateFilter::Custom { .. } => "custom",
        }
    }

    /// The span of time the filter selects relative to `now`, or `None` for everything.
    pub fn range(&self, now: PrimitiveDateTime) -> Option<DateRange> {
        match *self {
            DateFilter::All => None,
            DateFilter::Today => Some(DateRange::from_dates(now.date(), now.date())),
            DateFilter::Month => {
                let first = now.date().replace_day(1).ok()?;
                let next_month = if now.month() == Month::December {
                    Date::from_calendar_date(now.year() + 1, Month::January, 1)
                } else {
                    Date::from_calendar_date(now.year(), now.month().next(), 1)
                }
                .ok()?;

                Some(DateRange {
                    start: first.midnight(),
                    end_exclusive: next_month.midnight(),
                })
            }
            DateFilter::Custom { start, end } => Some(DateRange::from_dates(start, end)),
        }
    }
}

#[cfg(test)]
mod date_filter_tests {
    use time::macros::{date, datetime};

    use crate::Error;

    use super::{DateFilter, DateRange};

    #[test]
    fn custom_range_includes_whole_end_date() {
        let filter = DateFilter::parse(Some("custom"), Some("2024-01-01"), Some("2024-01-31"))
            .unwrap();
        let range = filter.range(datetime!(2024-06-01 12:00)).unwrap();

        assert!(range.contains(datetime!(2024-01-01 00:00)));
        assert!(range.contains(datetime!(2024-01-31 23:59)));
        assert!(!range.contains(datetime!(2024-02-01 00:00)));
        assert!(!range.contains(datetime!(2023-12-31 23:59)));
    }

    #[test]
    fn invalid_custom_date_is_rejected() {
        let result = DateFilter::parse(Some("custom"), Some("2024-13-01"), Some("2024-01-31"));

        assert_eq!(result, Err(Error::InvalidDateFormat("2024-13-01".to_owned())));

        let result = DateFilter::parse(Some("custom"), Some("2024-01-01"), Some("31/01/2024"));

        assert_eq!(result, Err(Error::InvalidDateFormat("31/01/2024".to_owned())));
    }

    #[test]
    fn custom_without_both_dates_shows_everything() {
        assert_eq!(
            DateFilter::parse(Some("custom"), Some("2024-01-01"), None),
            Ok(DateFilter::All)
        );
        assert_eq!(
            DateFilter::parse(Some("custom"), Some(""), Some("2024-01-01")),
            Ok(DateFilter::All)
        );
        assert_eq!(
            DateFilter::parse(Some("custom"), Some("2024-01-01"), Some("   ")),
            Ok(DateFilter::All)
        );
    }

    #[test]
    fn custom_dates_are_trimmed() {
        assert_eq!(
            DateFilter::parse(Some(" custom "), Some(" 2024-01-01"), Some("2024-01-31 ")),
            Ok(DateFilter::Custom {
                start: date!(2024 - 01 - 01),
                end: date!(2024 - 01 - 31),
            })
        );
    }

    #[test]
    fn unknown_or_missing_filter_shows_everything() {
        assert_eq!(DateFilter::parse(None, None, None), Ok(DateFilter::All));
        assert_eq!(DateFilter::parse(Some("year"), None, None), Ok(DateFilter::All));
        assert_eq!(DateFilter::All.range(datetime!(2024-06-01 12:00)), None);
    }

    #[test]
    fn today_matches_calendar_date_of_now() {
        let range = DateFilter::Today.range(datetime!(2024-06-15 18:30)).unwrap();

        assert_eq!(range, DateRange::from_dates(date!(2024-06-15), date!(2024-06-15)));
        assert!(range.contains(datetime!(2024-06-15 00:00)));
        assert!(range.contains(datetime!(2024-06-15 23:59:59)));
        assert!(!range.contains(datetime!(2024-06-16 00:00)));
    }

    #[test]
    fn month_matches_year_and_month_of_now() {
        let range = DateFilter::Month.range(datetime!(2024-12-15 18:30)).unwrap();

        assert!(range.contains(datetime!(2024-12-01 00:00)));
        assert!(range.contains(datetime!(2024-12-31 23:59)));
        assert!(!range.contains(datetime!(2025-01-01 00:00)));
        assert!(!range.contains(datetime!(2023-12-15 12:00)));
    }
}
