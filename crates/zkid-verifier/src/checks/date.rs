use chrono::{Duration, NaiveDate};
use zkid_types::{
    ClaimKind, ClaimValue, ConstraintError, ConstraintKind, DateCommittedInputs, ErrorReport,
    FieldKey, IdField, QueryResult,
};

use super::{check_current_date, day_of, fail, passed};

/// Birthdate and expiry claims prove `min <= date <= max`, compared by
/// calendar day. A zero bound is the epoch and means unbounded.
pub fn check_date(
    kind: ClaimKind,
    inputs: &DateCommittedInputs,
    result: &QueryResult,
    today: NaiveDate,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    let (field, key, label) = match kind {
        ClaimKind::ExpiryDate => (IdField::ExpiryDate, FieldKey::ExpiryDate, "expiry date"),
        _ => (IdField::Birthdate, FieldKey::Birthdate, "birthdate"),
    };
    let title = capitalize(label);
    let min = day_of(inputs.min_date);
    let max = day_of(inputs.max_date);
    let unbounded = day_of(0);

    let Some(dates) = result.field(field) else {
        fail(
            &mut report,
            key,
            ConstraintKind::Missing,
            ConstraintError::new(format!("{} is not set in the query result", title)),
        );
        check_current_date(&mut report, key, inputs.current_date, today);
        return report;
    };

    let mut compare = |kind: ConstraintKind,
                       expected: &ClaimValue,
                       committed: Option<NaiveDate>,
                       shift: i64,
                       relation: &str| {
        let expected_day = expected.as_date().map(|d| d + Duration::days(shift));
        if expected_day.is_none() || expected_day != committed {
            fail(
                &mut report,
                key,
                kind,
                ConstraintError::new(format!("{} is not {} the expected {}", title, relation, label))
                    .expected(expected)
                    .received(show(committed)),
            );
        }
    };

    if let Some(expected) = passed(&dates.gte) {
        compare(ConstraintKind::Gte, expected, min, 0, "greater than or equal to");
    }
    if let Some(expected) = passed(&dates.gt) {
        compare(ConstraintKind::Gt, expected, min, 1, "greater than");
    }
    if let Some(expected) = passed(&dates.lte) {
        compare(ConstraintKind::Lte, expected, max, 0, "less than or equal to");
    }
    if let Some(expected) = passed(&dates.lt) {
        compare(ConstraintKind::Lt, expected, max, -1, "less than");
    }
    if let Some(expected) = passed(&dates.eq) {
        let exact_day = if min == max { min } else { None };
        compare(ConstraintKind::Eq, expected, exact_day, 0, "equal to");
    }

    if let Some((lower, upper)) = passed(&dates.range) {
        if lower.as_date() != min || upper.as_date() != max || min.is_none() {
            fail(
                &mut report,
                key,
                ConstraintKind::Range,
                ConstraintError::new(format!("{} is not in the expected range", title))
                    .expected(format!("[{}, {}]", lower, upper))
                    .received(format!("[{}, {}]", show(min), show(max))),
            );
        }
    }

    let exact = dates.eq.is_some() || dates.range.is_some();
    if !exact && dates.lte.is_none() && dates.lt.is_none() && max != unbounded {
        fail(
            &mut report,
            key,
            ConstraintKind::Disclose,
            ConstraintError::new(format!("Maximum {} should be equal to default date value", label))
                .expected(show(unbounded))
                .received(show(max)),
        );
    }
    if !exact && dates.gte.is_none() && dates.gt.is_none() && min != unbounded {
        fail(
            &mut report,
            key,
            ConstraintKind::Disclose,
            ConstraintError::new(format!("Minimum {} should be equal to default date value", label))
                .expected(show(unbounded))
                .received(show(min)),
        );
    }

    check_current_date(&mut report, key, inputs.current_date, today);
    report
}

fn show(day: Option<NaiveDate>) -> String {
    day.map(|d| d.to_string()).unwrap_or_else(|| "invalid date".to_string())
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::{ExpectedResult, FieldResult};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn inputs(min_date: i64, max_date: i64) -> DateCommittedInputs {
        DateCommittedInputs {
            min_date,
            max_date,
            current_date: ts(2025, 3, 10),
        }
    }

    fn ok(date: &str) -> Option<ExpectedResult<ClaimValue>> {
        Some(ExpectedResult {
            expected: ClaimValue::from(date),
            result: true,
        })
    }

    #[test]
    fn test_expiry_gte_today() {
        let result = QueryResult::default().with_field(
            IdField::ExpiryDate,
            FieldResult {
                gte: ok("2025-03-10"),
                ..Default::default()
            },
        );
        let report = check_date(ClaimKind::ExpiryDate, &inputs(ts(2025, 3, 10), 0), &result, today());
        assert!(report.is_empty(), "{:?}", report);

        let report = check_date(ClaimKind::ExpiryDate, &inputs(ts(2025, 3, 9), 0), &result, today());
        assert_eq!(
            report.errors(FieldKey::ExpiryDate, ConstraintKind::Gte)[0].message,
            "Expiry date is not greater than or equal to the expected expiry date"
        );
    }

    #[test]
    fn test_birthdate_range() {
        let result = QueryResult::default().with_field(
            IdField::Birthdate,
            FieldResult {
                range: Some(ExpectedResult {
                    expected: (ClaimValue::from("1980-01-01"), ClaimValue::from("1999-12-31")),
                    result: true,
                }),
                ..Default::default()
            },
        );
        let committed = inputs(ts(1980, 1, 1), ts(1999, 12, 31));
        assert!(check_date(ClaimKind::Birthdate, &committed, &result, today()).is_empty());

        let shifted = inputs(ts(1980, 1, 2), ts(1999, 12, 31));
        assert!(check_date(ClaimKind::Birthdate, &shifted, &result, today())
            .has(FieldKey::Birthdate, ConstraintKind::Range));
    }

    #[test]
    fn test_lt_is_day_before_max() {
        let result = QueryResult::default().with_field(
            IdField::Birthdate,
            FieldResult {
                lt: ok("2007-03-10"),
                ..Default::default()
            },
        );
        assert!(check_date(ClaimKind::Birthdate, &inputs(0, ts(2007, 3, 9)), &result, today()).is_empty());
        assert!(!check_date(ClaimKind::Birthdate, &inputs(0, ts(2007, 3, 10)), &result, today()).is_empty());
    }

    #[test]
    fn test_unbounded_must_be_default() {
        let result = QueryResult::default().with_field(
            IdField::Birthdate,
            FieldResult {
                lte: ok("2007-03-10"),
                ..Default::default()
            },
        );
        let report = check_date(ClaimKind::Birthdate, &inputs(ts(1950, 1, 1), ts(2007, 3, 10)), &result, today());
        assert_eq!(
            report.errors(FieldKey::Birthdate, ConstraintKind::Disclose)[0].message,
            "Minimum birthdate should be equal to default date value"
        );
    }

    #[test]
    fn test_missing_field() {
        let report = check_date(ClaimKind::Birthdate, &inputs(0, 0), &QueryResult::default(), today());
        assert_eq!(
            report.errors(FieldKey::Birthdate, ConstraintKind::Missing)[0].message,
            "Birthdate is not set in the query result"
        );
    }
}
