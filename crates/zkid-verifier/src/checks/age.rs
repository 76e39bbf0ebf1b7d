use chrono::NaiveDate;
use zkid_types::{
    AgeCommittedInputs, ConstraintError, ConstraintKind, ErrorReport, FieldKey, IdField, QueryResult,
};

use super::{check_current_date, fail, passed};

/// The age circuit proves `min <= age < max`, with 0 meaning unbounded.
pub fn check_age(inputs: &AgeCommittedInputs, result: &QueryResult, today: NaiveDate) -> ErrorReport {
    let mut report = ErrorReport::new();
    let key = FieldKey::Age;
    let min = inputs.min_age as i64;
    let max = inputs.max_age as i64;

    let Some(age) = result.field(IdField::Age) else {
        fail(
            &mut report,
            key,
            ConstraintKind::Missing,
            ConstraintError::new("Age is not set in the query result"),
        );
        check_current_date(&mut report, key, inputs.current_date, today);
        return report;
    };

    if let Some(expected) = passed(&age.gte) {
        if expected.as_i64() != Some(min) {
            fail(
                &mut report,
                key,
                ConstraintKind::Gte,
                ConstraintError::new("Age is not greater than or equal to the expected age")
                    .expected(expected)
                    .received(min),
            );
        }
    }
    if let Some(expected) = passed(&age.gt) {
        if expected.as_i64().map(|e| e + 1) != Some(min) {
            fail(
                &mut report,
                key,
                ConstraintKind::Gt,
                ConstraintError::new("Age is not greater than the expected age")
                    .expected(expected)
                    .received(min),
            );
        }
    }
    if let Some(expected) = passed(&age.lt) {
        if expected.as_i64() != Some(max) {
            fail(
                &mut report,
                key,
                ConstraintKind::Lt,
                ConstraintError::new("Age is not less than the expected age")
                    .expected(expected)
                    .received(max),
            );
        }
    }
    if let Some(expected) = passed(&age.lte) {
        if expected.as_i64().map(|e| e + 1) != Some(max) {
            fail(
                &mut report,
                key,
                ConstraintKind::Lte,
                ConstraintError::new("Age is not less than or equal to the expected age")
                    .expected(expected)
                    .received(max),
            );
        }
    }
    if let Some(expected) = passed(&age.eq) {
        if expected.as_i64() != Some(min) || min != max {
            fail(
                &mut report,
                key,
                ConstraintKind::Eq,
                ConstraintError::new("Age is not equal to the expected age")
                    .expected(expected)
                    .received(format!("[{}, {}]", min, max)),
            );
        }
    }
    if let Some((lower, upper)) = passed(&age.range) {
        if lower.as_i64() != Some(min) || upper.as_i64() != Some(max) {
            fail(
                &mut report,
                key,
                ConstraintKind::Range,
                ConstraintError::new("Age is not in the expected range")
                    .expected(format!("[{}, {}]", lower, upper))
                    .received(format!("[{}, {}]", min, max)),
            );
        }
    }

    let exact = age.eq.is_some() || age.range.is_some() || age.disclose.is_some();
    if !exact && age.lt.is_none() && age.lte.is_none() && max != 0 {
        fail(
            &mut report,
            key,
            ConstraintKind::Disclose,
            ConstraintError::new("Maximum age should be equal to 0").expected(0).received(max),
        );
    }
    if !exact && age.gte.is_none() && age.gt.is_none() && min != 0 {
        fail(
            &mut report,
            key,
            ConstraintKind::Disclose,
            ConstraintError::new("Minimum age should be equal to 0").expected(0).received(min),
        );
    }

    if let Some(disclosed) = &age.disclose {
        let value = disclosed.result.as_i64();
        if value != Some(min) || value != Some(max) {
            fail(
                &mut report,
                key,
                ConstraintKind::Disclose,
                ConstraintError::new("Age does not match the disclosed age in query result")
                    .expected(min)
                    .received(&disclosed.result),
            );
        }
    }

    check_current_date(&mut report, key, inputs.current_date, today);
    report
}
