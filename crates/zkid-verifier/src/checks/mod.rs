//! Cross-checks between what a claim proof committed to and the query result
//! the holder reported.
//!
//! Each check returns the failures it found; an empty report means the
//! claim agrees with the query result.

mod age;
mod bind;
mod country;
mod date;
mod disclose;
mod facematch;
mod sanctions;

pub use age::check_age;
pub use bind::check_bind;
pub use country::check_country;
pub use date::check_date;
pub use disclose::check_disclose;
pub use facematch::{
    check_facematch, FacematchPolicy, APPLE_APP_ATTEST_ROOT_KEY_HASH, ZKPASSPORT_APP_ID_HASH,
};
pub use sanctions::check_sanctions;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use zkid_types::{
    Bytes32, ClaimKind, CommittedInput, ConstraintError, ConstraintKind, ErrorReport,
    ExpectedResult, FieldKey, IdField, Query, QueryResult,
};

/// Per-call settings the checks depend on.
#[derive(Clone, Copy, Debug)]
pub struct CheckContext<'a> {
    pub today: NaiveDate,
    pub dev_mode: bool,
    pub sanctions_root: Option<&'a Bytes32>,
    pub facematch: &'a FacematchPolicy,
}

/// Runs the query-result checks of one claim.
pub fn check_claim(
    kind: ClaimKind,
    input: &CommittedInput,
    result: &QueryResult,
    ctx: &CheckContext<'_>,
) -> ErrorReport {
    match (kind, input) {
        (ClaimKind::Disclose, CommittedInput::Disclose(d)) => check_disclose(d, result, ctx.today),
        (ClaimKind::Age, CommittedInput::Age(a)) => check_age(a, result, ctx.today),
        (ClaimKind::Birthdate | ClaimKind::ExpiryDate, CommittedInput::Date(d)) => {
            check_date(kind, d, result, ctx.today)
        }
        (kind, CommittedInput::Country(c)) if kind.is_country_check() => check_country(kind, c, result),
        (ClaimKind::Bind, CommittedInput::Bind(b)) => check_bind(b, result),
        (ClaimKind::SanctionsExclusion, CommittedInput::Sanctions(s)) => {
            check_sanctions(s, result, ctx.sanctions_root)
        }
        (ClaimKind::Facematch, CommittedInput::Facematch(f)) => {
            check_facematch(f, result, ctx.facematch, ctx.dev_mode)
        }
        _ => {
            let mut report = ErrorReport::new();
            fail(
                &mut report,
                claim_key(kind),
                ConstraintKind::Commitment,
                ConstraintError::new("Committed inputs do not match the claim kind").expected(kind),
            );
            report
        }
    }
}

/// Report key for failures of a claim kind.
pub fn claim_key(kind: ClaimKind) -> FieldKey {
    match kind {
        ClaimKind::Disclose => FieldKey::Disclose,
        ClaimKind::Age => FieldKey::Age,
        ClaimKind::Birthdate => FieldKey::Birthdate,
        ClaimKind::ExpiryDate => FieldKey::ExpiryDate,
        ClaimKind::NationalityInclusion | ClaimKind::NationalityExclusion => FieldKey::Nationality,
        ClaimKind::IssuingCountryInclusion | ClaimKind::IssuingCountryExclusion => {
            FieldKey::IssuingCountry
        }
        ClaimKind::Bind => FieldKey::Bind,
        ClaimKind::SanctionsExclusion => FieldKey::Sanctions,
        ClaimKind::Facematch => FieldKey::Facematch,
    }
}

/// Claims a query needs proved, each satisfied by any one of its kinds.
pub fn required_claims(query: &Query) -> Vec<(FieldKey, Vec<ClaimKind>)> {
    let mut required = Vec::new();
    for (field, constraint) in &query.fields {
        let bounded = constraint.gte.is_some()
            || constraint.gt.is_some()
            || constraint.lte.is_some()
            || constraint.lt.is_some()
            || constraint.range.is_some();
        let exact = constraint.eq.is_some() || constraint.disclose.unwrap_or(false);
        let key = FieldKey::from(*field);

        match field {
            IdField::Age => {
                if bounded || exact {
                    required.push((key, vec![ClaimKind::Age]));
                }
            }
            IdField::Birthdate | IdField::ExpiryDate => {
                let date_kind = if *field == IdField::Birthdate {
                    ClaimKind::Birthdate
                } else {
                    ClaimKind::ExpiryDate
                };
                if bounded {
                    required.push((key, vec![date_kind]));
                }
                if exact {
                    required.push((key, vec![ClaimKind::Disclose, date_kind]));
                }
            }
            IdField::Nationality | IdField::IssuingCountry => {
                let (inclusion, exclusion) = if *field == IdField::Nationality {
                    (ClaimKind::NationalityInclusion, ClaimKind::NationalityExclusion)
                } else {
                    (ClaimKind::IssuingCountryInclusion, ClaimKind::IssuingCountryExclusion)
                };
                if constraint.in_list.is_some() {
                    required.push((key, vec![inclusion]));
                }
                if constraint.out_list.is_some() {
                    required.push((key, vec![exclusion]));
                }
                if exact {
                    required.push((key, vec![ClaimKind::Disclose]));
                }
            }
            _ => {
                if exact {
                    required.push((key, vec![ClaimKind::Disclose]));
                }
            }
        }
    }
    if query.bind.is_some() {
        required.push((FieldKey::Bind, vec![ClaimKind::Bind]));
    }
    if query.sanctions.is_some() {
        required.push((FieldKey::Sanctions, vec![ClaimKind::SanctionsExclusion]));
    }
    if query.facematch.is_some() {
        required.push((FieldKey::Facematch, vec![ClaimKind::Facematch]));
    }
    required
}

/// Records a failure and logs it.
pub(crate) fn fail(report: &mut ErrorReport, key: FieldKey, kind: ConstraintKind, error: ConstraintError) {
    warn!("{} {:?}: {}", key, kind, error.message);
    report.record(key, kind, error);
}

/// Expected value of a constraint the holder reported as satisfied.
pub(crate) fn passed<T>(constraint: &Option<ExpectedResult<T>>) -> Option<&T> {
    constraint.as_ref().filter(|c| c.result).map(|c| &c.expected)
}

/// Calendar day (UTC) of a UNIX timestamp.
pub(crate) fn day_of(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|d| d.date_naive())
}

/// Claim proofs must be generated today or yesterday.
pub(crate) fn check_current_date(report: &mut ErrorReport, key: FieldKey, current_date: i64, today: NaiveDate) {
    let day = day_of(current_date);
    let yesterday = today.pred_opt();
    if day != Some(today) && day != yesterday {
        fail(
            report,
            key,
            ConstraintKind::Date,
            ConstraintError::new("Current date in the proof is too old")
                .expected(today)
                .received(day.map(|d| d.to_string()).unwrap_or_else(|| current_date.to_string())),
        );
    }
}

/// Seconds between `current_date` and the start of `today`.
pub(crate) fn age_of_date(current_date: i64, today: NaiveDate) -> i64 {
    let midnight = today
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc().timestamp())
        .unwrap_or(current_date);
    midnight - current_date
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::{
        ClaimConstraint, ClaimValue, FacematchMode, FacematchQuery, SanctionsQuery, SECONDS_PER_DAY,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn days(n: i64) -> i64 {
        n * SECONDS_PER_DAY
    }

    fn midnight(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
    }

    #[test]
    fn test_current_date_window() {
        let mut report = ErrorReport::new();
        check_current_date(&mut report, FieldKey::Age, midnight(today()), today());
        check_current_date(&mut report, FieldKey::Age, midnight(today()) - days(1), today());
        assert!(report.is_empty());

        check_current_date(&mut report, FieldKey::Age, midnight(today()) - days(2), today());
        assert_eq!(
            report.errors(FieldKey::Age, ConstraintKind::Date)[0].message,
            "Current date in the proof is too old"
        );
    }

    #[test]
    fn test_age_of_date() {
        assert_eq!(age_of_date(midnight(today()) - days(3), today()), days(3));
    }

    #[test]
    fn test_required_claims() {
        let query = Query::default()
            .with_field(
                IdField::Age,
                ClaimConstraint {
                    gte: Some(ClaimValue::Number(18)),
                    ..Default::default()
                },
            )
            .with_field(
                IdField::Nationality,
                ClaimConstraint {
                    out_list: Some(vec!["PRK".into()]),
                    disclose: Some(true),
                    ..Default::default()
                },
            )
            .with_field(
                IdField::Firstname,
                ClaimConstraint {
                    disclose: Some(false),
                    ..Default::default()
                },
            );
        let query = Query {
            sanctions: Some(SanctionsQuery::default()),
            facematch: Some(FacematchQuery { mode: FacematchMode::Regular }),
            ..query
        };

        let required = required_claims(&query);
        assert!(required.contains(&(FieldKey::Age, vec![ClaimKind::Age])));
        assert!(required.contains(&(FieldKey::Nationality, vec![ClaimKind::NationalityExclusion])));
        assert!(required.contains(&(FieldKey::Nationality, vec![ClaimKind::Disclose])));
        assert!(required.contains(&(FieldKey::Sanctions, vec![ClaimKind::SanctionsExclusion])));
        assert!(required.contains(&(FieldKey::Facematch, vec![ClaimKind::Facematch])));
        assert!(!required.iter().any(|(key, _)| *key == FieldKey::Firstname));
    }

    #[test]
    fn test_mismatched_input_is_reported() {
        let input = CommittedInput::Bind(zkid_types::BindCommittedInputs {
            data: Default::default(),
        });
        let ctx = CheckContext {
            today: today(),
            dev_mode: false,
            sanctions_root: None,
            facematch: &FacematchPolicy::default(),
        };
        let report = check_claim(ClaimKind::Age, &input, &QueryResult::default(), &ctx);
        assert!(report.has(FieldKey::Age, ConstraintKind::Commitment));
    }
}
