use zkid_types::{
    ClaimKind, ConstraintError, ConstraintKind, CountryCommittedInputs, ErrorReport, FieldKey,
    IdField, QueryResult,
};

use super::fail;

/// Inclusion and exclusion claims over nationality or issuing country.
///
/// Every country the holder reported must be in the committed list.
/// Exclusion lists must also be strictly ascending: the circuit proves
/// non-membership by locating the country between two sorted neighbours.
pub fn check_country(kind: ClaimKind, inputs: &CountryCommittedInputs, result: &QueryResult) -> ErrorReport {
    let mut report = ErrorReport::new();
    let (field, key, label) = match kind {
        ClaimKind::IssuingCountryInclusion | ClaimKind::IssuingCountryExclusion => {
            (IdField::IssuingCountry, FieldKey::IssuingCountry, "Issuing country")
        }
        _ => (IdField::Nationality, FieldKey::Nationality, "Nationality"),
    };
    let exclusion = kind.is_exclusion();
    let (constraint, noun) = if exclusion {
        (ConstraintKind::Out, "exclusion")
    } else {
        (ConstraintKind::In, "inclusion")
    };

    if exclusion && !is_strictly_ascending(&inputs.countries) {
        fail(
            &mut report,
            key,
            constraint,
            ConstraintError::new(format!(
                "The {} exclusion list has not been sorted, and thus the proof cannot be trusted",
                label.to_lowercase()
            )),
        );
    }

    let reported = result
        .field(field)
        .and_then(|r| if exclusion { r.out_list.as_ref() } else { r.in_list.as_ref() });
    let Some(reported) = reported else {
        fail(
            &mut report,
            key,
            ConstraintKind::Missing,
            ConstraintError::new(format!("{} {} is not set in the query result", label, noun)),
        );
        return report;
    };

    if reported.result {
        let expected = &reported.expected;
        let missing: Vec<&String> = expected
            .iter()
            .filter(|country| !inputs.countries.contains(*country))
            .collect();
        if !missing.is_empty() {
            fail(
                &mut report,
                key,
                constraint,
                ConstraintError::new(format!(
                    "{} {} list does not match the one from the query results",
                    label, noun
                ))
                .expected(expected.join(","))
                .received(inputs.countries.join(",")),
            );
        }
    }
    report
}

fn is_strictly_ascending(countries: &[String]) -> bool {
    countries.windows(2).all(|pair| pair[0] < pair[1])
}
