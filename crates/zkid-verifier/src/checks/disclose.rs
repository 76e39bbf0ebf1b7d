use chrono::NaiveDate;
use zkid_types::{
    ClaimValue, ConstraintError, ConstraintKind, DiscloseCommittedInputs, ErrorReport, FieldKey,
    IdField, QueryResult,
};

use super::{fail, passed};
use crate::disclosed::{normalize_name, DisclosedData, DocumentLayout};

const DISCLOSABLE: [(IdField, &str); 10] = [
    (IdField::DocumentType, "Document type"),
    (IdField::Birthdate, "Birthdate"),
    (IdField::ExpiryDate, "Expiry date"),
    (IdField::Nationality, "Nationality"),
    (IdField::DocumentNumber, "Document number"),
    (IdField::Gender, "Gender"),
    (IdField::IssuingCountry, "Issuing country"),
    (IdField::Fullname, "Fullname"),
    (IdField::Firstname, "Firstname"),
    (IdField::Lastname, "Lastname"),
];

enum Revealed {
    Text(String),
    Name(String),
    Date(NaiveDate),
}

impl Revealed {
    fn matches(&self, value: &ClaimValue) -> bool {
        match self {
            Revealed::Text(text) => value.as_text() == *text,
            Revealed::Name(name) => normalize_name(&value.as_text()) == normalize_name(name),
            Revealed::Date(date) => value.as_date() == Some(*date),
        }
    }

    fn describe(&self) -> String {
        match self {
            Revealed::Text(s) | Revealed::Name(s) => s.clone(),
            Revealed::Date(d) => d.to_string(),
        }
    }
}

fn revealed(data: &DisclosedData, field: IdField) -> Option<Revealed> {
    match field {
        IdField::DocumentType => data.document_type.clone().map(Revealed::Text),
        IdField::Birthdate => data.date_of_birth.map(Revealed::Date),
        IdField::ExpiryDate => data.date_of_expiry.map(Revealed::Date),
        IdField::Nationality => data.nationality.clone().map(Revealed::Text),
        IdField::DocumentNumber => data.document_number.clone().map(Revealed::Text),
        IdField::Gender => data.gender.clone().map(Revealed::Text),
        IdField::IssuingCountry => data.issuing_country.clone().map(Revealed::Text),
        IdField::Fullname => data.fullname.clone().map(Revealed::Name),
        // A name with no `<<` separator has no first name part.
        IdField::Firstname => data
            .firstname
            .clone()
            .or_else(|| data.fullname.clone())
            .map(Revealed::Name),
        IdField::Lastname => data.lastname.clone().map(Revealed::Name),
        IdField::Age => None,
    }
}

/// Compares disclosed MRZ bytes against the values the holder reported.
///
/// The bytes are read with both document layouts and a value passes when
/// either reading agrees with it.
pub fn check_disclose(inputs: &DiscloseCommittedInputs, result: &QueryResult, today: NaiveDate) -> ErrorReport {
    let mut report = ErrorReport::new();
    let passport = DisclosedData::decode(&inputs.disclosed_bytes, DocumentLayout::Passport, today);
    let id_card = DisclosedData::decode(&inputs.disclosed_bytes, DocumentLayout::IdCard, today);

    for (field, title) in DISCLOSABLE {
        let Some(reported) = result.field(field) else {
            continue;
        };
        let key = FieldKey::from(field);
        let label = title.to_lowercase();
        let readings: Vec<Revealed> = [revealed(&passport, field), revealed(&id_card, field)]
            .into_iter()
            .flatten()
            .collect();
        let agrees = |value: &ClaimValue| readings.iter().any(|r| r.matches(value));
        let received = readings
            .first()
            .map(Revealed::describe)
            .unwrap_or_else(|| "undisclosed".to_string());

        if let Some(expected) = passed(&reported.eq) {
            if !readings.is_empty() && !agrees(expected) {
                fail(
                    &mut report,
                    key,
                    ConstraintKind::Eq,
                    ConstraintError::new(format!("{} does not match the expected {}", title, label))
                        .expected(expected)
                        .received(&received),
                );
            }
        }

        if let Some(disclosed) = &reported.disclose {
            if !agrees(&disclosed.result) {
                fail(
                    &mut report,
                    key,
                    ConstraintKind::Disclose,
                    ConstraintError::new(format!(
                        "{} does not match the disclosed {} in query result",
                        title, label
                    ))
                    .expected(&disclosed.result)
                    .received(&received),
                );
            }
        }
    }
    report
}
