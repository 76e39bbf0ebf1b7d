//! Decoding of the MRZ bytes revealed by a disclose proof.
//!
//! The disclose circuit exposes the 90 MRZ bytes of the document with every
//! undisclosed byte zeroed. The same bytes are read with both the passport
//! (TD3) and the ID card (TD1) layout, since the document type itself may be
//! hidden.

use chrono::{Datelike, NaiveDate};
use std::ops::Range;
use zkid_types::DISCLOSED_BYTES_LENGTH;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentLayout {
    Passport,
    IdCard,
}

struct MrzLayout {
    document_type: Range<usize>,
    issuing_country: Range<usize>,
    document_number: Range<usize>,
    date_of_birth: Range<usize>,
    gender: Range<usize>,
    date_of_expiry: Range<usize>,
    nationality: Range<usize>,
    name: Range<usize>,
}

const TD3: MrzLayout = MrzLayout {
    document_type: 0..2,
    issuing_country: 2..5,
    document_number: 44..53,
    date_of_birth: 57..63,
    gender: 64..65,
    date_of_expiry: 65..71,
    nationality: 54..57,
    name: 5..44,
};

const TD1: MrzLayout = MrzLayout {
    document_type: 0..2,
    issuing_country: 2..5,
    document_number: 5..14,
    date_of_birth: 30..36,
    gender: 37..38,
    date_of_expiry: 38..44,
    nationality: 45..48,
    name: 60..90,
};

impl DocumentLayout {
    fn mrz(&self) -> &'static MrzLayout {
        match self {
            DocumentLayout::Passport => &TD3,
            DocumentLayout::IdCard => &TD1,
        }
    }
}

/// Document attributes readable from the disclosed bytes. A field is `None`
/// when any of its bytes was withheld.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisclosedData {
    pub document_type: Option<String>,
    pub issuing_country: Option<String>,
    pub document_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub date_of_expiry: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub fullname: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl DisclosedData {
    /// `today` resolves the century of two-digit birth years.
    pub fn decode(bytes: &[u8], layout: DocumentLayout, today: NaiveDate) -> Self {
        if bytes.len() < DISCLOSED_BYTES_LENGTH {
            return Self::default();
        }
        let mrz = layout.mrz();

        let (firstname, lastname) = match field(bytes, &mrz.name) {
            Some(raw) => split_name(&raw),
            None => (None, None),
        };
        let fullname = match (&firstname, &lastname) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (None, Some(last)) => Some(last.clone()),
            (Some(first), None) => Some(first.clone()),
            (None, None) => None,
        };

        Self {
            document_type: field(bytes, &mrz.document_type).map(|t| document_type(&t).to_string()),
            issuing_country: field(bytes, &mrz.issuing_country).map(|c| strip_filler(&c)),
            document_number: field(bytes, &mrz.document_number).map(|n| strip_filler(&n)),
            date_of_birth: field(bytes, &mrz.date_of_birth)
                .and_then(|d| parse_mrz_date(&d, Century::Birth(today.year()))),
            gender: field(bytes, &mrz.gender).map(|g| gender(&g)),
            date_of_expiry: field(bytes, &mrz.date_of_expiry)
                .and_then(|d| parse_mrz_date(&d, Century::Expiry)),
            nationality: field(bytes, &mrz.nationality).map(|c| strip_filler(&c)),
            fullname,
            firstname,
            lastname,
        }
    }
}

/// Normalized form used to compare names: lowercase, `<` as space, single
/// spaces.
pub fn normalize_name(name: &str) -> String {
    name.replace('<', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn field(bytes: &[u8], range: &Range<usize>) -> Option<String> {
    let slice = &bytes[range.clone()];
    if slice.iter().any(|b| *b == 0) {
        return None;
    }
    Some(slice.iter().map(|b| *b as char).collect())
}

fn strip_filler(value: &str) -> String {
    value.trim_end_matches('<').replace('<', " ").trim().to_string()
}

fn document_type(code: &str) -> &'static str {
    match code.chars().next() {
        Some('P') => "passport",
        Some('I') | Some('A') | Some('C') => "id_card",
        _ => "other",
    }
}

fn gender(code: &str) -> String {
    match code {
        "<" => "X".to_string(),
        other => other.to_string(),
    }
}

/// `SURNAME<<GIVEN<NAMES`.
fn split_name(raw: &str) -> (Option<String>, Option<String>) {
    let raw = raw.trim_end_matches('<');
    let (last, first) = match raw.split_once("<<") {
        Some((last, first)) => (last, first),
        None => (raw, ""),
    };
    let clean = |s: &str| {
        let s = s.replace('<', " ").split_whitespace().collect::<Vec<_>>().join(" ");
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    };
    (clean(first), clean(last))
}

enum Century {
    Birth(i32),
    Expiry,
}

fn parse_mrz_date(yymmdd: &str, century: Century) -> Option<NaiveDate> {
    if yymmdd.len() != 6 || !yymmdd.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = yymmdd[0..2].parse().ok()?;
    let mm: u32 = yymmdd[2..4].parse().ok()?;
    let dd: u32 = yymmdd[4..6].parse().ok()?;
    let year = match century {
        Century::Birth(current_year) if 2000 + yy > current_year => 1900 + yy,
        _ => 2000 + yy,
    };
    NaiveDate::from_ymd_opt(year, mm, dd)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPORT_MRZ: &str = concat!(
        "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<",
        "L898902C36UTO7408122F1204159ZE184226B<<<<<10"
    );

    const ID_CARD_MRZ: &str = concat!(
        "I<UTOD231458907<<<<<<<<<<<<<<<",
        "7408122F1204159UTO<<<<<<<<<<<6",
        "ERIKSSON<<ANNA<MARIA<<<<<<<<<<"
    );

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn bytes(mrz: &str) -> Vec<u8> {
        let mut bytes = mrz.as_bytes().to_vec();
        bytes.resize(DISCLOSED_BYTES_LENGTH, 0);
        bytes
    }

    #[test]
    fn test_passport_layout() {
        let data = DisclosedData::decode(&bytes(PASSPORT_MRZ), DocumentLayout::Passport, today());
        assert_eq!(data.document_type.as_deref(), Some("passport"));
        assert_eq!(data.issuing_country.as_deref(), Some("UTO"));
        assert_eq!(data.document_number.as_deref(), Some("L898902C3"));
        assert_eq!(data.nationality.as_deref(), Some("UTO"));
        assert_eq!(data.date_of_birth, NaiveDate::from_ymd_opt(1974, 8, 12));
        assert_eq!(data.date_of_expiry, NaiveDate::from_ymd_opt(2012, 4, 15));
        assert_eq!(data.gender.as_deref(), Some("F"));
        assert_eq!(data.lastname.as_deref(), Some("ERIKSSON"));
        assert_eq!(data.firstname.as_deref(), Some("ANNA MARIA"));
        assert_eq!(data.fullname.as_deref(), Some("ANNA MARIA ERIKSSON"));
    }

    #[test]
    fn test_id_card_layout() {
        let data = DisclosedData::decode(&bytes(ID_CARD_MRZ), DocumentLayout::IdCard, today());
        assert_eq!(data.document_type.as_deref(), Some("id_card"));
        assert_eq!(data.document_number.as_deref(), Some("D23145890"));
        assert_eq!(data.date_of_birth, NaiveDate::from_ymd_opt(1974, 8, 12));
        assert_eq!(data.nationality.as_deref(), Some("UTO"));
        assert_eq!(data.lastname.as_deref(), Some("ERIKSSON"));
    }

    #[test]
    fn test_withheld_bytes_are_none() {
        let mut raw = bytes(PASSPORT_MRZ);
        for b in &mut raw[57..63] {
            *b = 0;
        }
        let data = DisclosedData::decode(&raw, DocumentLayout::Passport, today());
        assert_eq!(data.date_of_birth, None);
        assert_eq!(data.nationality.as_deref(), Some("UTO"));

        let empty = DisclosedData::decode(&[0u8; DISCLOSED_BYTES_LENGTH], DocumentLayout::Passport, today());
        assert_eq!(empty, DisclosedData::default());
    }

    #[test]
    fn test_birth_century() {
        assert_eq!(
            parse_mrz_date("240101", Century::Birth(2025)),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            parse_mrz_date("300101", Century::Birth(2025)),
            NaiveDate::from_ymd_opt(1930, 1, 1)
        );
        assert_eq!(parse_mrz_date("301399", Century::Expiry), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Anna  Maria<Eriksson"), "anna maria eriksson");
    }
}
