use serde::{Deserialize, Serialize};
use std::fmt;

/// Claim kinds with their protocol tags. Tags are frozen: every historical
/// parameter commitment hashes them in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    Disclose = 0,
    Age = 1,
    Birthdate = 2,
    ExpiryDate = 3,
    NationalityInclusion = 4,
    NationalityExclusion = 5,
    IssuingCountryInclusion = 6,
    IssuingCountryExclusion = 7,
    Bind = 8,
    SanctionsExclusion = 9,
    Facematch = 10,
}

impl ClaimKind {
    pub const ALL: [ClaimKind; 11] = [
        ClaimKind::Disclose,
        ClaimKind::Age,
        ClaimKind::Birthdate,
        ClaimKind::ExpiryDate,
        ClaimKind::NationalityInclusion,
        ClaimKind::NationalityExclusion,
        ClaimKind::IssuingCountryInclusion,
        ClaimKind::IssuingCountryExclusion,
        ClaimKind::Bind,
        ClaimKind::SanctionsExclusion,
        ClaimKind::Facematch,
    ];

    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Base circuit name, without the `_evm` suffix.
    pub fn circuit_name(&self) -> &'static str {
        match self {
            ClaimKind::Disclose => "disclose_bytes",
            ClaimKind::Age => "compare_age",
            ClaimKind::Birthdate => "compare_birthdate",
            ClaimKind::ExpiryDate => "compare_expiry",
            ClaimKind::NationalityInclusion => "inclusion_check_nationality",
            ClaimKind::NationalityExclusion => "exclusion_check_nationality",
            ClaimKind::IssuingCountryInclusion => "inclusion_check_issuing_country",
            ClaimKind::IssuingCountryExclusion => "exclusion_check_issuing_country",
            ClaimKind::Bind => "bind",
            ClaimKind::SanctionsExclusion => "exclusion_check_sanctions",
            ClaimKind::Facematch => "facematch",
        }
    }

    /// Payload length header hashed into the standard commitment.
    pub fn standard_length(&self) -> u16 {
        match self {
            ClaimKind::Disclose => 4,
            ClaimKind::Age => 2,
            ClaimKind::Birthdate | ClaimKind::ExpiryDate => 2,
            ClaimKind::NationalityInclusion
            | ClaimKind::NationalityExclusion
            | ClaimKind::IssuingCountryInclusion
            | ClaimKind::IssuingCountryExclusion => 200,
            ClaimKind::Bind => 17,
            ClaimKind::SanctionsExclusion => 2,
            ClaimKind::Facematch => 5,
        }
    }

    /// Payload length header hashed into the EVM commitment.
    pub fn evm_length(&self) -> u16 {
        match self {
            ClaimKind::Disclose => 180,
            ClaimKind::Age => 2,
            ClaimKind::Birthdate | ClaimKind::ExpiryDate => 16,
            ClaimKind::NationalityInclusion
            | ClaimKind::NationalityExclusion
            | ClaimKind::IssuingCountryInclusion
            | ClaimKind::IssuingCountryExclusion => 600,
            ClaimKind::Bind => 509,
            ClaimKind::SanctionsExclusion => 33,
            ClaimKind::Facematch => 98,
        }
    }

    pub fn is_country_check(&self) -> bool {
        matches!(
            self,
            ClaimKind::NationalityInclusion
                | ClaimKind::NationalityExclusion
                | ClaimKind::IssuingCountryInclusion
                | ClaimKind::IssuingCountryExclusion
        )
    }

    pub fn is_exclusion(&self) -> bool {
        matches!(
            self,
            ClaimKind::NationalityExclusion | ClaimKind::IssuingCountryExclusion
        )
    }

    /// Resolves a committed-inputs key such as `compare_age_evm`.
    pub fn from_circuit_name(name: &str) -> Option<(ClaimKind, bool)> {
        let (base, evm) = match name.strip_suffix("_evm") {
            Some(base) => (base, true),
            None => (name, false),
        };
        ClaimKind::ALL
            .iter()
            .find(|kind| kind.circuit_name() == base)
            .map(|kind| (*kind, evm))
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.circuit_name())
    }
}

/// Role a proof plays in the chain, parsed once from its declared name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitStage {
    Dsc,
    IdData,
    Integrity,
    Claim { kind: ClaimKind, evm: bool },
    /// Aggregated proof; `subproofs` is the numeric suffix of `outer_N`.
    Outer { evm: bool, subproofs: usize },
    Unknown,
}

impl CircuitStage {
    pub fn parse(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix("outer") {
            let evm = rest.starts_with("_evm");
            let subproofs = name
                .rsplit('_')
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            return CircuitStage::Outer { evm, subproofs };
        }
        if name.starts_with("sig_check_dsc") {
            return CircuitStage::Dsc;
        }
        if name.starts_with("sig_check_id_data") {
            return CircuitStage::IdData;
        }
        if name.starts_with("data_check_integrity") {
            return CircuitStage::Integrity;
        }
        for kind in ClaimKind::ALL {
            if name.starts_with(kind.circuit_name()) {
                let evm = name.ends_with("_evm");
                return CircuitStage::Claim { kind, evm };
            }
        }
        CircuitStage::Unknown
    }

    pub fn is_outer(&self) -> bool {
        matches!(self, CircuitStage::Outer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_stable() {
        assert_eq!(ClaimKind::Disclose.tag(), 0);
        assert_eq!(ClaimKind::Age.tag(), 1);
        assert_eq!(ClaimKind::IssuingCountryExclusion.tag(), 7);
        assert_eq!(ClaimKind::Facematch.tag(), 10);
    }

    #[test]
    fn test_from_circuit_name() {
        assert_eq!(
            ClaimKind::from_circuit_name("compare_age_evm"),
            Some((ClaimKind::Age, true))
        );
        assert_eq!(
            ClaimKind::from_circuit_name("exclusion_check_nationality"),
            Some((ClaimKind::NationalityExclusion, false))
        );
        assert_eq!(ClaimKind::from_circuit_name("compare_height"), None);
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!(CircuitStage::parse("sig_check_dsc_tbs_700_rsa_pkcs_4096_sha256"), CircuitStage::Dsc);
        assert_eq!(CircuitStage::parse("data_check_integrity_sa_sha256_dg_sha256"), CircuitStage::Integrity);
        assert_eq!(
            CircuitStage::parse("compare_birthdate"),
            CircuitStage::Claim { kind: ClaimKind::Birthdate, evm: false }
        );
        assert_eq!(
            CircuitStage::parse("outer_evm_count_5"),
            CircuitStage::Outer { evm: true, subproofs: 5 }
        );
        assert_eq!(CircuitStage::parse("something_else"), CircuitStage::Unknown);
    }

    #[test]
    fn test_country_lengths() {
        for kind in ClaimKind::ALL.iter().filter(|k| k.is_country_check()) {
            assert_eq!(kind.standard_length(), 200);
            assert_eq!(kind.evm_length(), 600);
        }
    }
}
