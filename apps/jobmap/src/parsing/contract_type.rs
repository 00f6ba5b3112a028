//! Contract types and the keyword table used to detect them in listing titles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical contract type of a listing. Closed set; anything unrecognized is `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    Internship,
    FixedTerm,
    Permanent,
    Apprenticeship,
    PhD,
    Freelance,
    TemporaryAgency,
    #[default]
    Other,
}

/// Keyword table, in precedence order. First row with any matching needle wins.
/// Needles are lowercase; haystacks are lowercased before matching.
const TYPE_KEYWORDS: &[(ContractType, &[&str])] = &[
    (ContractType::Internship, &["stage"]),
    (ContractType::FixedTerm, &["cdd"]),
    (ContractType::Permanent, &["cdi"]),
    (
        ContractType::Apprenticeship,
        &["alternance", "apprentissage", "contrat pro"],
    ),
    (ContractType::PhD, &["thèse", "these"]),
    (ContractType::Freelance, &["freelance", "indépendant"]),
    (ContractType::TemporaryAgency, &["intérim", "interim"]),
];

impl ContractType {
    pub const ALL: [ContractType; 8] = [
        ContractType::Internship,
        ContractType::FixedTerm,
        ContractType::Permanent,
        ContractType::Apprenticeship,
        ContractType::PhD,
        ContractType::Freelance,
        ContractType::TemporaryAgency,
        ContractType::Other,
    ];

    /// Scans `text` for a known contract keyword (case-insensitive substring match).
    pub fn detect(text: &str) -> Option<ContractType> {
        let haystack = text.to_lowercase();
        TYPE_KEYWORDS
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
            .map(|(kind, _)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Internship => "Internship",
            ContractType::FixedTerm => "FixedTerm",
            ContractType::Permanent => "Permanent",
            ContractType::Apprenticeship => "Apprenticeship",
            ContractType::PhD => "PhD",
            ContractType::Freelance => "Freelance",
            ContractType::TemporaryAgency => "TemporaryAgency",
            ContractType::Other => "Other",
        }
    }

    /// Label used by the French-language feed and UI ("CDI", "Stage", ...).
    pub fn label(&self) -> &'static str {
        match self {
            ContractType::Internship => "Stage",
            ContractType::FixedTerm => "CDD",
            ContractType::Permanent => "CDI",
            ContractType::Apprenticeship => "Alternance",
            ContractType::PhD => "Thèse",
            ContractType::Freelance => "Freelance",
            ContractType::TemporaryAgency => "Intérim",
            ContractType::Other => "Autre",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownContractType(pub String);

impl fmt::Display for UnknownContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown contract type '{}'", self.0)
    }
}

impl std::error::Error for UnknownContractType {}

/// Accepts either the canonical name or the French label, case-insensitively.
impl FromStr for ContractType {
    type Err = UnknownContractType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ContractType::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == wanted || t.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownContractType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_keyword() {
        assert_eq!(ContractType::detect("Stage 6 mois"), Some(ContractType::Internship));
        assert_eq!(ContractType::detect("CDD 18 mois"), Some(ContractType::FixedTerm));
        assert_eq!(ContractType::detect("cdi"), Some(ContractType::Permanent));
        assert_eq!(
            ContractType::detect("Contrat pro"),
            Some(ContractType::Apprenticeship)
        );
        assert_eq!(
            ContractType::detect("Apprentissage"),
            Some(ContractType::Apprenticeship)
        );
        assert_eq!(ContractType::detect("Thèse CIFRE"), Some(ContractType::PhD));
        assert_eq!(ContractType::detect("THESE"), Some(ContractType::PhD));
        assert_eq!(
            ContractType::detect("Indépendant"),
            Some(ContractType::Freelance)
        );
        assert_eq!(
            ContractType::detect("INTÉRIM"),
            Some(ContractType::TemporaryAgency)
        );
        assert_eq!(ContractType::detect("Urgent"), None);
    }

    #[test]
    fn test_detect_respects_precedence() {
        // "stage" is checked before "cdd"
        assert_eq!(
            ContractType::detect("CDD ou stage"),
            Some(ContractType::Internship)
        );
    }

    #[test]
    fn test_from_str_accepts_name_and_label() {
        assert_eq!("permanent".parse::<ContractType>(), Ok(ContractType::Permanent));
        assert_eq!("CDI".parse::<ContractType>(), Ok(ContractType::Permanent));
        assert_eq!("stage".parse::<ContractType>(), Ok(ContractType::Internship));
        assert!("Tous".parse::<ContractType>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&ContractType::TemporaryAgency).unwrap();
        assert_eq!(json, r#""TemporaryAgency""#);
        let back: ContractType = serde_json::from_str(r#""PhD""#).unwrap();
        assert_eq!(back, ContractType::PhD);
    }

    #[test]
    fn test_default_is_other() {
        assert_eq!(ContractType::default(), ContractType::Other);
    }
}
