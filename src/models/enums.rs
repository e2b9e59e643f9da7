use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Closed set of classifier output categories.
///
/// The label strings and their order (`ALL`) are part of the engine's
/// external contract: the classifier's output vector is indexed in exactly
/// this order, and the `scans.tumor_type` column stores these labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TumorType {
    Glioma,
    Meningioma,
    NoTumor,
    Pituitary,
}

impl TumorType {
    /// Category order used by the classifier output vector.
    pub const ALL: [TumorType; 4] = [
        TumorType::Glioma,
        TumorType::Meningioma,
        TumorType::NoTumor,
        TumorType::Pituitary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glioma => "glioma",
            Self::Meningioma => "meningioma",
            Self::NoTumor => "notumor",
            Self::Pituitary => "pituitary",
        }
    }

    /// Index of this category in the classifier output vector.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Category at the given classifier output index.
    pub fn from_index(index: usize) -> Option<TumorType> {
        Self::ALL.get(index).copied()
    }

    /// Resolve a free-form label to a category.
    ///
    /// Accepts the canonical labels plus a fixed synonym table (case- and
    /// separator-insensitive). Anything outside the table is `None`, with
    /// no substring guessing.
    pub fn resolve(label: &str) -> Option<TumorType> {
        let key: String = label
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "glioma" | "gliomatumor" => Some(Self::Glioma),
            "meningioma" | "meningiomatumor" => Some(Self::Meningioma),
            "notumor" | "none" | "healthy" | "normal" | "negative" => Some(Self::NoTumor),
            "pituitary" | "pituitarytumor" | "pituitaryadenoma" => Some(Self::Pituitary),
            _ => None,
        }
    }
}

impl std::str::FromStr for TumorType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glioma" => Ok(Self::Glioma),
            "meningioma" => Ok(Self::Meningioma),
            "notumor" => Ok(Self::NoTumor),
            "pituitary" => Ok(Self::Pituitary),
            _ => Err(DatabaseError::InvalidEnum {
                field: "TumorType".into(),
                value: s.into(),
            }),
        }
    }
}

impl std::fmt::Display for TumorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn as_str_from_str_roundtrip() {
        for t in TumorType::ALL {
            assert_eq!(TumorType::from_str(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert!(TumorType::from_str("astrocytoma").is_err());
        assert!(TumorType::from_str("Glioma").is_err());
    }

    #[test]
    fn index_matches_all_order() {
        for (i, t) in TumorType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
            assert_eq!(TumorType::from_index(i), Some(*t));
        }
        assert_eq!(TumorType::from_index(4), None);
    }

    #[test]
    fn resolve_canonical_labels() {
        assert_eq!(TumorType::resolve("glioma"), Some(TumorType::Glioma));
        assert_eq!(TumorType::resolve("notumor"), Some(TumorType::NoTumor));
    }

    #[test]
    fn resolve_synonyms() {
        assert_eq!(TumorType::resolve("No Tumor"), Some(TumorType::NoTumor));
        assert_eq!(TumorType::resolve("no_tumor"), Some(TumorType::NoTumor));
        assert_eq!(TumorType::resolve("Healthy"), Some(TumorType::NoTumor));
        assert_eq!(
            TumorType::resolve("Pituitary Adenoma"),
            Some(TumorType::Pituitary)
        );
        assert_eq!(
            TumorType::resolve("meningioma tumor"),
            Some(TumorType::Meningioma)
        );
    }

    #[test]
    fn resolve_is_closed_not_substring_matching() {
        // "not" and "nothing" must not fuzzy-match NoTumor
        assert_eq!(TumorType::resolve("not"), None);
        assert_eq!(TumorType::resolve("nothing"), None);
        assert_eq!(TumorType::resolve("oligodendroglioma"), None);
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&TumorType::NoTumor).unwrap();
        assert_eq!(json, "\"notumor\"");
        let back: TumorType = serde_json::from_str("\"pituitary\"").unwrap();
        assert_eq!(back, TumorType::Pituitary);
    }
}
