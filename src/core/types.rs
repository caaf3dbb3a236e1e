use serde::{Deserialize, Serialize};

/// Identifier of a genome or contig being scanned
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomeId(pub String);

impl GenomeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GenomeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strand of a gene or repeat copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse a strand symbol (`+`, `-`, `1`, `-1`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" | "1" | "+1" | "forward" => Some(Self::Forward),
            "-" | "-1" | "reverse" => Some(Self::Reverse),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Reference set a homology or profile hit was scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    /// Phage protein reference set
    Phage,
    /// Bacterial (host) protein reference set
    Bacterial,
    /// Curated phage protein-family profiles
    Profile,
}

impl ReferenceCategory {
    /// Parse a category label as written by the upstream search tools
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "phage" | "phage-reference" | "phage_reference" => Some(Self::Phage),
            "bacterial" | "bacteria" | "bacterial-reference" | "bacterial_reference" => {
                Some(Self::Bacterial)
            }
            "profile" | "profile-match" | "profile_match" => Some(Self::Profile),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phage => write!(f, "phage"),
            Self::Bacterial => write!(f, "bacterial"),
            Self::Profile => write!(f, "profile"),
        }
    }
}

/// How confidently one edge of a prophage call was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryEvidence {
    /// Flanking sequence was unavailable, edge left at the gene-derived coordinate
    Truncated,
    /// No attachment site found, edge sits on a gene edge
    GeneBoundary,
    /// Snapped to a repeat pair containing mismatches
    ApproximateAttachmentSite,
    /// Snapped to an identical repeat pair
    ExactAttachmentSite,
}

impl BoundaryEvidence {
    #[must_use]
    pub fn is_attachment_site(self) -> bool {
        matches!(
            self,
            Self::ExactAttachmentSite | Self::ApproximateAttachmentSite
        )
    }
}

impl std::fmt::Display for BoundaryEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated"),
            Self::GeneBoundary => write!(f, "gene-boundary"),
            Self::ApproximateAttachmentSite => write!(f, "approximate-attachment-site"),
            Self::ExactAttachmentSite => write!(f, "exact-attachment-site"),
        }
    }
}

/// Overall confidence of a call, derived from its two edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    #[must_use]
    pub fn from_edges(left: BoundaryEvidence, right: BoundaryEvidence) -> Self {
        match (left, right) {
            (a, b) if a.is_attachment_site() && b.is_attachment_site() => Self::High,
            (BoundaryEvidence::Truncated, _) | (_, BoundaryEvidence::Truncated) => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_aliases() {
        assert_eq!(
            ReferenceCategory::parse("phage-reference"),
            Some(ReferenceCategory::Phage)
        );
        assert_eq!(
            ReferenceCategory::parse("Bacterial"),
            Some(ReferenceCategory::Bacterial)
        );
        assert_eq!(
            ReferenceCategory::parse("profile_match"),
            Some(ReferenceCategory::Profile)
        );
        assert_eq!(ReferenceCategory::parse("viral"), None);
    }

    #[test]
    fn test_parse_strand() {
        assert_eq!(Strand::parse("+"), Some(Strand::Forward));
        assert_eq!(Strand::parse("-1"), Some(Strand::Reverse));
        assert_eq!(Strand::parse("."), None);
    }

    #[test]
    fn test_confidence_from_edges() {
        use BoundaryEvidence::*;
        assert_eq!(
            Confidence::from_edges(ExactAttachmentSite, ApproximateAttachmentSite),
            Confidence::High
        );
        assert_eq!(
            Confidence::from_edges(GeneBoundary, ExactAttachmentSite),
            Confidence::Medium
        );
        assert_eq!(
            Confidence::from_edges(Truncated, ExactAttachmentSite),
            Confidence::Low
        );
    }
}
