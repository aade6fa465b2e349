use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
}

/// Listing quality grade. Unknown grades degrade to a neutral multiplier
/// rather than failing, so parsing is only strict at the edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Premium,
    Grade1,
    Grade2,
    Standard,
}

impl QualityGrade {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium" => Ok(Self::Premium),
            "grade1" => Ok(Self::Grade1),
            "grade2" => Ok(Self::Grade2),
            "standard" => Ok(Self::Standard),
            other => Err(DomainError::UnknownQualityGrade(other.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Grade1 => "grade1",
            Self::Grade2 => "grade2",
            Self::Standard => "standard",
        }
    }
}

/// A marketplace listing, immutable for the duration of one pricing call.
/// `base_price` is the farmer-declared price in KES.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub farmer_id: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub quantity: Decimal,
    pub unit: String,
    pub quality_grade: Option<QualityGrade>,
    pub location: Option<String>,
    pub harvest_date: NaiveDate,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Grade label used in factor maps and prompts; unknown grades read as
    /// `standard` for display while pricing treats them as neutral.
    pub fn grade_label(&self) -> &'static str {
        self.quality_grade.map(|grade| grade.as_str()).unwrap_or("standard")
    }
}

#[cfg(test)]
mod tests {
    use super::QualityGrade;

    #[test]
    fn grade_parsing_is_case_insensitive() {
        assert_eq!(QualityGrade::parse("Premium").unwrap(), QualityGrade::Premium);
        assert_eq!(QualityGrade::parse(" grade1 ").unwrap(), QualityGrade::Grade1);
    }

    #[test]
    fn unknown_grade_is_rejected_at_the_edge() {
        assert!(QualityGrade::parse("export").is_err());
    }
}
