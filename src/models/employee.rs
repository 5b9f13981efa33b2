use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::Error;

/// A single employee record.
///
/// Identity is the (first name, last name) pair, case-sensitive: two
/// employees are equal iff both names match exactly, regardless of
/// condition, birth year, or salary. Duplicate detection and set-based
/// deduplication rely on this, so `Hash` follows the same rule.
///
/// The natural ordering (by last name) is applied with explicit comparators
/// at the sort sites rather than an `Ord` impl, which would disagree with
/// this equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub first_name: String,
    pub last_name: String,
    pub condition: Condition,
    pub birth_year: i32,
    pub salary: f64,
}

impl Employee {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        condition: Condition,
        birth_year: i32,
        salary: f64,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            condition,
            birth_year,
            salary,
        }
    }

    /// Whether `other` has the same identity (name pair) as this record.
    pub fn same_identity(&self, other: &Employee) -> bool {
        self.first_name == other.first_name && self.last_name == other.last_name
    }

    /// Creation-boundary validation. The core operations do not enforce
    /// these ranges; the presentation layer calls this before handing a
    /// new record to a group or the database.
    pub fn validate(&self) -> Result<(), Error> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(Error::InvalidInput("names must be non-empty".into()));
        }
        if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&self.birth_year) {
            return Err(Error::InvalidInput(format!(
                "birth year {} outside {}..={}",
                self.birth_year, MIN_BIRTH_YEAR, MAX_BIRTH_YEAR
            )));
        }
        if self.salary <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "salary must be positive, got {}",
                self.salary
            )));
        }
        Ok(())
    }
}

pub const MIN_BIRTH_YEAR: i32 = 1950;
pub const MAX_BIRTH_YEAR: i32 = 2010;

impl PartialEq for Employee {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for Employee {}

impl Hash for Employee {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first_name.hash(state);
        self.last_name.hash(state);
    }
}

/// An employee's presence condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Present,
    OnTrip,
    Sick,
    Absent,
}

impl Condition {
    /// Every condition, in declaration order. Grouping operations use this
    /// so every condition appears as a key even when its partition is empty.
    pub const ALL: [Condition; 4] = [
        Condition::Present,
        Condition::OnTrip,
        Condition::Sick,
        Condition::Absent,
    ];

    /// The lowercase token persisted on the storage boundary.
    pub fn storage_token(&self) -> &'static str {
        match self {
            Self::Present => "obecny",
            Self::OnTrip => "delegacja",
            Self::Sick => "chory",
            Self::Absent => "nieobecny",
        }
    }

    /// Maps a persisted token back to a condition. An unrecognized token is
    /// a hard error at the boundary, never silently defaulted.
    pub fn from_storage_token(token: &str) -> Result<Self, Error> {
        match token.to_lowercase().as_str() {
            "obecny" => Ok(Self::Present),
            "delegacja" => Ok(Self::OnTrip),
            "chory" => Ok(Self::Sick),
            "nieobecny" => Ok(Self::Absent),
            other => Err(Error::UnknownCondition(other.to_string())),
        }
    }

    /// Human-readable label for display surfaces.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::OnTrip => "On trip",
            Self::Sick => "Sick",
            Self::Absent => "Absent",
        }
    }

    /// The serde-facing name, used in the JSON export shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::OnTrip => "ON_TRIP",
            Self::Sick => "SICK",
            Self::Absent => "ABSENT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PRESENT" => Some(Self::Present),
            "ON_TRIP" => Some(Self::OnTrip),
            "SICK" => Some(Self::Sick),
            "ABSENT" => Some(Self::Absent),
            _ => None,
        }
    }
}
