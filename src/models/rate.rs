use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A rating given to a group on a date, on a 0–6 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub value: u8,
    pub rating_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

pub const MAX_RATING: u8 = 6;

impl Rate {
    /// Builds a rating, rejecting values outside 0–6.
    pub fn new(value: u8, rating_date: NaiveDate, comment: Option<String>) -> Result<Self, Error> {
        if value > MAX_RATING {
            return Err(Error::InvalidInput(format!(
                "rating value must be between 0 and {}, got {}",
                MAX_RATING, value
            )));
        }
        Ok(Self {
            id: None,
            value,
            rating_date,
            comment,
        })
    }
}
