use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Display/filter status of a tour. Not authoritative for capacity:
/// `available == 0` is what makes a tour full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferingStatus {
    Selling,
    Paused,
    Full,
}

impl OfferingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferingStatus::Selling => "selling",
            OfferingStatus::Paused => "paused",
            OfferingStatus::Full => "full",
        }
    }
}

impl fmt::Display for OfferingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "selling" => Ok(OfferingStatus::Selling),
            "paused" => Ok(OfferingStatus::Paused),
            "full" => Ok(OfferingStatus::Full),
            other => Err(CoreError::ValidationError(format!("unknown tour status '{}'", other))),
        }
    }
}

/// A capacity-limited tour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offering {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub available: i32,
    pub adult_price: i64,
    pub child_price: Option<i64>,
    pub status: OfferingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offering {
    /// Build a fresh tour record; `available` starts equal to `capacity`.
    pub fn from_new(new: &NewOffering) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            capacity: new.capacity,
            available: new.capacity,
            adult_price: new.adult_price,
            child_price: new.child_price,
            status: new.status.unwrap_or(OfferingStatus::Selling),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_sellable(&self) -> bool {
        self.status == OfferingStatus::Selling
    }

    pub fn is_full(&self) -> bool {
        self.available == 0
    }

    /// Apply an administrative edit. Capacity and availability are never
    /// touched here.
    pub fn apply(&mut self, update: &OfferingUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(price) = update.adult_price {
            self.adult_price = price;
        }
        if let Some(child_price) = update.child_price {
            self.child_price = child_price;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOffering {
    pub name: String,
    pub capacity: i32,
    pub adult_price: i64,
    #[serde(default)]
    pub child_price: Option<i64>,
    #[serde(default)]
    pub status: Option<OfferingStatus>,
}

impl NewOffering {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError("tour name must not be empty".into()));
        }
        if self.capacity <= 0 {
            return Err(CoreError::ValidationError(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }
        validate_prices(Some(self.adult_price), self.child_price)
    }
}

/// Partial edit of a tour. `child_price` distinguishes "absent" (keep) from
/// `null` (clear, fall back to the adult-rate fraction).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferingUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub adult_price: Option<i64>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub child_price: Option<Option<i64>>,
    #[serde(default)]
    pub status: Option<OfferingStatus>,
}

impl OfferingUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError("tour name must not be empty".into()));
            }
        }
        validate_prices(self.adult_price, self.child_price.flatten())
    }
}

fn validate_prices(adult_price: Option<i64>, child_price: Option<i64>) -> CoreResult<()> {
    if let Some(price) = adult_price {
        if price <= 0 {
            return Err(CoreError::ValidationError(format!(
                "adult price must be positive, got {}",
                price
            )));
        }
    }
    if let Some(price) = child_price {
        if price < 0 {
            return Err(CoreError::ValidationError(format!(
                "child price must not be negative, got {}",
                price
            )));
        }
    }
    Ok(())
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
