//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical shipment record tracked by core.
//! - Own the status lifecycle (`registered -> sent -> delivered`).
//!
//! # Invariants
//! - `number` is assigned by storage and never reused for another parcel.
//! - `client` and `created_at` never change after creation.
//! - `created_at` is an RFC 3339 timestamp in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned parcel identifier.
pub type ParcelNumber = i64;

/// Identifier of the client owning a parcel.
pub type ClientId = i64;

/// Parcel lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted for shipment, address still editable.
    Registered,
    /// Handed over to delivery.
    Sent,
    /// Received by the addressee. Terminal.
    Delivered,
}

impl ParcelStatus {
    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Returns the forward successor, or `None` for the terminal stage.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a known parcel status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl Display for UnknownStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown parcel status `{}`; expected registered|sent|delivered",
            self.0
        )
    }
}

impl Error for UnknownStatus {}

impl FromStr for ParcelStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registered" => Ok(Self::Registered),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Validation errors for parcel field combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    /// `created_at` is not an RFC 3339 timestamp.
    InvalidCreatedAt(String),
    /// `created_at` carries an offset other than UTC.
    CreatedAtNotUtc(String),
}

impl Display for ParcelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCreatedAt(value) => {
                write!(f, "created_at `{value}` is not an RFC 3339 timestamp")
            }
            Self::CreatedAtNotUtc(value) => write!(f, "created_at `{value}` must be in UTC"),
        }
    }
}

impl Error for ParcelValidationError {}

/// Shipment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Assigned by storage on insert. Ignored by create paths.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Editable only while `status == ParcelStatus::Registered`.
    pub address: String,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved `registered` parcel stamped with the current UTC time.
    ///
    /// `number` stays `0` until storage assigns one.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: now_rfc3339(),
        }
    }

    /// Returns a copy carrying the given storage number.
    pub fn with_number(mut self, number: ParcelNumber) -> Self {
        self.number = number;
        self
    }

    /// Returns whether the delivery address may still be changed.
    pub fn is_address_editable(&self) -> bool {
        self.status == ParcelStatus::Registered
    }

    /// Checks field-level invariants before persistence and after reads.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        let parsed = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|_| ParcelValidationError::InvalidCreatedAt(self.created_at.clone()))?;
        if parsed.offset().local_minus_utc() != 0 {
            return Err(ParcelValidationError::CreatedAtNotUtc(
                self.created_at.clone(),
            ));
        }
        Ok(())
    }
}

/// Current time in the canonical `created_at` format (`2024-01-01T00:00:00Z`).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
