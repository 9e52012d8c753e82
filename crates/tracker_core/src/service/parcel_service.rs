//! Parcel tracking use-case service.
//!
//! # Responsibility
//! - Provide the register / advance / re-address / delete flows.
//! - Enforce lifecycle policy above the repository layer.
//!
//! # Invariants
//! - Status only moves forward: `registered -> sent -> delivered`.
//! - Only `registered` parcels may be deleted through the service.
//! - Service APIs never bypass repository validation/persistence contracts.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from parcel service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Address is blank after trim.
    InvalidAddress,
    /// Target parcel does not exist.
    NotFound(ParcelNumber),
    /// Parcel already reached its terminal stage.
    AlreadyDelivered(ParcelNumber),
    /// Address change refused because the parcel left `registered`.
    AddressLocked {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Delete refused because the parcel left `registered`.
    DeleteNotAllowed {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "address must not be blank"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::AlreadyDelivered(number) => {
                write!(f, "parcel {number} is already delivered")
            }
            Self::AddressLocked { number, status } => write!(
                f,
                "parcel {number} is {status}; address can only change while registered"
            ),
            Self::DeleteNotAllowed { number, status } => write!(
                f,
                "parcel {number} is {status}; only registered parcels can be deleted"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(number) => Self::NotFound(number),
            RepoError::AddressLocked { number, status } => Self::AddressLocked { number, status },
            other => Self::Repo(other),
        }
    }
}

/// Parcel tracking service facade.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(
        &self,
        client: ClientId,
        address: impl Into<String>,
    ) -> Result<Parcel, ServiceError> {
        let address = normalize_address(address.into())?;
        let parcel = Parcel::new(client, address);
        let number = self.repo.add(&parcel)?;

        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            number, client
        );
        Ok(parcel.with_number(number))
    }

    /// Loads one parcel.
    pub fn parcel(&self, number: ParcelNumber) -> Result<Parcel, ServiceError> {
        Ok(self.repo.get(number)?)
    }

    /// Lists a client's parcels in ascending number order.
    pub fn client_parcels(&self, client: ClientId) -> Result<Vec<Parcel>, ServiceError> {
        let mut parcels = self.repo.get_by_client(client)?;
        parcels.sort_by_key(|parcel| parcel.number);
        Ok(parcels)
    }

    /// Moves a parcel one stage forward and returns the new status.
    pub fn next_status(&self, number: ParcelNumber) -> Result<ParcelStatus, ServiceError> {
        let parcel = self.repo.get(number)?;
        let next = parcel
            .status
            .next()
            .ok_or(ServiceError::AlreadyDelivered(number))?;
        self.repo.set_status(number, next)?;

        info!(
            "event=parcel_next_status module=service status=ok number={} from={} to={}",
            number, parcel.status, next
        );
        Ok(next)
    }

    /// Changes the delivery address of a `registered` parcel.
    pub fn change_address(
        &self,
        number: ParcelNumber,
        address: impl Into<String>,
    ) -> Result<(), ServiceError> {
        let address = normalize_address(address.into())?;
        self.repo.set_address(number, address.as_str())?;
        Ok(())
    }

    /// Deletes a `registered` parcel.
    pub fn delete(&self, number: ParcelNumber) -> Result<(), ServiceError> {
        let parcel = self.repo.get(number)?;
        if parcel.status != ParcelStatus::Registered {
            return Err(ServiceError::DeleteNotAllowed {
                number,
                status: parcel.status,
            });
        }
        self.repo.delete(number)?;

        info!(
            "event=parcel_delete module=service status=ok number={}",
            number
        );
        Ok(())
    }
}

fn normalize_address(address: String) -> Result<String, ServiceError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidAddress);
    }
    Ok(trimmed.to_string())
}
