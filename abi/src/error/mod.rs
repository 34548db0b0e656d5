mod shortage;

use crate::ReservationStatus;

pub use shortage::RoomShortage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DbError(sqlx::Error),

    #[error("Failed to read configuration file")]
    ConfigReadError,

    #[error("Failed to parse configuration file")]
    ConfigParseError,

    #[error("Invalid stay window: check-out must be after check-in")]
    InvalidStayWindow,

    #[error("Stay of {0} nights is longer than allowed")]
    StayTooLong(i64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Rooms booked must be at least 1")]
    InvalidRoomsBooked,

    #[error("Missing or malformed guest field: {0}")]
    InvalidGuestField(String),

    #[error("Invalid reservation id: {0}")]
    InvalidReservationId(String),

    #[error("Invalid room type id: {0}")]
    InvalidRoomTypeId(String),

    #[error("Invalid room type: {0}")]
    InvalidRoomType(String),

    #[error("Invalid reservation status: {0}")]
    InvalidStatus(String),

    #[error("Reservation cannot be created as {0}")]
    InvalidInitialStatus(ReservationStatus),

    #[error("Reservation cannot move from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("Invalid page size: {0}")]
    InvalidPageSize(i32),

    #[error("Invalid page: {0}")]
    InvalidPage(i32),

    #[error(transparent)]
    InsufficientInventory(RoomShortage),

    #[error("No record found")]
    NotFound,

    #[error("unknown error")]
    Unknown,
}

impl Error {
    /// True when the data source could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            Error::DbError(
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DbError(_), Self::DbError(_)) => true,
            (Self::StayTooLong(a), Self::StayTooLong(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidGuestField(a), Self::InvalidGuestField(b)) => a == b,
            (Self::InvalidReservationId(a), Self::InvalidReservationId(b)) => a == b,
            (Self::InvalidRoomTypeId(a), Self::InvalidRoomTypeId(b)) => a == b,
            (Self::InvalidRoomType(a), Self::InvalidRoomType(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::InvalidInitialStatus(a), Self::InvalidInitialStatus(b)) => a == b,
            (
                Self::InvalidTransition { from: f1, to: t1 },
                Self::InvalidTransition { from: f2, to: t2 },
            ) => f1 == f2 && t1 == t2,
            (Self::InvalidPageSize(a), Self::InvalidPageSize(b)) => a == b,
            (Self::InvalidPage(a), Self::InvalidPage(b)) => a == b,
            (Self::InsufficientInventory(a), Self::InsufficientInventory(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Error::NotFound,
            _ => Error::DbError(e),
        }
    }
}

impl From<Error> for tonic::Status {
    fn from(e: Error) -> Self {
        match e {
            Error::DbError(_) | Error::ConfigReadError | Error::ConfigParseError | Error::Unknown => {
                tonic::Status::internal(e.to_string())
            }
            Error::InvalidStayWindow
            | Error::StayTooLong(_)
            | Error::InvalidDate(_)
            | Error::InvalidRoomsBooked
            | Error::InvalidGuestField(_)
            | Error::InvalidReservationId(_)
            | Error::InvalidRoomTypeId(_)
            | Error::InvalidRoomType(_)
            | Error::InvalidStatus(_)
            | Error::InvalidInitialStatus(_)
            | Error::InvalidPageSize(_)
            | Error::InvalidPage(_) => tonic::Status::invalid_argument(e.to_string()),
            Error::InvalidTransition { .. } | Error::InsufficientInventory(_) => {
                tonic::Status::failed_precondition(e.to_string())
            }
            Error::NotFound => tonic::Status::not_found("No record found for the given id"),
        }
    }
}
