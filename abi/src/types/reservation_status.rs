use std::{fmt, str::FromStr};

use crate::{Error, ReservationStatus};

impl ReservationStatus {
    /// Statuses whose reservations count against a room type's inventory.
    pub const HOLDING: [ReservationStatus; 2] =
        [ReservationStatus::Confirmed, ReservationStatus::CheckedIn];

    pub fn holds_inventory(self) -> bool {
        Self::HOLDING.contains(&self)
    }

    /// A reservation starts out pending or confirmed, never anywhere else.
    pub fn is_initial(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn can_transition_to(self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }

    pub fn ensure_transition(self, to: ReservationStatus) -> Result<(), Error> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(Error::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Unknown => "unknown",
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for ReservationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(ReservationStatus::Unknown),
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "checked_in" => Ok(ReservationStatus::CheckedIn),
            "checked_out" => Ok(ReservationStatus::CheckedOut),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}
