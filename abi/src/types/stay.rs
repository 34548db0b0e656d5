use chrono::{Days, NaiveDate};

use crate::{Error, ReservationStatus};

/// Longest stay (and longest availability range) accepted, in nights.
pub const MAX_STAY_NIGHTS: i64 = 366;

/// The half-open interval `[check_in, check_out)`: the guest occupies the
/// check-in night but not the check-out night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StayWindow {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

/// The part of a reservation that counts against inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub window: StayWindow,
    pub rooms_booked: u32,
    pub status: ReservationStatus,
}

impl StayWindow {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, Error> {
        let window = Self::stored(check_in, check_out)?;
        let nights = window.nights();
        if nights > MAX_STAY_NIGHTS {
            return Err(Error::StayTooLong(nights));
        }
        Ok(window)
    }

    /// Window of a reservation already in the store. Only the ordering is
    /// checked; the length cap applies to new stays and lookups.
    pub fn stored(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, Error> {
        if check_out <= check_in {
            return Err(Error::InvalidStayWindow);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// The one-night window starting at `date`.
    pub fn single_day(date: NaiveDate) -> Result<Self, Error> {
        let next = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::InvalidDate(date.to_string()))?;
        Self::new(date, next)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    pub fn overlaps(&self, other: &StayWindow) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }
}

impl Stay {
    pub fn new(window: StayWindow, rooms_booked: u32, status: ReservationStatus) -> Self {
        Self {
            window,
            rooms_booked,
            status,
        }
    }

    pub fn holds_inventory(&self) -> bool {
        self.status.holds_inventory()
    }
}
