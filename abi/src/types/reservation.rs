use chrono::NaiveDate;
use sqlx::{postgres::PgRow, types::Uuid, FromRow, Row};

use crate::{
    is_valid_email, is_valid_phone, required_date, Error, Reservation, ReservationStatus, Stay,
    StayWindow,
};

impl Reservation {
    pub fn new_pending(
        room_type_id: impl Into<String>,
        guest_name: impl Into<String>,
        guest_phone: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        rooms_booked: u32,
    ) -> Self {
        Self {
            id: "".to_string(),
            room_type_id: room_type_id.into(),
            guest_name: guest_name.into(),
            guest_phone: guest_phone.into(),
            guest_email: "".to_string(),
            check_in: Some(check_in.into()),
            check_out: Some(check_out.into()),
            rooms_booked,
            status: ReservationStatus::Pending as i32,
            note: "".to_string(),
        }
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = status as i32;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.guest_email = email.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Checks everything that can be checked without looking at the store.
    pub fn validate(&self) -> Result<(), Error> {
        if self.room_type_id.is_empty() {
            return Err(Error::InvalidRoomTypeId(self.room_type_id.clone()));
        }
        if self.guest_name.trim().is_empty() {
            return Err(Error::InvalidGuestField("guest_name".into()));
        }
        if !is_valid_phone(&self.guest_phone) {
            return Err(Error::InvalidGuestField("guest_phone".into()));
        }
        if !self.guest_email.is_empty() && !is_valid_email(&self.guest_email) {
            return Err(Error::InvalidGuestField("guest_email".into()));
        }
        if self.rooms_booked == 0 || self.rooms_booked > i32::MAX as u32 {
            return Err(Error::InvalidRoomsBooked);
        }
        self.window()?;

        let status = ReservationStatus::try_from(self.status)
            .map_err(|_| Error::InvalidStatus(self.status.to_string()))?;
        if status != ReservationStatus::Unknown && !status.is_initial() {
            return Err(Error::InvalidInitialStatus(status));
        }
        Ok(())
    }

    pub fn window(&self) -> Result<StayWindow, Error> {
        let check_in = required_date(self.check_in.as_ref(), "check_in")?;
        let check_out = required_date(self.check_out.as_ref(), "check_out")?;
        StayWindow::new(check_in, check_out)
    }

    pub fn stay(&self) -> Result<Stay, Error> {
        Ok(Stay::new(self.window()?, self.rooms_booked, self.status()))
    }
}

impl FromRow<'_, PgRow> for Reservation {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let room_type_id: Uuid = row.try_get("room_type_id")?;
        let check_in: NaiveDate = row.try_get("check_in")?;
        let check_out: NaiveDate = row.try_get("check_out")?;
        let rooms_booked: i32 = row.try_get("rooms_booked")?;
        let status: String = row.try_get("status")?;
        let status: ReservationStatus = status
            .parse()
            .map_err(|e: Error| sqlx::Error::Decode(Box::new(e)))?;
        let guest_email: Option<String> = row.try_get("guest_email")?;

        Ok(Self {
            id: id.to_string(),
            room_type_id: room_type_id.to_string(),
            guest_name: row.try_get("guest_name")?,
            guest_phone: row.try_get("guest_phone")?,
            guest_email: guest_email.unwrap_or_default(),
            check_in: Some(check_in.into()),
            check_out: Some(check_out.into()),
            rooms_booked: rooms_booked.max(0) as u32,
            status: status as i32,
            note: row.try_get("note")?,
        })
    }
}
