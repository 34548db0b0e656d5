use crate::{
    AvailabilityRequest, CancelRequest, CheckInRequest, CheckOutRequest, ConfirmRequest,
    CreateRoomTypeRequest, Date, DeleteRequest, GetRequest, GetRoomTypeRequest,
    ListRoomTypesRequest, QueryRequest, RangeAvailabilityRequest, Reservation, ReservationQuery,
    ReserveRequest, RoomType, UpdateRequest,
};
use chrono::NaiveDate;

impl ReserveRequest {
    pub fn new(rsvp: Reservation) -> Self {
        Self {
            reservation: Some(rsvp),
        }
    }
}

impl ConfirmRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl CheckInRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl CheckOutRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl CancelRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl GetRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl DeleteRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl UpdateRequest {
    pub fn new(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            note: note.into(),
        }
    }
}

impl QueryRequest {
    pub fn new(query: ReservationQuery) -> Self {
        Self { query: Some(query) }
    }
}

impl CreateRoomTypeRequest {
    pub fn new(room_type: RoomType) -> Self {
        Self {
            room_type: Some(room_type),
        }
    }
}

impl GetRoomTypeRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl ListRoomTypesRequest {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
        }
    }
}

impl AvailabilityRequest {
    /// `date` of `None` asks for today.
    pub fn new(room_type_id: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            room_type_id: room_type_id.into(),
            date: date.map(Date::from),
            total_units: None,
        }
    }

    pub fn with_total_units(mut self, total_units: u32) -> Self {
        self.total_units = Some(total_units);
        self
    }
}

impl RangeAvailabilityRequest {
    pub fn new(room_type_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            room_type_id: room_type_id.into(),
            start: Some(start.into()),
            end: Some(end.into()),
            total_units: None,
        }
    }

    pub fn with_total_units(mut self, total_units: u32) -> Self {
        self.total_units = Some(total_units);
        self
    }
}
