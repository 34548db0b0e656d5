use chrono::NaiveDate;

/// Why a stay could not be placed: the tightest day of the requested window
/// has fewer free units than were asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Room type {room_type_id} has {available} unit(s) free on {day}, but {requested} were requested"
)]
pub struct RoomShortage {
    pub room_type_id: String,
    pub day: NaiveDate,
    pub requested: u32,
    pub available: u32,
}
