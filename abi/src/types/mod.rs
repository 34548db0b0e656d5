mod date;
mod request;
mod reservation;
mod reservation_query;
mod reservation_status;
mod room_type;
mod stay;

pub use stay::{Stay, StayWindow, MAX_STAY_NIGHTS};
