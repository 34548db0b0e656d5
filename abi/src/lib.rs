mod config;
mod error;
mod pb;
mod types;
mod utils;

pub use config::{AvailabilityConfig, Config, DbConfig, FailurePolicy, ServerConfig};
pub use error::{Error, RoomShortage};
pub use pb::*;
pub use types::{Stay, StayWindow, MAX_STAY_NIGHTS};
pub use utils::*;

pub type ReservationId = String;
pub type RoomTypeId = String;
