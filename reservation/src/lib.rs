mod availability;
mod manager;

use abi::{Error, ReservationId, RoomTypeId, Stay, StayWindow};
use async_trait::async_trait;
use sqlx::PgPool;

pub use availability::{
    check_capacity, committed_units_on, compute_availability, compute_range_availability,
    Availability, AvailabilityCalculator,
};

#[derive(Debug, Clone)]
pub struct ReservationManager {
    pool: PgPool,
}

#[async_trait]
pub trait Rsvp {
    /// make a reservation, rejecting it if the room type has no capacity left
    async fn reserve(&self, rsvp: abi::Reservation) -> Result<abi::Reservation, Error>;
    /// pending -> confirmed, re-checking capacity since the reservation starts holding units
    async fn confirm(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// confirmed -> checked_in
    async fn check_in(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// checked_in -> checked_out
    async fn check_out(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// pending or confirmed -> cancelled
    async fn cancel(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// update note
    async fn update_note(&self, id: ReservationId, note: String)
        -> Result<abi::Reservation, Error>;
    /// delete reservation
    async fn delete(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// get reservation by id
    async fn get(&self, id: ReservationId) -> Result<abi::Reservation, Error>;
    /// query reservations
    async fn query(&self, query: abi::ReservationQuery) -> Result<Vec<abi::Reservation>, Error>;
}

#[async_trait]
pub trait RoomInventory {
    async fn create_room_type(&self, room_type: abi::RoomType) -> Result<abi::RoomType, Error>;
    async fn get_room_type(&self, id: RoomTypeId) -> Result<abi::RoomType, Error>;
    async fn list_room_types(&self, property_id: String) -> Result<Vec<abi::RoomType>, Error>;
    /// stays of the room type that hold inventory and overlap `window`
    async fn committed_stays(
        &self,
        room_type_id: &str,
        window: &StayWindow,
    ) -> Result<Vec<Stay>, Error>;
}
