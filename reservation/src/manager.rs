use abi::{DbConfig, Error, ReservationId, ReservationStatus, RoomTypeId, Stay, StayWindow};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    postgres::PgPoolOptions, types::Uuid, PgConnection, PgPool, Postgres, QueryBuilder, Row,
};
use tracing::{info, instrument};

use crate::{check_capacity, ReservationManager, RoomInventory, Rsvp};

const RESERVATION_COLUMNS: &str = "id, room_type_id, guest_name, guest_phone, guest_email, \
    check_in, check_out, rooms_booked, status::text AS status, note";

#[async_trait]
impl Rsvp for ReservationManager {
    #[instrument(skip_all, fields(room_type_id = %rsvp.room_type_id))]
    async fn reserve(&self, mut rsvp: abi::Reservation) -> Result<abi::Reservation, Error> {
        rsvp.validate()?;

        let status = match rsvp.status() {
            ReservationStatus::Unknown => ReservationStatus::Pending,
            status => status,
        };
        rsvp.status = status as i32;
        let stay = rsvp.stay()?;
        let room_type_id = parse_room_type_id(&rsvp.room_type_id)?;

        // the room type row lock serialises every booking of this room type,
        // so the capacity check and the insert see the same committed stays
        let mut tx = self.pool.begin().await?;
        let total_units = lock_room_type(&mut tx, room_type_id).await?;
        let committed = fetch_committed(&mut tx, room_type_id, &stay.window).await?;
        check_capacity(&rsvp.room_type_id, total_units, &committed, &stay)?;

        let id: Uuid = sqlx::query(
            "INSERT INTO rsvp.reservations (room_type_id, guest_name, guest_phone, guest_email, check_in, check_out, rooms_booked, status, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8::rsvp.reservation_status, $9) RETURNING id",
        )
        .bind(room_type_id)
        .bind(&rsvp.guest_name)
        .bind(&rsvp.guest_phone)
        .bind(non_empty(&rsvp.guest_email))
        .bind(stay.window.check_in())
        .bind(stay.window.check_out())
        .bind(rsvp.rooms_booked as i32)
        .bind(status.to_string())
        .bind(&rsvp.note)
        .fetch_one(&mut *tx)
        .await?
        .get(0);
        tx.commit().await?;

        rsvp.id = id.to_string();
        info!(id = %rsvp.id, %status, rooms = rsvp.rooms_booked, "reservation created");
        Ok(rsvp)
    }

    async fn confirm(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        self.transition(id, ReservationStatus::Confirmed).await
    }

    async fn check_in(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        self.transition(id, ReservationStatus::CheckedIn).await
    }

    async fn check_out(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        self.transition(id, ReservationStatus::CheckedOut).await
    }

    async fn cancel(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        self.transition(id, ReservationStatus::Cancelled).await
    }

    async fn update_note(
        &self,
        id: ReservationId,
        note: String,
    ) -> Result<abi::Reservation, Error> {
        let id = parse_reservation_id(&id)?;
        let rsvp = sqlx::query_as(&format!(
            "UPDATE rsvp.reservations SET note = $1, updated_at = now() WHERE id = $2 RETURNING {}",
            RESERVATION_COLUMNS
        ))
        .bind(note)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rsvp)
    }

    async fn delete(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        let id = parse_reservation_id(&id)?;
        let rsvp = sqlx::query_as(&format!(
            "DELETE FROM rsvp.reservations WHERE id = $1 RETURNING {}",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        info!(%id, "reservation deleted");
        Ok(rsvp)
    }

    async fn get(&self, id: ReservationId) -> Result<abi::Reservation, Error> {
        let id = parse_reservation_id(&id)?;
        let rsvp = sqlx::query_as(&format!(
            "SELECT {} FROM rsvp.reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rsvp)
    }

    async fn query(&self, query: abi::ReservationQuery) -> Result<Vec<abi::Reservation>, Error> {
        query.validate()?;
        let (start, end) = query.bounds()?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM rsvp.reservations WHERE TRUE",
            RESERVATION_COLUMNS
        ));
        if !query.room_type_id.is_empty() {
            builder
                .push(" AND room_type_id = ")
                .push_bind(parse_room_type_id(&query.room_type_id)?);
        }
        let status = query.status();
        if status != ReservationStatus::Unknown {
            builder
                .push(" AND status = ")
                .push_bind(status.to_string())
                .push("::rsvp.reservation_status");
        }
        if let Some(start) = start {
            builder.push(" AND check_out > ").push_bind(start);
        }
        if let Some(end) = end {
            builder.push(" AND check_in < ").push_bind(end);
        }
        let direction = if query.desc { "DESC" } else { "ASC" };
        builder
            .push(format!(" ORDER BY check_in {direction}, id {direction} LIMIT "))
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rsvps = builder
            .build_query_as::<abi::Reservation>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rsvps)
    }
}

#[async_trait]
impl RoomInventory for ReservationManager {
    #[instrument(skip_all, fields(property_id = %room_type.property_id))]
    async fn create_room_type(&self, mut room_type: abi::RoomType) -> Result<abi::RoomType, Error> {
        room_type.validate()?;
        let id: Uuid = sqlx::query(
            "INSERT INTO rsvp.room_types (property_id, name, total_units) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&room_type.property_id)
        .bind(&room_type.name)
        .bind(room_type.total_units as i32)
        .fetch_one(&self.pool)
        .await?
        .get(0);
        room_type.id = id.to_string();
        info!(id = %room_type.id, total_units = room_type.total_units, "room type created");
        Ok(room_type)
    }

    async fn get_room_type(&self, id: RoomTypeId) -> Result<abi::RoomType, Error> {
        let id = parse_room_type_id(&id)?;
        let room_type = sqlx::query_as(
            "SELECT id, property_id, name, total_units FROM rsvp.room_types WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(room_type)
    }

    async fn list_room_types(&self, property_id: String) -> Result<Vec<abi::RoomType>, Error> {
        let room_types = sqlx::query_as(
            "SELECT id, property_id, name, total_units FROM rsvp.room_types WHERE property_id = $1 ORDER BY name, id",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(room_types)
    }

    async fn committed_stays(
        &self,
        room_type_id: &str,
        window: &StayWindow,
    ) -> Result<Vec<Stay>, Error> {
        let room_type_id = parse_room_type_id(room_type_id)?;
        let mut conn = self.pool.acquire().await?;
        fetch_committed(&mut conn, room_type_id, window).await
    }
}

impl ReservationManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn from_config(config: &DbConfig) -> Result<Self, Error> {
        let pool = PgPoolOptions::default()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::DbError(e.into()))
    }

    #[instrument(skip(self))]
    async fn transition(
        &self,
        id: ReservationId,
        to: ReservationStatus,
    ) -> Result<abi::Reservation, Error> {
        let uuid = parse_reservation_id(&id)?;
        let mut tx = self.pool.begin().await?;

        let current: abi::Reservation = sqlx::query_as(&format!(
            "SELECT {} FROM rsvp.reservations WHERE id = $1 FOR UPDATE",
            RESERVATION_COLUMNS
        ))
        .bind(uuid)
        .fetch_one(&mut *tx)
        .await?;
        let from = current.status();
        from.ensure_transition(to)?;

        if to.holds_inventory() && !from.holds_inventory() {
            let stay = Stay::new(current.window()?, current.rooms_booked, to);
            let room_type_id = parse_room_type_id(&current.room_type_id)?;
            let total_units = lock_room_type(&mut tx, room_type_id).await?;
            let committed = fetch_committed(&mut tx, room_type_id, &stay.window).await?;
            check_capacity(&current.room_type_id, total_units, &committed, &stay)?;
        }

        let rsvp = sqlx::query_as(&format!(
            "UPDATE rsvp.reservations SET status = $1::rsvp.reservation_status, updated_at = now() \
             WHERE id = $2 RETURNING {}",
            RESERVATION_COLUMNS
        ))
        .bind(to.to_string())
        .bind(uuid)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(%from, %to, "reservation status changed");
        Ok(rsvp)
    }
}

async fn lock_room_type(conn: &mut PgConnection, id: Uuid) -> Result<u32, Error> {
    let total_units: i32 =
        sqlx::query("SELECT total_units FROM rsvp.room_types WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?
            .get(0);
    Ok(total_units.max(0) as u32)
}

async fn fetch_committed(
    conn: &mut PgConnection,
    room_type_id: Uuid,
    window: &StayWindow,
) -> Result<Vec<Stay>, Error> {
    let holding: Vec<String> = ReservationStatus::HOLDING
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = sqlx::query(
        "SELECT check_in, check_out, COALESCE(rooms_booked, 0) AS rooms_booked, status::text AS status \
         FROM rsvp.reservations \
         WHERE room_type_id = $1 AND status::text = ANY($2) AND check_in < $4 AND check_out > $3",
    )
    .bind(room_type_id)
    .bind(holding)
    .bind(window.check_in())
    .bind(window.check_out())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| -> Result<Stay, Error> {
            let check_in: NaiveDate = row.try_get("check_in")?;
            let check_out: NaiveDate = row.try_get("check_out")?;
            let rooms_booked: i32 = row.try_get("rooms_booked")?;
            let status: String = row.try_get("status")?;
            Ok(Stay::new(
                StayWindow::stored(check_in, check_out)?,
                rooms_booked.max(0) as u32,
                status.parse()?,
            ))
        })
        .collect()
}

fn parse_reservation_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|_| Error::InvalidReservationId(id.to_string()))
}

fn parse_room_type_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|_| Error::InvalidRoomTypeId(id.to_string()))
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
