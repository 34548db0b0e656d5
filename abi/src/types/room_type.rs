use sqlx::{postgres::PgRow, types::Uuid, FromRow, Row};

use crate::{Error, RoomType};

impl RoomType {
    pub fn new(property_id: impl Into<String>, name: impl Into<String>, total_units: u32) -> Self {
        Self {
            id: "".to_string(),
            property_id: property_id.into(),
            name: name.into(),
            total_units,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.property_id.trim().is_empty() {
            return Err(Error::InvalidRoomType("property_id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRoomType("name is required".into()));
        }
        if self.total_units > i32::MAX as u32 {
            return Err(Error::InvalidRoomType(format!(
                "total_units {} is too large",
                self.total_units
            )));
        }
        Ok(())
    }
}

impl FromRow<'_, PgRow> for RoomType {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let total_units: i32 = row.try_get("total_units")?;
        Ok(Self {
            id: id.to_string(),
            property_id: row.try_get("property_id")?,
            name: row.try_get("name")?,
            total_units: total_units.max(0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_type_should_validate() {
        assert_eq!(RoomType::new("seaside-inn", "Deluxe King", 5).validate(), Ok(()));
        assert_eq!(RoomType::new("seaside-inn", "Closed wing", 0).validate(), Ok(()));
    }

    #[test]
    fn room_type_without_name_should_fail() {
        assert_eq!(
            RoomType::new("seaside-inn", " ", 5).validate(),
            Err(Error::InvalidRoomType("name is required".into()))
        );
        assert_eq!(
            RoomType::new("", "Deluxe King", 5).validate(),
            Err(Error::InvalidRoomType("property_id is required".into()))
        );
    }
}
