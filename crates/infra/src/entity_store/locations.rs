use std::collections::HashMap;

use sqlx::{FromRow, SqliteConnection};

use stockroom_core::{DomainError, EntityKind, LocationId};
use stockroom_inventory::{Location, NewLocation, validate_name};

use crate::error::{InventoryError, InventoryResult, is_unique_violation, map_sqlx_error};

#[derive(Debug, FromRow)]
struct LocationRow {
    id: i64,
    name: String,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: LocationId::new(row.id),
            name: row.name,
        }
    }
}

async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> InventoryResult<Option<Location>> {
    let row: Option<LocationRow> = sqlx::query_as("SELECT id, name FROM locations WHERE name = ?1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("location_by_name", e))?;
    Ok(row.map(Location::from))
}

pub async fn location_by_id(conn: &mut SqliteConnection, id: LocationId) -> InventoryResult<Location> {
    let row: Option<LocationRow> = sqlx::query_as("SELECT id, name FROM locations WHERE id = ?1")
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("location_by_id", e))?;
    row.map(Location::from)
        .ok_or_else(|| DomainError::unknown_location(id).into())
}

pub async fn location_by_name(conn: &mut SqliteConnection, name: &str) -> InventoryResult<Location> {
    find_by_name(conn, name.trim())
        .await?
        .ok_or_else(|| DomainError::unknown_location(name.trim()).into())
}

pub async fn list_locations(conn: &mut SqliteConnection) -> InventoryResult<Vec<Location>> {
    let rows: Vec<LocationRow> = sqlx::query_as("SELECT id, name FROM locations ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;
    Ok(rows.into_iter().map(Location::from).collect())
}

pub async fn location_names(
    conn: &mut SqliteConnection,
) -> InventoryResult<HashMap<LocationId, String>> {
    Ok(list_locations(conn)
        .await?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect())
}

pub async fn insert_location(conn: &mut SqliteConnection, new: NewLocation) -> InventoryResult<Location> {
    if find_by_name(conn, new.name()).await?.is_some() {
        return Err(DomainError::duplicate_name(EntityKind::Location, new.name()).into());
    }

    let result = sqlx::query("INSERT INTO locations (name) VALUES (?1)")
        .bind(new.name())
        .execute(&mut *conn)
        .await
        .map_err(|e| name_conflict_or(e, new.name(), "insert_location"))?;

    Ok(new.into_location(LocationId::new(result.last_insert_rowid())))
}

pub async fn rename_location(
    conn: &mut SqliteConnection,
    id: LocationId,
    name: &str,
) -> InventoryResult<Location> {
    let name = validate_name(EntityKind::Location, name)?;
    let mut location = location_by_id(conn, id).await?;
    if location.name == name {
        return Ok(location);
    }
    if find_by_name(conn, &name).await?.is_some() {
        return Err(DomainError::duplicate_name(EntityKind::Location, name).into());
    }

    sqlx::query("UPDATE locations SET name = ?1 WHERE id = ?2")
        .bind(&name)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| name_conflict_or(e, &name, "rename_location"))?;

    location.name = name;
    Ok(location)
}

pub async fn delete_location_row(conn: &mut SqliteConnection, id: LocationId) -> InventoryResult<()> {
    let result = sqlx::query("DELETE FROM locations WHERE id = ?1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_location", e))?;
    if result.rows_affected() == 0 {
        return Err(DomainError::unknown_location(id).into());
    }
    Ok(())
}

fn name_conflict_or(err: sqlx::Error, name: &str, operation: &'static str) -> InventoryError {
    if is_unique_violation(&err) {
        DomainError::duplicate_name(EntityKind::Location, name).into()
    } else {
        map_sqlx_error(operation, err)
    }
}
