use std::collections::HashMap;

use sqlx::{FromRow, SqliteConnection};

use stockroom_core::{DomainError, EntityKind, ProductId};
use stockroom_inventory::{NewProduct, Product, validate_name};

use crate::error::{InventoryError, InventoryResult, is_unique_violation, map_sqlx_error};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    total_quantity: i64,
    unallocated_quantity: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            total_quantity: row.total_quantity,
            unallocated_quantity: row.unallocated_quantity,
        }
    }
}

const SELECT_PRODUCT: &str =
    "SELECT id, name, total_quantity, unallocated_quantity FROM products";

async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> InventoryResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE name = ?1"))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("product_by_name", e))?;
    Ok(row.map(Product::from))
}

async fn find_by_id(conn: &mut SqliteConnection, id: ProductId) -> InventoryResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("product_by_id", e))?;
    Ok(row.map(Product::from))
}

pub async fn product_by_id(conn: &mut SqliteConnection, id: ProductId) -> InventoryResult<Product> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DomainError::unknown_product(id).into())
}

pub async fn product_by_name(conn: &mut SqliteConnection, name: &str) -> InventoryResult<Product> {
    find_by_name(conn, name.trim())
        .await?
        .ok_or_else(|| DomainError::unknown_product(name.trim()).into())
}

pub async fn list_products(conn: &mut SqliteConnection) -> InventoryResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY id"))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Id → name for every current product.
pub async fn product_names(conn: &mut SqliteConnection) -> InventoryResult<HashMap<ProductId, String>> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM products")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("product_names", e))?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| (ProductId::new(id), name))
        .collect())
}

/// Register a product; `unallocated_quantity` starts equal to the total.
pub async fn insert_product(conn: &mut SqliteConnection, new: NewProduct) -> InventoryResult<Product> {
    if find_by_name(conn, new.name()).await?.is_some() {
        return Err(DomainError::duplicate_name(EntityKind::Product, new.name()).into());
    }

    let result = sqlx::query(
        "INSERT INTO products (name, total_quantity, unallocated_quantity) VALUES (?1, ?2, ?3)",
    )
    .bind(new.name())
    .bind(new.total_quantity())
    .bind(new.initial_unallocated())
    .execute(&mut *conn)
    .await
    .map_err(|e| name_conflict_or(e, new.name(), "insert_product"))?;

    Ok(new.into_product(ProductId::new(result.last_insert_rowid())))
}

/// Change a product's name. Quantities are untouched.
pub async fn rename_product(
    conn: &mut SqliteConnection,
    id: ProductId,
    name: &str,
) -> InventoryResult<Product> {
    let name = validate_name(EntityKind::Product, name)?;
    let mut product = product_by_id(conn, id).await?;
    if product.name == name {
        return Ok(product);
    }
    if find_by_name(conn, &name).await?.is_some() {
        return Err(DomainError::duplicate_name(EntityKind::Product, name).into());
    }

    sqlx::query("UPDATE products SET name = ?1 WHERE id = ?2")
        .bind(&name)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| name_conflict_or(e, &name, "rename_product"))?;

    product.name = name;
    Ok(product)
}

/// Unallocated quantity `id` would have after adding `delta`. Writes nothing.
///
/// `None` when the product no longer exists; `InvalidQuantity` when the
/// counter would overflow.
pub async fn projected_unallocated(
    conn: &mut SqliteConnection,
    id: ProductId,
    delta: i64,
) -> InventoryResult<Option<i64>> {
    let Some(mut product) = find_by_id(conn, id).await? else {
        return Ok(None);
    };
    product.apply_allocation_delta(delta)?;
    Ok(Some(product.unallocated_quantity))
}

/// Add `delta` to a product's unallocated quantity; returns rows affected.
///
/// The new value is computed with checked arithmetic before the write, so an
/// overflowing delta fails with `InvalidQuantity` and changes nothing.
pub async fn adjust_unallocated(
    conn: &mut SqliteConnection,
    id: ProductId,
    delta: i64,
) -> InventoryResult<u64> {
    let Some(unallocated) = projected_unallocated(conn, id, delta).await? else {
        return Ok(0);
    };
    let result = sqlx::query("UPDATE products SET unallocated_quantity = ?1 WHERE id = ?2")
        .bind(unallocated)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("adjust_unallocated", e))?;
    Ok(result.rows_affected())
}

/// Persist `product`'s new total and unallocated quantity, guarded on the
/// total it was read with. Both values come from `Product::set_total_quantity`,
/// which has already rejected an overflowing counter.
///
/// Zero affected rows means a concurrent writer changed the total after it
/// was read, which is reported as a store failure.
pub async fn write_quantities(
    conn: &mut SqliteConnection,
    product: &Product,
    expected_total: i64,
) -> InventoryResult<()> {
    let result = sqlx::query(
        "UPDATE products \
         SET total_quantity = ?1, unallocated_quantity = ?4 \
         WHERE id = ?2 AND total_quantity = ?3",
    )
    .bind(product.total_quantity)
    .bind(product.id.get())
    .bind(expected_total)
    .bind(product.unallocated_quantity)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("write_quantities", e))?;

    if result.rows_affected() == 0 {
        return Err(InventoryError::store(
            "write_quantities",
            format!("product {} changed concurrently", product.id),
        ));
    }
    Ok(())
}

pub async fn delete_product_row(conn: &mut SqliteConnection, id: ProductId) -> InventoryResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_product", e))?;
    if result.rows_affected() == 0 {
        return Err(DomainError::unknown_product(id).into());
    }
    Ok(())
}

fn name_conflict_or(err: sqlx::Error, name: &str, operation: &'static str) -> InventoryError {
    if is_unique_violation(&err) {
        DomainError::duplicate_name(EntityKind::Product, name).into()
    } else {
        map_sqlx_error(operation, err)
    }
}
