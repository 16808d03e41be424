//! Order persistence (`orders` + `order_items` tables).
//!
//! An order is written as one parent row and one child row per item, inside a
//! single transaction. Items are read back in insertion order (`rowid`), which
//! matches the order of `Order::items()` at the time of the last write.
//!
//! `update` is a full replace: the parent row is rewritten and the whole child
//! set is deleted and reinserted. There is no item-level diffing.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, Transaction};
use tracing::{Span, instrument, warn};

use checkout_core::{CustomerId, Entity, OrderId, OrderItemId, ProductId};
use checkout_orders::{Order, OrderItem};

use super::Repository;
use crate::db::Database;
use crate::error::{RepositoryError, from_column, map_sqlx_error, to_column};

const ENTITY: &str = "order";
const ITEM_ENTITY: &str = "order_item";

/// Order repository.
///
/// Every write runs in its own transaction. If any statement fails, the
/// transaction is dropped without commit and SQLite rolls it back, so an order
/// is never visible with a partial item set.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Database,
}

impl OrderRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository<Order> for OrderRepository {
    #[instrument(
        skip(self, order),
        fields(order_id = %order.id(), customer_id = %order.customer_id(), item_count = order.items().len()),
        err
    )]
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let (row, items) = order_to_rows(order)?;

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("INSERT INTO orders (id, customer_id, total) VALUES (?1, ?2, ?3)")
            .bind(&row.id)
            .bind(&row.customer_id)
            .bind(row.total)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        insert_items(&mut tx, &items).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(())
    }

    #[instrument(
        skip(self, order),
        fields(
            order_id = %order.id(),
            customer_id = %order.customer_id(),
            item_count = order.items().len(),
            replaced_items = tracing::field::Empty
        ),
        err
    )]
    async fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        let (row, items) = order_to_rows(order)?;

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query("UPDATE orders SET customer_id = ?2, total = ?3 WHERE id = ?1")
            .bind(&row.id)
            .bind(&row.customer_id)
            .bind(row.total)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(RepositoryError::not_found(ENTITY, row.id));
        }

        let deleted = sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(&row.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_items", e))?;

        insert_items(&mut tx, &items).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("replaced_items", deleted.rows_affected());
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn find(&self, id: &OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query("SELECT id, customer_id, total FROM orders WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_order", e))?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id.as_str()))?;
        let row = OrderRow::from_row(&row).map_err(|e| map_sqlx_error("decode_order", e))?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, name, price, quantity
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| map_sqlx_error("find_order_items", e))?;

        let mut items = Vec::with_capacity(item_rows.len());
        for item in item_rows {
            items.push(
                OrderItemRow::from_row(&item)
                    .map_err(|e| map_sqlx_error("decode_order_item", e))?,
            );
        }

        order_from_rows(row, items)
    }

    #[instrument(skip(self), fields(order_count = tracing::field::Empty), err)]
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let order_rows = sqlx::query("SELECT id, customer_id, total FROM orders ORDER BY id")
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_all_orders", e))?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, name, price, quantity
            FROM order_items
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| map_sqlx_error("find_all_order_items", e))?;

        let mut items_by_order: HashMap<String, Vec<OrderItemRow>> = HashMap::new();
        for item in item_rows {
            let item = OrderItemRow::from_row(&item)
                .map_err(|e| map_sqlx_error("decode_order_item", e))?;
            items_by_order
                .entry(item.order_id.clone())
                .or_default()
                .push(item);
        }

        let mut orders = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let row = OrderRow::from_row(&row).map_err(|e| map_sqlx_error("decode_order", e))?;
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            orders.push(order_from_rows(row, items)?);
        }

        Span::current().record("order_count", orders.len());
        Ok(orders)
    }
}

/// Insert child rows in slice order.
async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    items: &[OrderItemRow],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id,
                order_id,
                product_id,
                name,
                price,
                quantity
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order_item", e))?;
    }
    Ok(())
}

// SQLx row types

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderRow {
    id: String,
    customer_id: String,
    total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    name: String,
    price: i64,
    quantity: i64,
}

impl<'r> FromRow<'r, SqliteRow> for OrderRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            total: row.try_get("total")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for OrderItemRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(OrderItemRow {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

/// Split an order into its parent row and ordered child rows.
fn order_to_rows(order: &Order) -> Result<(OrderRow, Vec<OrderItemRow>), RepositoryError> {
    let order_id = order.id().to_string();

    let row = OrderRow {
        total: to_column(ENTITY, &order_id, "total", order.total())?,
        customer_id: order.customer_id().to_string(),
        id: order_id.clone(),
    };

    let mut items = Vec::with_capacity(order.items().len());
    for item in order.items() {
        let item_id = item.id().to_string();
        items.push(OrderItemRow {
            price: to_column(ITEM_ENTITY, &item_id, "price", item.price())?,
            quantity: i64::from(item.quantity()),
            order_id: order_id.clone(),
            product_id: item.product_id().to_string(),
            name: item.name().to_string(),
            id: item_id,
        });
    }

    Ok((row, items))
}

/// Rebuild an order from its parent row and ordered child rows.
///
/// The stored `total` is informational only; the returned aggregate derives
/// its total from the items.
fn order_from_rows(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
    let mut order_items = Vec::with_capacity(items.len());
    for item in items {
        order_items.push(item_from_row(item)?);
    }

    let id = OrderId::parse(row.id.as_str())
        .map_err(|e| RepositoryError::from_domain(ENTITY, row.id.as_str(), e))?;
    let customer_id = CustomerId::parse(row.customer_id)
        .map_err(|e| RepositoryError::from_domain(ENTITY, row.id.as_str(), e))?;
    let order = Order::from_parts(id, customer_id, order_items)
        .map_err(|e| RepositoryError::from_domain(ENTITY, row.id.as_str(), e))?;

    if i64::try_from(order.total()).ok() != Some(row.total) {
        warn!(
            order_id = %row.id,
            stored_total = row.total,
            derived_total = order.total(),
            "stored order total differs from item sum"
        );
    }

    Ok(order)
}

fn item_from_row(row: OrderItemRow) -> Result<OrderItem, RepositoryError> {
    let price: u64 = from_column(ITEM_ENTITY, &row.id, "price", row.price)?;
    let quantity: u32 = from_column(ITEM_ENTITY, &row.id, "quantity", row.quantity)?;

    let id = OrderItemId::parse(row.id.as_str())
        .map_err(|e| RepositoryError::from_domain(ITEM_ENTITY, row.id.as_str(), e))?;
    let product_id = ProductId::parse(row.product_id)
        .map_err(|e| RepositoryError::from_domain(ITEM_ENTITY, row.id.as_str(), e))?;

    OrderItem::from_parts(id, row.name, price, product_id, quantity)
        .map_err(|e| RepositoryError::from_domain(ITEM_ENTITY, row.id, e))
}
