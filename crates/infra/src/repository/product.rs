//! Product persistence (`products` table).

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use tracing::{Span, instrument};

use checkout_core::{Entity, ProductId};
use checkout_product::Product;

use super::Repository;
use crate::db::Database;
use crate::error::{RepositoryError, from_column, map_sqlx_error, to_column};

const ENTITY: &str = "product";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: Database,
}

impl ProductRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository<Product> for ProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        let row = ProductRow::from_domain(product)?;

        sqlx::query("INSERT INTO products (id, name, price) VALUES (?1, ?2, ?3)")
            .bind(&row.id)
            .bind(&row.name)
            .bind(row.price)
            .execute(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let row = ProductRow::from_domain(product)?;

        let result = sqlx::query("UPDATE products SET name = ?2, price = ?3 WHERE id = ?1")
            .bind(&row.id)
            .bind(&row.name)
            .bind(row.price)
            .execute(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(ENTITY, row.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query("SELECT id, name, price FROM products WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id.as_str()))?;

        let row = ProductRow::from_row(&row).map_err(|e| map_sqlx_error("decode_product", e))?;
        row.into_domain()
    }

    #[instrument(skip(self), fields(product_count = tracing::field::Empty), err)]
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, price FROM products ORDER BY id")
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_all_products", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let row =
                ProductRow::from_row(&row).map_err(|e| map_sqlx_error("decode_product", e))?;
            products.push(row.into_domain()?);
        }

        Span::current().record("product_count", products.len());
        Ok(products)
    }
}

// SQLx row types

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProductRow {
    id: String,
    name: String,
    price: i64,
}

impl<'r> FromRow<'r, SqliteRow> for ProductRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
        })
    }
}

impl ProductRow {
    fn from_domain(product: &Product) -> Result<Self, RepositoryError> {
        let id = product.id().to_string();
        let price = to_column(ENTITY, &id, "price", product.price())?;
        Ok(Self {
            id,
            name: product.name().to_string(),
            price,
        })
    }

    fn into_domain(self) -> Result<Product, RepositoryError> {
        let price = from_column(ENTITY, &self.id, "price", self.price)?;
        let id = ProductId::parse(self.id.as_str())
            .map_err(|e| RepositoryError::from_domain(ENTITY, self.id.as_str(), e))?;
        Product::restore(id, self.name, price)
            .map_err(|e| RepositoryError::from_domain(ENTITY, self.id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_mapping_keeps_every_field() {
        let product = Product::new("123", "Product 123", 1050).unwrap();
        let row = ProductRow::from_domain(&product).unwrap();
        assert_eq!(
            row,
            ProductRow {
                id: "123".to_string(),
                name: "Product 123".to_string(),
                price: 1050,
            }
        );
        assert_eq!(row.into_domain().unwrap(), product);
    }

    #[test]
    fn negative_price_is_an_invalid_record() {
        let row = ProductRow {
            id: "1".to_string(),
            name: "Broken".to_string(),
            price: -1,
        };
        let err = row.into_domain().unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord { entity: "product", .. }));
    }
}
