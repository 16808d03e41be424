//! Customer persistence (`customers` table).
//!
//! The address value object is flattened into nullable columns: either all
//! four are set or none is.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use tracing::{Span, instrument};

use checkout_core::{CustomerId, Entity};
use checkout_customer::{Address, Customer};

use super::Repository;
use crate::db::Database;
use crate::error::{RepositoryError, from_column, map_sqlx_error, to_column};

const ENTITY: &str = "customer";

const FIND_CUSTOMER: &str = r#"
    SELECT id, name, street, number, zipcode, city, active, reward_points
    FROM customers
    WHERE id = ?1
"#;

const FIND_ALL_CUSTOMERS: &str = r#"
    SELECT id, name, street, number, zipcode, city, active, reward_points
    FROM customers
    ORDER BY id
"#;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: Database,
}

impl CustomerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository<Customer> for CustomerRepository {
    #[instrument(skip(self, customer), fields(customer_id = %customer.id()), err)]
    async fn create(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let row = CustomerRow::from_domain(customer)?;

        sqlx::query(
            r#"
            INSERT INTO customers (
                id,
                name,
                street,
                number,
                zipcode,
                city,
                active,
                reward_points
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.street)
        .bind(row.number)
        .bind(&row.zipcode)
        .bind(&row.city)
        .bind(row.active)
        .bind(row.reward_points)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;

        Ok(())
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id()), err)]
    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let row = CustomerRow::from_domain(customer)?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?2,
                street = ?3,
                number = ?4,
                zipcode = ?5,
                city = ?6,
                active = ?7,
                reward_points = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.street)
        .bind(row.number)
        .bind(&row.zipcode)
        .bind(&row.city)
        .bind(row.active)
        .bind(row.reward_points)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(ENTITY, row.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn find(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(FIND_CUSTOMER)
            .bind(id.as_str())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_customer", e))?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id.as_str()))?;

        let row = CustomerRow::from_row(&row).map_err(|e| map_sqlx_error("decode_customer", e))?;
        row.into_domain()
    }

    #[instrument(skip(self), fields(customer_count = tracing::field::Empty), err)]
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query(FIND_ALL_CUSTOMERS)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| map_sqlx_error("find_all_customers", e))?;

        let mut customers = Vec::with_capacity(rows.len());
        for row in rows {
            let row =
                CustomerRow::from_row(&row).map_err(|e| map_sqlx_error("decode_customer", e))?;
            customers.push(row.into_domain()?);
        }

        Span::current().record("customer_count", customers.len());
        Ok(customers)
    }
}

// SQLx row types

#[derive(Debug, Clone, PartialEq, Eq)]
struct CustomerRow {
    id: String,
    name: String,
    street: Option<String>,
    number: Option<i64>,
    zipcode: Option<String>,
    city: Option<String>,
    active: bool,
    reward_points: i64,
}

impl<'r> FromRow<'r, SqliteRow> for CustomerRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            street: row.try_get("street")?,
            number: row.try_get("number")?,
            zipcode: row.try_get("zipcode")?,
            city: row.try_get("city")?,
            active: row.try_get("active")?,
            reward_points: row.try_get("reward_points")?,
        })
    }
}

impl CustomerRow {
    fn from_domain(customer: &Customer) -> Result<Self, RepositoryError> {
        let id = customer.id().to_string();
        let reward_points = to_column(ENTITY, &id, "reward_points", customer.reward_points())?;
        let address = customer.address();

        Ok(Self {
            name: customer.name().to_string(),
            street: address.map(|a| a.street().to_string()),
            number: address.map(|a| i64::from(a.number())),
            zipcode: address.map(|a| a.zip().to_string()),
            city: address.map(|a| a.city().to_string()),
            active: customer.is_active(),
            reward_points,
            id,
        })
    }

    fn into_domain(self) -> Result<Customer, RepositoryError> {
        let address = match (self.street, self.number, self.zipcode, self.city) {
            (None, None, None, None) => None,
            (Some(street), Some(number), Some(zipcode), Some(city)) => {
                let number: u32 = from_column(ENTITY, &self.id, "number", number)?;
                let address = Address::new(street, number, zipcode, city)
                    .map_err(|e| RepositoryError::from_domain(ENTITY, self.id.as_str(), e))?;
                Some(address)
            }
            _ => {
                return Err(RepositoryError::invalid_record(
                    ENTITY,
                    self.id,
                    "address columns are partially set",
                ));
            }
        };

        let reward_points = from_column(ENTITY, &self.id, "reward_points", self.reward_points)?;
        let id = CustomerId::parse(self.id.as_str())
            .map_err(|e| RepositoryError::from_domain(ENTITY, self.id.as_str(), e))?;

        Customer::restore(id, self.name, address, self.active, reward_points)
            .map_err(|e| RepositoryError::from_domain(ENTITY, self.id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_without_address() -> CustomerRow {
        CustomerRow {
            id: "1".to_string(),
            name: "Customer 1".to_string(),
            street: None,
            number: None,
            zipcode: None,
            city: None,
            active: false,
            reward_points: 0,
        }
    }

    #[test]
    fn customer_without_address_maps_to_null_columns() {
        let customer = Customer::new("1", "Customer 1").unwrap();
        let row = CustomerRow::from_domain(&customer).unwrap();
        assert_eq!(row, row_without_address());
        assert_eq!(row.into_domain().unwrap(), customer);
    }

    #[test]
    fn address_is_flattened_and_rebuilt() {
        let mut customer = Customer::new("2", "Customer 2").unwrap();
        customer.change_address(Address::new("Street A", 32, "Zipcode A-32", "City A").unwrap());
        customer.activate().unwrap();
        customer.add_reward_points(7);

        let row = CustomerRow::from_domain(&customer).unwrap();
        assert_eq!(row.street.as_deref(), Some("Street A"));
        assert_eq!(row.number, Some(32));
        assert_eq!(row.zipcode.as_deref(), Some("Zipcode A-32"));
        assert_eq!(row.city.as_deref(), Some("City A"));
        assert!(row.active);
        assert_eq!(row.reward_points, 7);

        assert_eq!(row.into_domain().unwrap(), customer);
    }

    #[test]
    fn partial_address_is_an_invalid_record() {
        let row = CustomerRow {
            street: Some("Street".to_string()),
            ..row_without_address()
        };
        let err = row.into_domain().unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord { entity: "customer", .. }));
    }
}
