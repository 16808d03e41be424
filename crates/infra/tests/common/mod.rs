//! Shared fixtures for the repository integration tests.

#![allow(dead_code)]

use checkout_customer::{Address, Customer};
use checkout_infra::{CustomerRepository, Database, ProductRepository, Repository};
use checkout_orders::{Order, OrderItem};
use checkout_product::Product;

/// Fresh migrated in-memory store with test logging enabled.
pub async fn database() -> Database {
    checkout_observability::init_for_tests();
    Database::in_memory().await.unwrap()
}

pub fn customer(id: &str) -> Customer {
    let mut customer = Customer::new(id, "Customer 1").unwrap();
    customer.change_address(Address::new("Street 1", 123, "99999-999", "City").unwrap());
    customer.activate().unwrap();
    customer
}

pub fn product(id: &str, price: u64) -> Product {
    Product::new(id, format!("Product {id}"), price).unwrap()
}

/// Insert the customer `c1` and products `p1` (100) and `p2` (200).
pub async fn seed(db: &Database) {
    CustomerRepository::new(db.clone())
        .create(&customer("c1"))
        .await
        .unwrap();

    let products = ProductRepository::new(db.clone());
    products.create(&product("p1", 100)).await.unwrap();
    products.create(&product("p2", 200)).await.unwrap();
}

pub fn item(id: &str, product_id: &str, price: u64, quantity: u32) -> OrderItem {
    OrderItem::new(id, format!("Item {id}"), price, product_id, quantity).unwrap()
}

pub fn order(id: &str, items: Vec<OrderItem>) -> Order {
    Order::new(id, "c1", items).unwrap()
}
