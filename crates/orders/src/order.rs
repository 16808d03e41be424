use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use checkout_core::{AggregateRoot, CustomerId, DomainError, DomainResult, Entity, OrderId};

use crate::order_item::{MAX_AMOUNT, OrderItem};

/// Aggregate root: Order.
///
/// Owns its line items. The item list is fixed at construction; to change an
/// order, build a new `Order` with the complete desired item set and hand it
/// to the repository's `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderParts", into = "OrderParts")]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        Self::from_parts(OrderId::parse(id)?, CustomerId::parse(customer_id)?, items)
    }

    /// Build an order from typed parts, enforcing the aggregate invariants:
    ///
    /// - at least one item
    /// - item ids unique within the order
    /// - total within [`MAX_AMOUNT`]
    pub fn from_parts(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("items are required"));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(DomainError::validation(format!(
                    "duplicate item id: {}",
                    item.id()
                )));
            }
        }

        let total = items
            .iter()
            .try_fold(0u64, |acc, item| acc.checked_add(item.total()));
        match total {
            Some(total) if total <= MAX_AMOUNT => {}
            _ => return Err(DomainError::validation("order total exceeds supported range")),
        }

        Ok(Self {
            id,
            customer_id,
            items,
        })
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Line items in the order they were supplied.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Sum of `price * quantity` over all items, recomputed on every call.
    pub fn total(&self) -> u64 {
        self.items.iter().map(OrderItem::total).sum()
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Order {}

/// Unvalidated serde shape; deserialization goes through `Order::from_parts`.
#[derive(Serialize, Deserialize)]
struct OrderParts {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
}

impl TryFrom<OrderParts> for Order {
    type Error = DomainError;

    fn try_from(parts: OrderParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts.id, parts.customer_id, parts.items)
    }
}

impl From<Order> for OrderParts {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            items: order.items,
        }
    }
}
