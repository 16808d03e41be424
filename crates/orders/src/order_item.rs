use serde::{Deserialize, Serialize};

use checkout_core::{
    DomainError, DomainResult, Entity, OrderItemId, ProductId, ensure_not_blank,
};
use checkout_product::Product;

/// Largest monetary amount an order line or order may carry.
///
/// Amounts are persisted as signed 64-bit integers.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Order line: a product snapshot (name, unit price) and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderItemParts", into = "OrderItemParts")]
pub struct OrderItem {
    id: OrderItemId,
    name: String,
    /// Unit price in smallest currency unit, captured when the line was created.
    price: u64,
    product_id: ProductId,
    quantity: u32,
}

impl OrderItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: u64,
        product_id: impl Into<String>,
        quantity: u32,
    ) -> DomainResult<Self> {
        Self::from_parts(
            OrderItemId::parse(id)?,
            name.into(),
            price,
            ProductId::parse(product_id)?,
            quantity,
        )
    }

    /// Build a line that snapshots the product's current name and price.
    pub fn for_product(
        id: impl Into<String>,
        product: &Product,
        quantity: u32,
    ) -> DomainResult<Self> {
        Self::from_parts(
            OrderItemId::parse(id)?,
            product.name().to_string(),
            product.price(),
            product.id().clone(),
            quantity,
        )
    }

    pub fn from_parts(
        id: OrderItemId,
        name: String,
        price: u64,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<Self> {
        ensure_not_blank("item name", &name)?;
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        match price.checked_mul(u64::from(quantity)) {
            Some(total) if total <= MAX_AMOUNT => {}
            _ => return Err(DomainError::validation("item total exceeds supported range")),
        }

        Ok(Self {
            id,
            name,
            price,
            product_id,
            quantity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Line total: unit price × quantity.
    ///
    /// Every constructor checks this product against [`MAX_AMOUNT`].
    pub fn total(&self) -> u64 {
        self.price * u64::from(self.quantity)
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Unvalidated serde shape; deserialization goes through `OrderItem::from_parts`.
#[derive(Serialize, Deserialize)]
struct OrderItemParts {
    id: OrderItemId,
    name: String,
    price: u64,
    product_id: ProductId,
    quantity: u32,
}

impl TryFrom<OrderItemParts> for OrderItem {
    type Error = DomainError;

    fn try_from(parts: OrderItemParts) -> Result<Self, Self::Error> {
        Self::from_parts(
            parts.id,
            parts.name,
            parts.price,
            parts.product_id,
            parts.quantity,
        )
    }
}

impl From<OrderItem> for OrderItemParts {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}
