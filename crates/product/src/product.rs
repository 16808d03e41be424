use serde::{Deserialize, Serialize};

use checkout_core::{DomainError, DomainResult, Entity, ProductId, ensure_not_blank};

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProductParts", into = "ProductParts")]
pub struct Product {
    id: ProductId,
    name: String,
    /// Price in smallest currency unit (e.g., cents).
    price: u64,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> DomainResult<Self> {
        Self::restore(ProductId::parse(id)?, name.into(), price)
    }

    /// Rebuild a product from already-persisted state.
    pub fn restore(id: ProductId, name: String, price: u64) -> DomainResult<Self> {
        ensure_not_blank("name", &name)?;
        Ok(Self { id, name, price })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        ensure_not_blank("name", &name)?;
        self.name = name;
        Ok(())
    }

    pub fn change_price(&mut self, price: u64) {
        self.price = price;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Serialize, Deserialize)]
struct ProductParts {
    id: ProductId,
    name: String,
    price: u64,
}

impl TryFrom<ProductParts> for Product {
    type Error = DomainError;

    fn try_from(parts: ProductParts) -> Result<Self, Self::Error> {
        Self::restore(parts.id, parts.name, parts.price)
    }
}

impl From<Product> for ProductParts {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
        }
    }
}
