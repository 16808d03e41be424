use serde::{Deserialize, Serialize};

use checkout_core::{DomainError, DomainResult, ValueObject, ensure_not_blank};

/// Postal address of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressParts", into = "AddressParts")]
pub struct Address {
    street: String,
    number: u32,
    zip: String,
    city: String,
}

impl ValueObject for Address {}

impl Address {
    pub fn new(
        street: impl Into<String>,
        number: u32,
        zip: impl Into<String>,
        city: impl Into<String>,
    ) -> DomainResult<Self> {
        let address = Self {
            street: street.into(),
            number,
            zip: zip.into(),
            city: city.into(),
        };
        address.validate()?;
        Ok(address)
    }

    fn validate(&self) -> DomainResult<()> {
        ensure_not_blank("street", &self.street)?;
        if self.number == 0 {
            return Err(DomainError::validation("number is required"));
        }
        ensure_not_blank("zip", &self.zip)?;
        ensure_not_blank("city", &self.city)?;
        Ok(())
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}, {} {}", self.street, self.number, self.zip, self.city)
    }
}

#[derive(Serialize, Deserialize)]
struct AddressParts {
    street: String,
    number: u32,
    zip: String,
    city: String,
}

impl TryFrom<AddressParts> for Address {
    type Error = DomainError;

    fn try_from(parts: AddressParts) -> Result<Self, Self::Error> {
        Self::new(parts.street, parts.number, parts.zip, parts.city)
    }
}

impl From<Address> for AddressParts {
    fn from(address: Address) -> Self {
        Self {
            street: address.street,
            number: address.number,
            zip: address.zip,
            city: address.city,
        }
    }
}
