use serde::{Deserialize, Serialize};

use checkout_core::{CustomerId, DomainError, DomainResult, Entity, ensure_not_blank};

use crate::address::Address;

/// Entity: Customer.
///
/// A customer starts inactive and without an address. Activation requires an
/// address to be set first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CustomerParts", into = "CustomerParts")]
pub struct Customer {
    id: CustomerId,
    name: String,
    address: Option<Address>,
    active: bool,
    reward_points: u64,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        ensure_not_blank("name", &name)?;

        Ok(Self {
            id: CustomerId::parse(id)?,
            name,
            address: None,
            active: false,
            reward_points: 0,
        })
    }

    /// Rebuild a customer from already-persisted state.
    ///
    /// Enforces the same rules as the public mutators: a non-blank name and an
    /// address on every active customer.
    pub fn restore(
        id: CustomerId,
        name: String,
        address: Option<Address>,
        active: bool,
        reward_points: u64,
    ) -> DomainResult<Self> {
        ensure_not_blank("name", &name)?;
        if active && address.is_none() {
            return Err(DomainError::invariant("active customer without address"));
        }

        Ok(Self {
            id,
            name,
            address,
            active,
            reward_points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reward_points(&self) -> u64 {
        self.reward_points
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        ensure_not_blank("name", &name)?;
        self.name = name;
        Ok(())
    }

    pub fn change_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.address.is_none() {
            return Err(DomainError::invariant(
                "address is mandatory to activate a customer",
            ));
        }
        self.active = true;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn add_reward_points(&mut self, points: u64) {
        self.reward_points = self.reward_points.saturating_add(points);
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Unvalidated serde shape; deserialization goes through `Customer::restore`.
#[derive(Serialize, Deserialize)]
struct CustomerParts {
    id: CustomerId,
    name: String,
    address: Option<Address>,
    active: bool,
    reward_points: u64,
}

impl TryFrom<CustomerParts> for Customer {
    type Error = DomainError;

    fn try_from(parts: CustomerParts) -> Result<Self, Self::Error> {
        Self::restore(
            parts.id,
            parts.name,
            parts.address,
            parts.active,
            parts.reward_points,
        )
    }
}

impl From<Customer> for CustomerParts {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            address: customer.address,
            active: customer.active,
            reward_points: customer.reward_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address() -> Address {
        Address::new("Street 1", 250, "Zipcode 1-250", "City 1").unwrap()
    }

    #[test]
    fn new_customer_is_inactive_without_address() {
        let customer = Customer::new("10", "Customer 10").unwrap();
        assert_eq!(customer.id().as_str(), "10");
        assert_eq!(customer.name(), "Customer 10");
        assert!(customer.address().is_none());
        assert!(!customer.is_active());
        assert_eq!(customer.reward_points(), 0);
    }

    #[test]
    fn empty_id_or_name_is_rejected() {
        assert!(Customer::new("", "John").unwrap_err().is_validation());
        assert!(Customer::new("1", "").unwrap_err().is_validation());
    }

    #[test]
    fn change_name_rejects_blank_names() {
        let mut customer = Customer::new("1", "John").unwrap();
        customer.change_name("Jane").unwrap();
        assert_eq!(customer.name(), "Jane");

        let err = customer.change_name(" ").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(customer.name(), "Jane");
    }

    #[test]
    fn cannot_activate_without_address() {
        let mut customer = Customer::new("1", "John").unwrap();
        let err = customer.activate().unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("address is mandatory") => {}
            _ => panic!("Expected InvariantViolation for activation without address"),
        }
        assert!(!customer.is_active());
    }

    #[test]
    fn activate_and_deactivate_with_address() {
        let mut customer = Customer::new("1", "John").unwrap();
        customer.change_address(test_address());

        customer.activate().unwrap();
        assert!(customer.is_active());

        customer.deactivate();
        assert!(!customer.is_active());
    }

    #[test]
    fn reward_points_accumulate() {
        let mut customer = Customer::new("1", "John").unwrap();
        customer.add_reward_points(10);
        customer.add_reward_points(5);
        assert_eq!(customer.reward_points(), 15);
    }

    #[test]
    fn restore_rejects_active_customer_without_address() {
        let id = CustomerId::parse("1").unwrap();
        let err = Customer::restore(id, "John".to_string(), None, true, 0).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn serde_round_trips_an_active_customer() {
        let mut customer = Customer::new("1", "John").unwrap();
        customer.change_address(test_address());
        customer.activate().unwrap();
        customer.add_reward_points(7);

        let json = serde_json::to_value(&customer).unwrap();
        let back: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(back, customer);
    }

    #[test]
    fn deserialization_applies_customer_rules() {
        let active_without_address = serde_json::json!({
            "id": "1", "name": "John", "address": null, "active": true, "reward_points": 0
        });
        match serde_json::from_value::<Customer>(active_without_address) {
            Err(err) => assert!(err.to_string().contains("active customer without address")),
            Ok(_) => panic!("Expected active customer without address to be rejected"),
        }

        let blank_name = serde_json::json!({
            "id": "1", "name": "", "address": null, "active": false, "reward_points": 0
        });
        assert!(serde_json::from_value::<Customer>(blank_name).is_err());
    }
}
