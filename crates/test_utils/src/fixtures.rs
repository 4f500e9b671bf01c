//! Pre-built Test Fixtures
//!
//! Consistent, predictable data for unit and integration tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Actor, ProductId, RequestContext, SellerId, StaffId, StoreSettings};
use domain_sales::{CommissionRule, Product, ProductCatalog};

/// Products commonly sold in a furniture/appliance store
///
/// Ids are fixed, so an order built from a fixture resolves against a
/// catalog or store seeded with the same fixture.
pub struct ProductFixtures;

impl ProductFixtures {
    /// R$ 1.000,00 with no cap and the default commission
    pub fn tv() -> Product {
        Product::new("Smart TV 50\"", dec!(1000.00)).with_id(ProductId::from_uuid(Uuid::from_u128(0x7001)))
    }

    /// Financeable over at most 6 installments, 3% commission
    pub fn washer() -> Product {
        Product::new("Lavadora 12kg", dec!(2400.00))
            .with_id(ProductId::from_uuid(Uuid::from_u128(0x7002)))
            .with_max_installments(6)
            .with_commission(CommissionRule::percentage(dec!(3)))
    }

    /// Fixed R$ 15,00 commission per unit
    pub fn mattress() -> Product {
        Product::new("Colchão Casal", dec!(899.90))
            .with_id(ProductId::from_uuid(Uuid::from_u128(0x7003)))
            .with_commission(CommissionRule::fixed(dec!(15)))
    }

    pub fn catalog() -> ProductCatalog {
        ProductCatalog::new(vec![Self::tv(), Self::washer(), Self::mattress()])
    }
}

/// Fixture for temporal test data
pub struct DateFixtures;

impl DateFixtures {
    /// First due date used by most scenarios (10 Jan 2024)
    pub fn first_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    /// A month-end due date, to exercise clamping
    pub fn month_end_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    /// Sale timestamp (5 Dec 2023, 14:30 UTC)
    pub fn sale_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 5, 14, 30, 0).unwrap()
    }

    /// A day on which the first two installments are overdue
    pub fn collections_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    }
}

/// Fixture for the people acting on orders
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn cashier() -> RequestContext {
        RequestContext::new(Actor::staff(StaffId::new(), "Caixa 1"))
    }

    pub fn manager() -> RequestContext {
        RequestContext::new(Actor::staff(StaffId::new(), "Gerente"))
    }

    pub fn seller() -> (SellerId, String) {
        (SellerId::new(), "Joana Vendedora".to_string())
    }
}

/// Store settings with the default 24-installment cap
pub fn default_settings() -> StoreSettings {
    StoreSettings::default()
}

/// Store settings with a lower global cap
pub fn settings_with_cap(max_installments: u32) -> StoreSettings {
    StoreSettings {
        max_installments,
        ..StoreSettings::default()
    }
}
