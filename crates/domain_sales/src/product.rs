//! Product catalog entries relevant to financing and commission

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::ProductId;

use crate::order::OrderItem;

/// How a product's commission value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    /// `value` per unit sold
    Fixed,
    /// `value` percent of the line total
    Percentage,
}

/// Explicit commission rule set on a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRule {
    pub commission_type: CommissionType,
    pub commission_value: Decimal,
}

impl CommissionRule {
    pub fn fixed(value: Decimal) -> Self {
        Self {
            commission_type: CommissionType::Fixed,
            commission_value: value,
        }
    }

    pub fn percentage(value: Decimal) -> Self {
        Self {
            commission_type: CommissionType::Percentage,
            commission_value: value,
        }
    }
}

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Largest installment count this product may be financed over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_installments: Option<u32>,
    /// Absent means the store default rate applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<CommissionRule>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            max_installments: None,
            commission: None,
        }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    pub fn with_max_installments(mut self, max: u32) -> Self {
        self.max_installments = Some(max);
        self
    }

    pub fn with_commission(mut self, rule: CommissionRule) -> Self {
        self.commission = Some(rule);
        self
    }
}

/// Products referenced by an order, indexed by id
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<ProductId, Product>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Installment cap for a set of line items
    ///
    /// The minimum of each item's product limit and the store-wide limit.
    /// Items whose product is unknown or has no limit do not constrain it.
    pub fn installment_cap(&self, items: &[OrderItem], store_max: u32) -> u32 {
        items
            .iter()
            .filter_map(|item| self.get(&item.product_id))
            .filter_map(|product| product.max_installments)
            .fold(store_max, u32::min)
    }
}
