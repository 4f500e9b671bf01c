//! Product repository implementation

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::ProductId;
use domain_sales::{CommissionRule, CommissionType, Product};

use crate::error::DatabaseError;

/// Database row for a product
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub max_installments: Option<i32>,
    pub commission_type: Option<String>,
    pub commission_value: Option<Decimal>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DatabaseError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let commission = match (row.commission_type.as_deref(), row.commission_value) {
            (Some("fixed"), Some(value)) => Some(CommissionRule::fixed(value)),
            (Some("percentage"), Some(value)) => Some(CommissionRule::percentage(value)),
            (None, _) | (_, None) => None,
            (Some(other), _) => {
                return Err(DatabaseError::SerializationError(format!(
                    "Unknown commission type '{}'",
                    other
                )))
            }
        };

        Ok(Product {
            id: ProductId::from(row.product_id),
            name: row.name,
            price: row.price,
            max_installments: row.max_installments.and_then(|m| u32::try_from(m).ok()),
            commission,
        })
    }
}

fn commission_type_to_db(kind: CommissionType) -> &'static str {
    match kind {
        CommissionType::Fixed => "fixed",
        CommissionType::Percentage => "percentage",
    }
}

/// Repository for product rows
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the products among `ids`; unknown ids are skipped
    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, name, price, max_installments, commission_type, commission_value
            FROM products
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub async fn upsert(&self, product: &Product) -> Result<(), DatabaseError> {
        let max_installments = product
            .max_installments
            .map(i32::try_from)
            .transpose()
            .map_err(|_| DatabaseError::ConstraintViolation("max_installments out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, price, max_installments, commission_type, commission_value, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (product_id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                max_installments = EXCLUDED.max_installments,
                commission_type = EXCLUDED.commission_type,
                commission_value = EXCLUDED.commission_value,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::from(product.id))
        .bind(&product.name)
        .bind(product.price)
        .bind(max_installments)
        .bind(product.commission.map(|c| commission_type_to_db(c.commission_type)))
        .bind(product.commission.map(|c| c.commission_value))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(commission_type: Option<&str>, commission_value: Option<Decimal>) -> ProductRow {
        ProductRow {
            product_id: Uuid::new_v4(),
            name: "Sofá".to_string(),
            price: Decimal::new(150000, 2),
            max_installments: Some(10),
            commission_type: commission_type.map(str::to_string),
            commission_value,
        }
    }

    #[test]
    fn test_rule_columns_map_to_commission_rule() {
        let product = Product::try_from(row(Some("fixed"), Some(Decimal::new(25, 0)))).unwrap();
        assert_eq!(product.commission, Some(CommissionRule::fixed(Decimal::new(25, 0))));
        assert_eq!(product.max_installments, Some(10));

        let product = Product::try_from(row(None, None)).unwrap();
        assert!(product.commission.is_none());
    }

    #[test]
    fn test_unknown_commission_type_is_rejected() {
        assert!(Product::try_from(row(Some("tiered"), Some(Decimal::ONE))).is_err());
    }
}
