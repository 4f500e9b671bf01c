//! Order repository implementation
//!
//! Orders are stored one row each. Scalar financial fields are columns;
//! line items, the installment schedule with its payment ledgers, and the
//! gateway patch are JSONB documents written together with the row.
//!
//! Every update is guarded by the `version` column: the `UPDATE` only
//! matches when the stored version equals the one the caller read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{CustomerId, OrderId, SellerId};
use domain_sales::{GatewayInfo, Installment, Order, OrderItem, OrderStatus, PaymentMethod};

use crate::error::DatabaseError;

const ORDER_COLUMNS: &str = "order_id, customer_id, seller_id, seller_name, status, payment_method, \
     subtotal, discount, down_payment, total, installments, installment_value, items, \
     installment_details, commission, commission_paid, is_commission_manual, commission_date, \
     gateway, delivered_at, created_at, updated_at, version";

/// Database row for an order
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub seller_name: Option<String>,
    pub status: String,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub down_payment: Decimal,
    pub total: Decimal,
    pub installments: i32,
    pub installment_value: Decimal,
    pub items: Json<Vec<OrderItem>>,
    pub installment_details: Json<Vec<Installment>>,
    pub commission: Decimal,
    pub commission_paid: bool,
    pub is_commission_manual: bool,
    pub commission_date: Option<DateTime<Utc>>,
    pub gateway: Option<Json<GatewayInfo>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = DatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId::from(row.order_id),
            customer_id: row.customer_id.map(CustomerId::from),
            seller_id: row.seller_id.map(SellerId::from),
            seller_name: row.seller_name,
            items: row.items.0,
            subtotal: row.subtotal,
            discount: row.discount,
            down_payment: row.down_payment,
            total: row.total,
            payment_method: PaymentMethod::from(row.payment_method),
            installments: u32::try_from(row.installments).map_err(|_| {
                DatabaseError::SerializationError(format!("Negative installment count {}", row.installments))
            })?,
            installment_value: row.installment_value,
            installment_details: row.installment_details.0,
            status: status_from_db(&row.status)?,
            commission: row.commission,
            commission_paid: row.commission_paid,
            is_commission_manual: row.is_commission_manual,
            commission_date: row.commission_date,
            gateway: row.gateway.map(|g| g.0),
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

pub(crate) fn status_to_db(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Processing => "processing",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Canceled => "canceled",
        OrderStatus::Deleted => "deleted",
    }
}

pub(crate) fn status_from_db(value: &str) -> Result<OrderStatus, DatabaseError> {
    match value {
        "processing" => Ok(OrderStatus::Processing),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "canceled" => Ok(OrderStatus::Canceled),
        "deleted" => Ok(OrderStatus::Deleted),
        other => Err(DatabaseError::SerializationError(format!("Unknown order status '{}'", other))),
    }
}

fn installment_count(order: &Order) -> Result<i32, DatabaseError> {
    i32::try_from(order.installments)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("Too many installments: {}", order.installments)))
}

/// Repository for order rows
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new order row
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the order id already exists
    pub async fn insert(&self, order: &Order) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, customer_id, seller_id, seller_name, status, payment_method,
                subtotal, discount, down_payment, total, installments, installment_value,
                items, installment_details, commission, commission_paid, is_commission_manual,
                commission_date, gateway, gateway_payment_id, delivered_at, created_at,
                updated_at, version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(Uuid::from(order.id))
        .bind(order.customer_id.map(Uuid::from))
        .bind(order.seller_id.map(Uuid::from))
        .bind(&order.seller_name)
        .bind(status_to_db(order.status))
        .bind(order.payment_method.as_str())
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.down_payment)
        .bind(order.total)
        .bind(installment_count(order)?)
        .bind(order.installment_value)
        .bind(Json(&order.items))
        .bind(Json(&order.installment_details))
        .bind(order.commission)
        .bind(order.commission_paid)
        .bind(order.is_commission_manual)
        .bind(order.commission_date)
        .bind(order.gateway.as_ref().map(Json))
        .bind(order.gateway.as_ref().map(|g| g.external_payment_id.clone()))
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieves an order by id
    pub async fn get(&self, order_id: Uuid) -> Result<Order, DatabaseError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Order", OrderId::from(order_id)))?;

        Order::try_from(row)
    }

    /// Writes every mutable field if the stored version is `expected_version`
    ///
    /// # Returns
    ///
    /// The new version
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Conflict` if the stored version differs
    pub async fn update_versioned(&self, order: &Order, expected_version: i64) -> Result<i64, DatabaseError> {
        let order_id = Uuid::from(order.id);
        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders SET
                customer_id = $3,
                seller_id = $4,
                seller_name = $5,
                status = $6,
                payment_method = $7,
                subtotal = $8,
                discount = $9,
                down_payment = $10,
                total = $11,
                installments = $12,
                installment_value = $13,
                items = $14,
                installment_details = $15,
                commission = $16,
                commission_paid = $17,
                is_commission_manual = $18,
                commission_date = $19,
                gateway = $20,
                gateway_payment_id = $21,
                delivered_at = $22,
                updated_at = $23,
                version = version + 1
            WHERE order_id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(order_id)
        .bind(expected_version)
        .bind(order.customer_id.map(Uuid::from))
        .bind(order.seller_id.map(Uuid::from))
        .bind(&order.seller_name)
        .bind(status_to_db(order.status))
        .bind(order.payment_method.as_str())
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.down_payment)
        .bind(order.total)
        .bind(installment_count(order)?)
        .bind(order.installment_value)
        .bind(Json(&order.items))
        .bind(Json(&order.installment_details))
        .bind(order.commission)
        .bind(order.commission_paid)
        .bind(order.is_commission_manual)
        .bind(order.commission_date)
        .bind(order.gateway.as_ref().map(Json))
        .bind(order.gateway.as_ref().map(|g| g.external_payment_id.clone()))
        .bind(order.delivered_at)
        .bind(order.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match new_version {
            Some(version) => Ok(version),
            None => Err(self.version_mismatch(order_id, expected_version).await),
        }
    }

    /// Explains why a versioned write matched no row
    async fn version_mismatch(&self, order_id: Uuid, expected_version: i64) -> DatabaseError {
        let stored: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM orders WHERE order_id = $1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await;
        match stored {
            Err(e) => DatabaseError::from(e),
            Ok(None) => DatabaseError::not_found("Order", OrderId::from(order_id)),
            Ok(Some(version)) => DatabaseError::Conflict(format!(
                "Order {} is at version {}, expected {}",
                order_id, version, expected_version
            )),
        }
    }

    /// Permanently deletes an order row still at `expected_version`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Conflict` if the stored version differs
    pub async fn delete_versioned(&self, order_id: Uuid, expected_version: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1 AND version = $2")
            .bind(order_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.version_mismatch(order_id, expected_version).await);
        }
        Ok(())
    }

    pub async fn find_by_gateway_payment_id(&self, external_payment_id: &str) -> Result<Order, DatabaseError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE gateway_payment_id = $1",
            ORDER_COLUMNS
        ))
        .bind(external_payment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Gateway payment", external_payment_id))?;

        Order::try_from(row)
    }

    pub async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Order>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE seller_id = $1 ORDER BY created_at",
            ORDER_COLUMNS
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Loads and row-locks orders inside an open transaction
    pub async fn lock_many(conn: &mut PgConnection, order_ids: &[Uuid]) -> Result<Vec<Order>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_id = ANY($1) ORDER BY order_id FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Writes the commission settlement flags inside an open transaction
    pub async fn set_commission_flags(
        conn: &mut PgConnection,
        order_id: Uuid,
        paid: bool,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET commission_paid = $2, commission_date = $3, updated_at = NOW(), version = version + 1
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .bind(paid)
        .bind(paid_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
            OrderStatus::Deleted,
        ] {
            assert_eq!(status_from_db(status_to_db(status)).unwrap(), status);
        }
        assert!(status_from_db("archived").is_err());
    }

    #[test]
    fn test_row_maps_to_order() {
        let now = Utc::now();
        let row = OrderRow {
            order_id: Uuid::new_v4(),
            customer_id: None,
            seller_id: Some(Uuid::new_v4()),
            seller_name: Some("Rita".to_string()),
            status: "delivered".to_string(),
            payment_method: "crediario".to_string(),
            subtotal: Decimal::new(10000, 2),
            discount: Decimal::ZERO,
            down_payment: Decimal::ZERO,
            total: Decimal::new(10000, 2),
            installments: 0,
            installment_value: Decimal::ZERO,
            items: Json(vec![]),
            installment_details: Json(vec![]),
            commission: Decimal::new(500, 2),
            commission_paid: false,
            is_commission_manual: false,
            commission_date: None,
            gateway: None,
            delivered_at: Some(now),
            created_at: now,
            updated_at: now,
            version: 4,
        };

        let order = Order::try_from(row).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.payment_method, PaymentMethod::Crediario);
        assert_eq!(order.version, 4);
    }
}
