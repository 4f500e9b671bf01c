//! Commission payment repository implementation
//!
//! Settling and reversing run in one transaction each. Referenced orders are
//! locked with `SELECT ... FOR UPDATE` before they are checked, so a batch
//! either flags every order and stores itself, or leaves nothing behind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{CommissionPaymentId, OrderId, SellerId};
use domain_commission::CommissionPayment;

use crate::error::DatabaseError;
use crate::repositories::orders::OrderRepository;

/// Database row for a commission payment batch
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommissionPaymentRow {
    pub payment_id: Uuid,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub amount: Decimal,
    pub period: String,
    pub payment_date: DateTime<Utc>,
    pub order_ids: Vec<Uuid>,
    pub paid_by: Option<String>,
}

impl From<CommissionPaymentRow> for CommissionPayment {
    fn from(row: CommissionPaymentRow) -> Self {
        CommissionPayment {
            id: CommissionPaymentId::from(row.payment_id),
            seller_id: SellerId::from(row.seller_id),
            seller_name: row.seller_name,
            amount: row.amount,
            period: row.period,
            payment_date: row.payment_date,
            order_ids: row.order_ids.into_iter().map(OrderId::from).collect(),
            paid_by: row.paid_by,
        }
    }
}

/// Repository for commission payment batches
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores the batch and flags its orders as paid in one transaction
    ///
    /// # Errors
    ///
    /// - `NotFound` if a referenced order does not exist
    /// - `Conflict` if an order fails the settlement checks
    pub async fn settle(&self, payment: &CommissionPayment) -> Result<(), DatabaseError> {
        let order_ids: Vec<Uuid> = payment.order_ids.iter().copied().map(Uuid::from).collect();
        let mut tx = self.pool.begin().await?;

        let orders = OrderRepository::lock_many(&mut *tx, &order_ids).await?;
        if let Some(missing) = payment
            .order_ids
            .iter()
            .find(|id| !orders.iter().any(|o| o.id == **id))
        {
            return Err(DatabaseError::not_found("Order", missing));
        }

        for order in &orders {
            payment
                .check_order(order)
                .map_err(|e| DatabaseError::Conflict(e.to_string()))?;
            OrderRepository::set_commission_flags(&mut *tx, Uuid::from(order.id), true, Some(payment.payment_date))
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO commission_payments (
                payment_id, seller_id, seller_name, amount, period, payment_date, order_ids, paid_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.seller_id))
        .bind(&payment.seller_name)
        .bind(payment.amount)
        .bind(&payment.period)
        .bind(payment.payment_date)
        .bind(&order_ids)
        .bind(&payment.paid_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, payment_id: Uuid) -> Result<CommissionPayment, DatabaseError> {
        sqlx::query_as::<_, CommissionPaymentRow>(
            r#"
            SELECT payment_id, seller_id, seller_name, amount, period, payment_date, order_ids, paid_by
            FROM commission_payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?
        .map(CommissionPayment::from)
        .ok_or_else(|| DatabaseError::not_found("CommissionPayment", CommissionPaymentId::from(payment_id)))
    }

    /// Clears the paid flags on the batch's orders and deletes it in one
    /// transaction; orders deleted since settlement are skipped
    pub async fn reverse(&self, payment_id: Uuid) -> Result<CommissionPayment, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CommissionPaymentRow>(
            r#"
            DELETE FROM commission_payments
            WHERE payment_id = $1
            RETURNING payment_id, seller_id, seller_name, amount, period, payment_date, order_ids, paid_by
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("CommissionPayment", CommissionPaymentId::from(payment_id)))?;

        let orders = OrderRepository::lock_many(&mut *tx, &row.order_ids).await?;
        for order in &orders {
            OrderRepository::set_commission_flags(&mut *tx, Uuid::from(order.id), false, None).await?;
        }

        tx.commit().await?;
        Ok(CommissionPayment::from(row))
    }

    /// A seller's batches, most recent first
    pub async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<CommissionPayment>, DatabaseError> {
        let rows = sqlx::query_as::<_, CommissionPaymentRow>(
            r#"
            SELECT payment_id, seller_id, seller_name, amount, period, payment_date, order_ids, paid_by
            FROM commission_payments
            WHERE seller_id = $1
            ORDER BY payment_date DESC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommissionPayment::from).collect())
    }
}
