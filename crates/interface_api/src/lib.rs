//! HTTP API Layer
//!
//! REST surface of the crediário core, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: One module per resource, each action a single endpoint
//! - **Middleware**: Staff actor extraction and audit logging
//! - **DTOs**: Request bodies with `validator` rules
//! - **Error Handling**: Domain errors mapped to status codes, with a
//!   `retryable` flag on concurrency failures
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use interface_api::{create_router, AppState};
//! use infra_db::InMemoryStore;
//!
//! let state = AppState::in_memory(Arc::new(InMemoryStore::default()), settings);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{HealthCheckable, StoreSettings};
use domain_commission::{CommissionPort, CommissionService};
use domain_sales::{CatalogPort, OrderPort, OrderService};
use infra_db::{InMemoryStore, PostgresCatalogAdapter, PostgresCommissionAdapter, PostgresOrderAdapter};

use crate::handlers::{commissions, gateway, health, orders, products};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub commissions: Arc<CommissionService>,
    pub catalog: Arc<dyn CatalogPort>,
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderPort>,
        catalog: Arc<dyn CatalogPort>,
        commissions: Arc<dyn CommissionPort>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(orders.clone(), catalog.clone(), settings)),
            commissions: Arc::new(CommissionService::new(orders, commissions)),
            catalog,
            health_checks: Vec::new(),
        }
    }

    /// State backed by a single in-memory store
    pub fn in_memory(store: Arc<InMemoryStore>, settings: StoreSettings) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), settings).with_health_check(store)
    }

    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, query_timeout: Duration, settings: StoreSettings) -> Self {
        let orders = Arc::new(PostgresOrderAdapter::new(pool.clone(), query_timeout));
        let catalog = Arc::new(PostgresCatalogAdapter::new(pool.clone(), query_timeout));
        let commissions = Arc::new(PostgresCommissionAdapter::new(pool, query_timeout));
        Self::new(orders.clone(), catalog, commissions, settings).with_health_check(orders)
    }

    /// Adds an adapter checked by `/health/ready`
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheckable>) -> Self {
        self.health_checks.push(check);
        self
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Services and adapters shared by the handlers
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let order_routes = Router::new()
        .route("/", post(orders::create_order))
        .route("/:id", get(orders::get_order).delete(orders::hard_delete))
        .route("/:id/installments/:number/payments", post(orders::record_payment))
        .route(
            "/:id/installments/:number/payments/:payment_id",
            delete(orders::reverse_payment),
        )
        .route("/:id/installments/:number/amount", put(orders::set_installment_amount))
        .route("/:id/installments/:number/due-date", put(orders::set_installment_due_date))
        .route("/:id/discount", put(orders::change_discount))
        .route(
            "/:id/down-payment",
            put(orders::register_down_payment).delete(orders::reset_down_payment),
        )
        .route("/:id/installment-count", put(orders::change_installment_count))
        .route("/:id/schedule/regenerate", post(orders::regenerate_schedule))
        .route("/:id/payment-method", put(orders::update_payment_method))
        .route("/:id/status", put(orders::update_status))
        .route("/:id/trash", post(orders::trash))
        .route("/:id/restore", post(orders::restore))
        .route("/:id/commission/recalculate", post(orders::recalculate_commission))
        .route(
            "/:id/commission",
            put(orders::set_manual_commission).delete(orders::clear_manual_commission),
        )
        .route("/:id/gateway", post(gateway::attach_payment));

    let commission_routes = Router::new()
        .route("/", post(commissions::pay_commissions))
        .route("/:id", get(commissions::get_payment).delete(commissions::reverse_payment));

    let seller_routes = Router::new()
        .route("/:seller_id/commissions/unpaid", get(commissions::unpaid_commissions))
        .route("/:seller_id/commission-payments", get(commissions::list_payments));

    let api_routes = Router::new()
        .nest("/orders", order_routes)
        .nest("/commission-payments", commission_routes)
        .nest("/sellers", seller_routes)
        .route("/products", put(products::upsert_product))
        .route("/gateway/events", post(gateway::status_event))
        .layer(axum_middleware::from_fn(audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
