//! HTTP tests against the router backed by the in-memory store

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{SellerId, StaffId};
use domain_commission::{CommissionPayment, CommissionStatement};
use domain_sales::{CatalogPort, InstallmentStatus, Order, OrderStatus, PaymentReceipt};
use infra_db::{InMemoryStore, WriteOp};
use interface_api::{create_router, AppState};
use test_utils::fixtures::{default_settings, settings_with_cap, ProductFixtures};

struct Api {
    server: TestServer,
    store: Arc<InMemoryStore>,
    staff: HeaderValue,
}

const STAFF: HeaderName = HeaderName::from_static("x-staff-id");

async fn api_with(settings: core_kernel::StoreSettings) -> Api {
    let store = Arc::new(InMemoryStore::default());
    for product in [ProductFixtures::tv(), ProductFixtures::washer(), ProductFixtures::mattress()] {
        store.upsert_product(&product).await.unwrap();
    }
    let server = TestServer::new(create_router(AppState::in_memory(store.clone(), settings))).unwrap();
    Api {
        server,
        store,
        staff: HeaderValue::from_str(&StaffId::new().to_string()).unwrap(),
    }
}

async fn api() -> Api {
    api_with(default_settings()).await
}

fn crediario_tv(installments: u32, seller: Option<SellerId>) -> Value {
    json!({
        "sellerId": seller,
        "sellerName": seller.map(|_| "Joana"),
        "items": [{
            "productId": ProductFixtures::tv().id,
            "name": "Smart TV 50\"",
            "price": "1000.00",
            "quantity": 1
        }],
        "paymentMethod": "crediario",
        "installments": installments,
        "firstDueDate": "2024-01-10"
    })
}

impl Api {
    async fn post(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(STAFF, self.staff.clone())
            .json(body)
            .await
    }

    async fn put(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .put(path)
            .add_header(STAFF, self.staff.clone())
            .json(body)
            .await
    }

    async fn delete(&self, path: &str) -> TestResponse {
        self.server.delete(path).add_header(STAFF, self.staff.clone()).await
    }

    async fn create(&self, body: &Value) -> Order {
        let response = self.post("/api/v1/orders", body).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Order>()
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_liveness_and_readiness() {
        let api = api().await;
        api.server.get("/health").await.assert_status_ok();

        let ready = api.server.get("/health/ready").await;
        ready.assert_status_ok();
        assert_eq!(ready.json::<Value>()["status"], "ready");
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_create_crediario_order_builds_schedule() {
        let api = api().await;
        let order = api.create(&crediario_tv(10, None)).await;

        assert_eq!(order.total, dec!(1000.00));
        assert_eq!(order.installment_details.len(), 10);
        assert!(order.installment_details.iter().all(|i| i.amount == dec!(100.00)));
        assert_eq!(order.version, 1);

        let fetched = api.server.get(&format!("/api/v1/orders/{}", order.id)).await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<Order>().id, order.id);
    }

    #[tokio::test]
    async fn test_mutation_without_staff_header_is_rejected() {
        let api = api().await;
        let response = api.server.post("/api/v1/orders").json(&crediario_tv(10, None)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(api.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_order_fails_validation() {
        let api = api().await;
        let mut body = crediario_tv(3, None);
        body["items"] = json!([]);

        let response = api.post("/api/v1/orders", &body).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_amount_and_count_bodies_are_validated() {
        let api = api().await;
        let order = api.create(&crediario_tv(4, None)).await;

        let payment = api
            .post(
                &format!("/api/v1/orders/{}/installments/1/payments", order.id),
                &json!({ "amount": "0", "method": "pix" }),
            )
            .await;
        payment.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(payment.json::<Value>()["error"], "validation_error");

        let count = api
            .put(
                &format!("/api/v1/orders/{}/installment-count", order.id),
                &json!({ "count": 0 }),
            )
            .await;
        count.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(count.json::<Value>()["error"], "validation_error");

        api.put(&format!("/api/v1/orders/{}/discount", order.id), &json!({ "amount": "-1" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let stored = api.server.get(&format!("/api/v1/orders/{}", order.id)).await.json::<Order>();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_rejected_not_crashed() {
        let api = api().await;
        let mut body = crediario_tv(3, None);
        body["items"][0]["price"] = json!(Decimal::MAX.to_string());
        body["items"][0]["quantity"] = json!(2);

        api.post("/api/v1/orders", &body)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.store.order_count().await, 0);

        let order = api.create(&crediario_tv(3, None)).await;
        api.post(
            &format!("/api/v1/orders/{}/installments/1/payments", order.id),
            &json!({ "amount": Decimal::MAX.to_string(), "method": "pix" }),
        )
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let stored = api.server.get(&format!("/api/v1/orders/{}", order.id)).await.json::<Order>();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_installment_cap_is_enforced() {
        let api = api_with(settings_with_cap(12)).await;
        let response = api.post("/api/v1/orders", &crediario_tv(18, None)).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let api = api().await;
        let missing = core_kernel::OrderId::new();
        api.server
            .get(&format!("/api/v1/orders/{}", missing))
            .await
            .assert_status_not_found();
        api.server
            .get("/api/v1/orders/not-an-id")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pay_then_change_count_keeps_paid_installment() {
        let api = api().await;
        let order = api.create(&crediario_tv(10, None)).await;

        let paid = api
            .post(
                &format!("/api/v1/orders/{}/installments/1/payments", order.id),
                &json!({ "amount": "100.00", "method": "pix" }),
            )
            .await;
        paid.assert_status_ok();
        let receipt = paid.json::<PaymentReceipt>();
        assert!(receipt.applied);
        assert_eq!(receipt.installment.status, InstallmentStatus::Paid);
        assert_eq!(receipt.outstanding_balance, dec!(900.00));

        let changed = api
            .put(
                &format!("/api/v1/orders/{}/installment-count", order.id),
                &json!({ "count": 5 }),
            )
            .await;
        changed.assert_status_ok();
        let order = changed.json::<Order>();

        assert_eq!(order.installment_details.len(), 6);
        assert_eq!(order.installment_details[0].status, InstallmentStatus::Paid);
        assert!(order.installment_details[1..].iter().all(|i| i.amount == dec!(180.00)));
        let scheduled: Decimal = order.installment_details.iter().map(|i| i.amount).sum();
        assert_eq!(scheduled, dec!(1000.00));
    }

    #[tokio::test]
    async fn test_reversing_a_payment_reopens_installment() {
        let api = api().await;
        let order = api.create(&crediario_tv(4, None)).await;
        let receipt = api
            .post(
                &format!("/api/v1/orders/{}/installments/2/payments", order.id),
                &json!({ "amount": "100.00", "method": "dinheiro" }),
            )
            .await
            .json::<PaymentReceipt>();
        assert_eq!(receipt.installment.status, InstallmentStatus::Partial);

        let reversed = api
            .delete(&format!(
                "/api/v1/orders/{}/installments/2/payments/{}",
                order.id, receipt.payment_id
            ))
            .await;
        reversed.assert_status_ok();
        let order = reversed.json::<Order>();
        let installment = &order.installment_details[1];
        assert_eq!(installment.status, InstallmentStatus::Pending);
        assert_eq!(installment.paid_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_store_failure_is_a_retryable_conflict() {
        let api = api().await;
        let order = api.create(&crediario_tv(10, None)).await;
        api.store.fail_next(WriteOp::SaveOrder);

        let response = api
            .put(&format!("/api/v1/orders/{}/discount", order.id), &json!({ "amount": "50.00" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["retryable"], true);

        let stored = api.server.get(&format!("/api/v1/orders/{}", order.id)).await.json::<Order>();
        assert_eq!(stored.discount, Decimal::ZERO);
        assert_eq!(stored.version, order.version);
    }

    #[tokio::test]
    async fn test_trash_restore_and_hard_delete() {
        let api = api().await;
        let order = api.create(&crediario_tv(2, None)).await;
        let path = format!("/api/v1/orders/{}", order.id);

        // Only trashed orders can be purged
        api.delete(&path).await.assert_status(StatusCode::CONFLICT);

        let trashed = api.post(&format!("{}/trash", path), &json!({})).await;
        assert_eq!(trashed.json::<Order>().status, OrderStatus::Deleted);
        let restored = api.post(&format!("{}/restore", path), &json!({})).await;
        assert_eq!(restored.json::<Order>().status, OrderStatus::Processing);

        api.post(&format!("{}/trash", path), &json!({})).await.assert_status_ok();
        api.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        api.server.get(&path).await.assert_status_not_found();
    }
}

mod commissions {
    use super::*;

    async fn delivered_order(api: &Api, seller: SellerId) -> Order {
        let order = api.create(&crediario_tv(10, Some(seller))).await;
        let response = api
            .put(
                &format!("/api/v1/orders/{}/status", order.id),
                &json!({ "status": "delivered" }),
            )
            .await;
        response.assert_status_ok();
        response.json::<Order>()
    }

    #[tokio::test]
    async fn test_pay_and_reverse_commissions() {
        let api = api().await;
        let seller = SellerId::new();
        let first = delivered_order(&api, seller).await;
        let second = delivered_order(&api, seller).await;
        assert_eq!(first.commission, dec!(50.00));

        let unpaid = api
            .server
            .get(&format!("/api/v1/sellers/{}/commissions/unpaid", seller))
            .await
            .json::<CommissionStatement>();
        assert_eq!(unpaid.lines.len(), 2);
        assert_eq!(unpaid.total, dec!(100.00));

        let paid = api
            .post(
                "/api/v1/commission-payments",
                &json!({
                    "sellerId": seller,
                    "sellerName": "Joana",
                    "amount": "100.00",
                    "orderIds": [first.id, second.id],
                    "period": "2024-01"
                }),
            )
            .await;
        paid.assert_status(StatusCode::CREATED);
        let payment = paid.json::<CommissionPayment>();

        let order = api
            .server
            .get(&format!("/api/v1/orders/{}", first.id))
            .await
            .json::<Order>();
        assert!(order.commission_paid);

        let statement = api
            .server
            .get(&format!("/api/v1/sellers/{}/commissions/unpaid", seller))
            .await
            .json::<CommissionStatement>();
        assert!(statement.lines.is_empty());

        api.delete(&format!("/api/v1/commission-payments/{}", payment.id))
            .await
            .assert_status_ok();
        let order = api
            .server
            .get(&format!("/api/v1/orders/{}", first.id))
            .await
            .json::<Order>();
        assert!(!order.commission_paid);
        assert_eq!(api.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_paying_twice_is_rejected_without_retry() {
        let api = api().await;
        let seller = SellerId::new();
        let order = delivered_order(&api, seller).await;
        let body = json!({
            "sellerId": seller,
            "sellerName": "Joana",
            "amount": "50.00",
            "orderIds": [order.id],
            "period": "2024-01"
        });

        api.post("/api/v1/commission-payments", &body)
            .await
            .assert_status(StatusCode::CREATED);
        let again = api.post("/api/v1/commission-payments", &body).await;
        again.assert_status(StatusCode::CONFLICT);
        assert!(again.json::<Value>().get("retryable").is_none());
        assert_eq!(api.store.payment_count().await, 1);
    }
}

mod gateway {
    use super::*;

    #[tokio::test]
    async fn test_gateway_event_updates_linked_order() {
        let api = api().await;
        let order = api.create(&crediario_tv(3, None)).await;

        api.post(
            &format!("/api/v1/orders/{}/gateway", order.id),
            &json!({ "externalPaymentId": "mp-1234" }),
        )
        .await
        .assert_status_ok();

        // Webhooks come from the gateway, not from staff
        let event = api
            .server
            .post("/api/v1/gateway/events")
            .json(&json!({
                "externalPaymentId": "mp-1234",
                "status": "approved",
                "metadata": { "fee": "1.99" }
            }))
            .await;
        event.assert_status_ok();
        let gateway = event.json::<Order>().gateway.unwrap();
        assert_eq!(gateway.status.as_deref(), Some("approved"));

        api.server
            .post("/api/v1/gateway/events")
            .json(&json!({ "externalPaymentId": "mp-unknown", "status": "approved" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_trashed_order_cannot_take_a_gateway_payment() {
        let api = api().await;
        let order = api.create(&crediario_tv(3, None)).await;
        api.post(&format!("/api/v1/orders/{}/trash", order.id), &json!({}))
            .await
            .assert_status_ok();

        let response = api
            .post(
                &format!("/api/v1/orders/{}/gateway", order.id),
                &json!({ "externalPaymentId": "mp-trashed" }),
            )
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["retryable"], false);

        let stored = api.server.get(&format!("/api/v1/orders/{}", order.id)).await.json::<Order>();
        assert!(stored.gateway.is_none());
    }
}

mod products {
    use super::*;

    #[tokio::test]
    async fn test_upsert_product_caps_new_orders() {
        let api = api().await;
        let capped = ProductFixtures::tv().with_max_installments(4);
        api.put("/api/v1/products", &serde_json::to_value(&capped).unwrap())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        api.post("/api/v1/orders", &crediario_tv(6, None))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        api.post("/api/v1/orders", &crediario_tv(4, None))
            .await
            .assert_status(StatusCode::CREATED);
    }
}
