//! Comprehensive tests for domain_sales

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{SellerId, StoreSettings};

use domain_sales::installment::{InstallmentPayment, InstallmentStatus};
use domain_sales::order::{NewOrder, Order, OrderItem, PaymentMethod};
use domain_sales::product::{Product, ProductCatalog};
use domain_sales::schedule::build_schedule;
use domain_sales::SalesError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn crediario_order(total: Decimal, down_payment: Decimal, count: u32) -> (Order, ProductCatalog) {
    let product = Product::new("Máquina de lavar", total);
    let catalog = ProductCatalog::new(vec![product.clone()]);
    let order = Order::create(
        NewOrder {
            customer_id: None,
            seller_id: Some(SellerId::new()),
            seller_name: Some("Marcos".to_string()),
            items: vec![OrderItem::from_product(&product, 1)],
            discount: Decimal::ZERO,
            down_payment,
            payment_method: PaymentMethod::Crediario,
            installments: count,
            first_due_date: Some(date(2024, 3, 15)),
        },
        &catalog,
        &StoreSettings::default(),
        Utc::now(),
    )
    .unwrap();
    (order, catalog)
}

// ============================================================================
// Payment Ledger
// ============================================================================

mod ledger_tests {
    use super::*;

    #[test]
    fn test_two_halves_make_a_paid_installment() {
        let (mut order, _) = crediario_order(dec!(1000.00), Decimal::ZERO, 10);
        let first_half = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let second_half = Utc.with_ymd_and_hms(2024, 3, 14, 17, 30, 0).unwrap();

        order
            .record_payment(1, InstallmentPayment::new(dec!(50), first_half, PaymentMethod::Cash))
            .unwrap();
        let inst = order.installment(1).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Partial);
        assert_eq!(inst.paid_amount, dec!(50));

        order
            .record_payment(1, InstallmentPayment::new(dec!(50), second_half, PaymentMethod::Pix))
            .unwrap();
        let inst = order.installment(1).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Paid);
        assert_eq!(inst.paid_amount, dec!(100));
        assert_eq!(inst.payment_date, Some(second_half));
    }

    #[test]
    fn test_payment_on_missing_installment() {
        let (mut order, _) = crediario_order(dec!(300.00), Decimal::ZERO, 3);
        let result = order.record_payment(
            4,
            InstallmentPayment::new(dec!(10), Utc::now(), PaymentMethod::Cash),
        );
        assert!(matches!(result, Err(SalesError::NotFound(_))));
    }

    #[test]
    fn test_overpayment_is_accepted() {
        let (mut order, _) = crediario_order(dec!(300.00), Decimal::ZERO, 3);
        order
            .record_payment(2, InstallmentPayment::new(dec!(150), Utc::now(), PaymentMethod::Cash))
            .unwrap();

        let inst = order.installment(2).unwrap();
        assert_eq!(inst.paid_amount, dec!(150));
        assert_eq!(inst.status, InstallmentStatus::Paid);
        assert_eq!(inst.remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_reversal_restores_exact_state() {
        let (mut order, _) = crediario_order(dec!(300.00), Decimal::ZERO, 3);
        let before = order.clone();

        let payment = InstallmentPayment::new(dec!(100), Utc::now(), PaymentMethod::Pix);
        let id = payment.id;
        order.record_payment(3, payment).unwrap();
        order.reverse_payment(3, id).unwrap();

        assert_eq!(order, before);
    }
}

// ============================================================================
// Schedule and Mutator
// ============================================================================

mod mutator_tests {
    use super::*;

    #[test]
    fn test_end_to_end_count_change() {
        let (mut order, catalog) = crediario_order(dec!(1000.00), Decimal::ZERO, 10);
        for (k, inst) in order.installment_details.iter().enumerate() {
            assert_eq!(inst.amount, dec!(100.00));
            assert_eq!(inst.due_date.day(), 15);
            assert_eq!(inst.installment_number, k as u32 + 1);
        }

        order
            .record_payment(1, InstallmentPayment::new(dec!(100.00), Utc::now(), PaymentMethod::Pix))
            .unwrap();
        assert!(order.installment(1).unwrap().is_paid());
        let paid = order.installment(1).unwrap().clone();

        order
            .change_installment_count(5, &catalog, &StoreSettings::default(), date(2024, 3, 20))
            .unwrap();

        assert_eq!(order.installment_details.len(), 6);
        assert_eq!(order.installment(1).unwrap(), &paid);
        for number in 2..=6 {
            assert_eq!(order.installment(number).unwrap().amount, dec!(180.00));
        }
        assert_eq!(order.scheduled_total(), order.financed_total());
    }

    #[test]
    fn test_count_change_with_down_payment() {
        let (mut order, catalog) = crediario_order(dec!(1000.00), dec!(100.00), 3);
        assert_eq!(order.scheduled_total(), dec!(900.00));

        order
            .change_installment_count(7, &catalog, &StoreSettings::default(), date(2024, 3, 1))
            .unwrap();

        let amounts: Vec<Decimal> = order.installment_details.iter().map(|i| i.amount).collect();
        assert_eq!(amounts[0], dec!(128.58));
        assert_eq!(amounts[6], dec!(128.57));
        assert_eq!(order.scheduled_total(), dec!(900.00));
        assert_eq!(order.installment_details[6].due_date, date(2024, 9, 15));
    }

    #[test]
    fn test_store_cap_applies_without_product_limit() {
        let (mut order, catalog) = crediario_order(dec!(1000.00), Decimal::ZERO, 3);
        let settings = StoreSettings {
            max_installments: 12,
            ..StoreSettings::default()
        };

        assert!(matches!(
            order.change_installment_count(18, &catalog, &settings, date(2024, 3, 1)),
            Err(SalesError::InstallmentLimitExceeded { requested: 18, max: 12 })
        ));
    }

    #[test]
    fn test_schedule_on_the_31st() {
        let schedule = build_schedule(dec!(400.00), 4, date(2023, 10, 31)).unwrap();
        let dues: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dues,
            vec![date(2023, 10, 31), date(2023, 11, 30), date(2023, 12, 31), date(2024, 1, 31)]
        );
    }
}

// ============================================================================
// Sum invariant properties
// ============================================================================

fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000i64).prop_map(|c| Decimal::new(c, 2))
}

proptest! {
    #[test]
    fn prop_schedule_sums_to_financed_total(total in cents(), count in 1u32..=24) {
        let schedule = build_schedule(total, count, date(2024, 1, 31)).unwrap();
        let sum: Decimal = schedule.iter().map(|i| i.amount).sum();

        prop_assert_eq!(schedule.len(), count as usize);
        prop_assert_eq!(sum, total);
        for pair in schedule.windows(2) {
            prop_assert!(pair[0].amount >= pair[1].amount);
            prop_assert!(pair[0].amount - pair[1].amount <= dec!(0.01));
            prop_assert!(pair[0].due_date < pair[1].due_date);
        }
    }

    #[test]
    fn prop_count_change_preserves_sum_and_payments(
        total_cents in 10_000i64..1_000_000i64,
        initial in 2u32..=12,
        paid in 0usize..2,
        new_count in 1u32..=12,
    ) {
        let total = Decimal::new(total_cents, 2);
        let (mut order, catalog) = crediario_order(total, Decimal::ZERO, initial);
        for number in 1..=paid as u32 {
            let amount = order.installment(number).unwrap().amount;
            order
                .record_payment(number, InstallmentPayment::new(amount, Utc::now(), PaymentMethod::Cash))
                .unwrap();
        }
        let paid_before: Decimal = order.installment_details.iter().map(|i| i.paid_amount).sum();

        order
            .change_installment_count(new_count, &catalog, &StoreSettings::default(), date(2024, 3, 1))
            .unwrap();

        let paid_after: Decimal = order.installment_details.iter().map(|i| i.paid_amount).sum();
        prop_assert_eq!(order.scheduled_total(), order.financed_total());
        prop_assert_eq!(paid_after, paid_before);
        prop_assert_eq!(order.installments as usize, paid + new_count as usize);
        let numbers: Vec<u32> = order.installment_details.iter().map(|i| i.installment_number).collect();
        let expected: Vec<u32> = (1..=order.installments).collect();
        prop_assert_eq!(numbers, expected);
    }
}
