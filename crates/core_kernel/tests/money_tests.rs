//! Unit tests for cent conversion and the installment splitter

use core_kernel::{MoneyError, Rate, split_cents};
use core_kernel::money::{to_cents, from_cents};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod conversion {
    use super::*;

    #[test]
    fn test_to_cents_rounds_sub_cent_precision() {
        assert_eq!(to_cents(dec!(33.335)).unwrap(), 3334);
        assert_eq!(to_cents(dec!(-33.335)).unwrap(), -3334);
        assert_eq!(to_cents(dec!(19.99)).unwrap(), 1999);
    }

    #[test]
    fn test_from_cents_keeps_two_places() {
        assert_eq!(from_cents(10050), dec!(100.50));
        assert_eq!(from_cents(10050).scale(), 2);
    }

    #[test]
    fn test_cents_roundtrip() {
        assert_eq!(from_cents(to_cents(dec!(123.45)).unwrap()), dec!(123.45));
    }

    #[test]
    fn test_amount_beyond_i64_cents_is_rejected() {
        assert_eq!(to_cents(Decimal::MAX), Err(MoneyError::Overflow));
        assert_eq!(to_cents(Decimal::from(i64::MAX / 10)), Err(MoneyError::Overflow));
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_percentage_rate() {
        assert_eq!(Rate::from_percentage(dec!(3)).apply(dec!(2400.00)).unwrap(), dec!(72.00));
    }

    #[test]
    fn test_rate_overflow_is_an_error() {
        assert!(Rate::from_percentage(dec!(200)).apply(Decimal::MAX).is_err());
    }
}

mod splitting {
    use super::*;

    #[test]
    fn test_hundred_over_three() {
        let parts = split_cents(dec!(100.00), 3).unwrap();

        let amounts: Vec<Decimal> = parts.iter().map(|c| from_cents(*c)).collect();
        assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
        assert_eq!(parts.iter().sum::<i64>(), 10000);
    }

    #[test]
    fn test_exact_division_has_no_remainder() {
        assert_eq!(split_cents(dec!(1000.00), 10).unwrap(), vec![10000; 10]);
    }

    #[test]
    fn test_total_with_sub_cent_precision_is_rounded_first() {
        // 10.005 rounds to 1001 cents before splitting
        let parts = split_cents(dec!(10.005), 2).unwrap();
        assert_eq!(parts, vec![501, 500]);
    }

    #[test]
    fn test_single_installment_gets_everything() {
        assert_eq!(split_cents(dec!(57.31), 1).unwrap(), vec![5731]);
    }

    #[test]
    fn test_more_installments_than_cents() {
        let parts = split_cents(dec!(0.03), 5).unwrap();
        assert_eq!(parts, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_huge_total_fails_without_panicking() {
        assert_eq!(split_cents(Decimal::MAX, 1), Err(MoneyError::Overflow));
        assert_eq!(split_cents(Decimal::MAX, 12), Err(MoneyError::Overflow));
    }
}
