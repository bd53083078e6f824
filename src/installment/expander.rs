//! Splits a purchase into monthly installments.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{calendar::add_months, money::round_to_cents};

/// One dated payment of an installment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Installment {
    /// The position in the plan, from 1 to the installment count.
    pub number: u32,
    /// The first date plus `number - 1` calendar months.
    pub date: Date,
    /// The amount due.
    pub amount: Decimal,
}

/// Split `total` into `count` monthly installments starting on `first_date`.
///
/// Every installment but the last gets `total / count` rounded half-up to
/// cents. The last one gets whatever is left, so the amounts always add up to
/// `total` exactly. Days past the end of a shorter month are clamped to its
/// last day.
///
/// The inputs are expected to have been validated by
/// [NewInstallmentPlan::validate](crate::installment::NewInstallmentPlan::validate):
/// at least two installments and a positive total in cents. Returns `None` if
/// an installment would fall after the last date [Date] can represent, and an
/// empty list for a count of zero.
pub fn expand(total: Decimal, count: u32, first_date: Date) -> Option<Vec<Installment>> {
    if count == 0 {
        return Some(Vec::new());
    }

    let base_amount = round_to_cents(total / Decimal::from(count));
    let last_amount = total - base_amount * Decimal::from(count - 1);

    (1..=count)
        .map(|number| {
            Some(Installment {
                number,
                date: add_months(first_date, number - 1)?,
                amount: if number == count {
                    last_amount
                } else {
                    base_amount
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod expand_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use super::expand;

    #[test]
    fn splits_remainder_into_last_installment() {
        let installments = expand(dec!(100.00), 3, date!(2024 - 01 - 15)).unwrap();

        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        let dates: Vec<_> = installments.iter().map(|i| i.date).collect();
        assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 15),
                date!(2024 - 02 - 15),
                date!(2024 - 03 - 15)
            ]
        );
    }

    #[test]
    fn clamps_to_end_of_shorter_month() {
        let installments = expand(dec!(10.00), 2, date!(2024 - 01 - 31)).unwrap();

        let dates: Vec<_> = installments.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![date!(2024 - 01 - 31), date!(2024 - 02 - 29)]);
        assert_eq!(installments[0].amount, dec!(5.00));
        assert_eq!(installments[1].amount, dec!(5.00));
    }

    #[test]
    fn rounds_base_amount_half_up() {
        // 0.025 rounds up to 0.03
        let installments = expand(dec!(0.05), 2, date!(2024 - 01 - 01)).unwrap();

        assert_eq!(installments[0].amount, dec!(0.03));
        assert_eq!(installments[1].amount, dec!(0.02));
    }

    #[test]
    fn last_installment_can_be_smaller() {
        let installments = expand(dec!(200.00), 3, date!(2024 - 01 - 01)).unwrap();

        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(66.67), dec!(66.67), dec!(66.66)]);
    }

    #[test]
    fn sum_always_equals_total() {
        for (total, count) in [
            (dec!(100.00), 3),
            (dec!(0.05), 2),
            (dec!(1999.99), 12),
            (dec!(1.00), 7),
            (dec!(12345.67), 24),
        ] {
            let installments = expand(total, count, date!(2024 - 08 - 31)).unwrap();

            let sum: Decimal = installments.iter().map(|i| i.amount).sum();
            assert_eq!(sum, total, "sum of {count} installments of {total}");
        }
    }

    #[test]
    fn numbers_are_contiguous_from_one() {
        let installments = expand(dec!(1200), 12, date!(2024 - 01 - 10)).unwrap();

        let numbers: Vec<u32> = installments.iter().map(|i| i.number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
        assert_eq!(installments[11].date, date!(2024 - 12 - 10));
    }

    #[test]
    fn spans_years() {
        let installments = expand(dec!(300), 3, date!(2024 - 11 - 30)).unwrap();

        let dates: Vec<_> = installments.iter().map(|i| i.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 11 - 30),
                date!(2024 - 12 - 30),
                date!(2025 - 01 - 30)
            ]
        );
    }

    #[test]
    fn returns_none_when_a_date_overflows() {
        assert_eq!(expand(dec!(10.00), 2, Date::MAX), None);
    }
}
