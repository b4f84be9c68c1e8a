//! Aggregation of line items into invoice totals.

use rust_decimal::Decimal;

use super::types::InvoiceTotals;

impl InvoiceTotals {
    /// Totals of an invoice without items.
    pub const ZERO: Self = Self {
        amount: Decimal::ZERO,
        vat: Decimal::ZERO,
    };

    /// Sums `(amount, vat)` pairs of the invoice's current items.
    ///
    /// An empty iterator yields zero totals.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        lines
            .into_iter()
            .fold(Self::ZERO, |acc, (amount, vat)| Self {
                amount: acc.amount + amount,
                vat: acc.vat + vat,
            })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn money() -> impl Strategy<Value = Decimal> {
        // Up to 10 million with cents.
        (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    #[test]
    fn test_no_items_is_zero() {
        let totals = InvoiceTotals::from_lines(Vec::new());
        assert_eq!(totals, InvoiceTotals::ZERO);
        assert_eq!(totals.amount, Decimal::ZERO);
        assert_eq!(totals.vat, Decimal::ZERO);
    }

    #[test]
    fn test_sum_of_scenario_items() {
        let totals = InvoiceTotals::from_lines([(dec!(20), dec!(2)), (dec!(5), dec!(0))]);
        assert_eq!(totals.amount, dec!(25));
        assert_eq!(totals.vat, dec!(2));

        let totals = InvoiceTotals::from_lines([(dec!(5), dec!(0))]);
        assert_eq!(totals.amount, dec!(5));
        assert_eq!(totals.vat, dec!(0));
    }

    #[test]
    fn test_cents_do_not_drift() {
        let lines = std::iter::repeat_n((dec!(0.10), dec!(0.01)), 1_000);
        let totals = InvoiceTotals::from_lines(lines);
        assert_eq!(totals.amount, dec!(100.00));
        assert_eq!(totals.vat, dec!(10.00));
    }

    proptest! {
        /// Totals equal the exact decimal sum of every line.
        #[test]
        fn prop_sum_invariant(lines in prop::collection::vec((money(), money()), 0..50)) {
            let totals = InvoiceTotals::from_lines(lines.iter().copied());

            let amount: Decimal = lines.iter().map(|(a, _)| *a).sum();
            let vat: Decimal = lines.iter().map(|(_, v)| *v).sum();
            prop_assert_eq!(totals.amount, amount);
            prop_assert_eq!(totals.vat, vat);
        }

        /// Aggregating the same item set twice gives identical totals.
        #[test]
        fn prop_idempotent(lines in prop::collection::vec((money(), money()), 0..50)) {
            let first = InvoiceTotals::from_lines(lines.iter().copied());
            let second = InvoiceTotals::from_lines(lines.iter().copied());
            prop_assert_eq!(first, second);
        }

        /// Order of items does not matter.
        #[test]
        fn prop_order_independent(lines in prop::collection::vec((money(), money()), 0..50)) {
            let mut reversed = lines.clone();
            reversed.reverse();
            prop_assert_eq!(
                InvoiceTotals::from_lines(lines),
                InvoiceTotals::from_lines(reversed)
            );
        }
    }
}
