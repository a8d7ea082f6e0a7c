//! Fee and discount calculation.
//!
//! Pure functions consulted by both settlement paths. The fee is
//! always computed on the full price (multiplication before division,
//! floored), then rescaled by the buyer's discount. The split
//! invariant is exact: `seller_proceeds + fee == price`.

use curio_core::Amount;

use crate::error::{MarketError, Result};

/// Maximum marketplace fee percentage.
pub const MAX_FEE_PERCENT: u8 = 5;

/// Computes the base fee: `floor(price * fee_percent / 100)`.
///
/// # Errors
///
/// Returns `FeeTooHigh` if `fee_percent` exceeds [`MAX_FEE_PERCENT`],
/// `Overflow` if the computation does not fit.
pub fn base_fee(price: Amount, fee_percent: u8) -> Result<Amount> {
    if fee_percent > MAX_FEE_PERCENT {
        return Err(MarketError::FeeTooHigh {
            percent: fee_percent,
            max: MAX_FEE_PERCENT,
        });
    }
    price
        .mul_div(u64::from(fee_percent), 100)
        .ok_or(MarketError::Overflow)
}

/// Rescales a base fee by the buyer's discount percentage.
///
/// A discount of 100 zeroes the fee. Values above 100 are rejected
/// rather than inverting the fee into a seller bonus.
///
/// # Errors
///
/// Returns `InvalidDiscount` if `discount_percent > 100`, `Overflow`
/// if the computation does not fit.
pub fn discounted_fee(base: Amount, discount_percent: u8) -> Result<Amount> {
    if discount_percent > 100 {
        return Err(MarketError::InvalidDiscount {
            percent: discount_percent,
        });
    }
    let rebate = base
        .mul_div(u64::from(discount_percent), 100)
        .ok_or(MarketError::Overflow)?;
    base.checked_sub(rebate).ok_or(MarketError::Overflow)
}

/// Computes the effective fee for a sale: base fee on the full price,
/// rescaled by the buyer's discount when one applies.
///
/// # Errors
///
/// Propagates [`base_fee`] and [`discounted_fee`] errors.
pub fn quote_fee(price: Amount, fee_percent: u8, discount_percent: Option<u8>) -> Result<Amount> {
    let base = base_fee(price, fee_percent)?;
    match discount_percent {
        Some(discount) => discounted_fee(base, discount),
        None => Ok(base),
    }
}

/// Splits a payment into `(seller_proceeds, fee)`.
///
/// Guarantees `seller_proceeds + fee == price`; a fee larger than the
/// price is rejected.
///
/// # Errors
///
/// Returns `Overflow` if `fee > price`.
pub fn split_payment(price: Amount, fee: Amount) -> Result<(Amount, Amount)> {
    let seller_proceeds = price.checked_sub(fee).ok_or(MarketError::Overflow)?;
    Ok((seller_proceeds, fee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(100, 5, 5; "five percent of one hundred")]
    #[test_case(50, 5, 2; "floor of two point five")]
    #[test_case(100, 0, 0; "zero percent")]
    #[test_case(19, 5, 0; "fee floors to zero on small prices")]
    #[test_case(1_000_000, 3, 30_000; "three percent of a million")]
    fn base_fee_cases(price: u64, percent: u8, expected: u64) {
        let fee = base_fee(Amount::from_units(price), percent).expect("fee");
        assert_eq!(fee.as_units(), expected);
    }

    #[test]
    fn base_fee_rejects_percent_above_cap() {
        let result = base_fee(Amount::from_units(100), 6);
        assert!(matches!(result, Err(MarketError::FeeTooHigh { .. })));
    }

    #[test]
    fn base_fee_uses_wide_intermediate() {
        // price * 5 overflows u64 but the fee itself fits
        let price = Amount::MAX;
        let expected = (u64::MAX as u128 * 5 / 100) as u64;
        let fee = base_fee(price, 5).expect("fee");
        assert_eq!(fee.as_units(), expected);
    }

    #[test_case(10, 0, 10; "no discount")]
    #[test_case(10, 50, 5; "half discount")]
    #[test_case(10, 100, 0; "full discount zeroes the fee")]
    #[test_case(3, 50, 2; "rebate floors in the buyer's disfavor")]
    fn discounted_fee_cases(base: u64, discount: u8, expected: u64) {
        let fee = discounted_fee(Amount::from_units(base), discount).expect("fee");
        assert_eq!(fee.as_units(), expected);
    }

    #[test]
    fn discount_above_hundred_is_rejected() {
        let result = discounted_fee(Amount::from_units(10), 101);
        assert!(matches!(
            result,
            Err(MarketError::InvalidDiscount { percent: 101 })
        ));
    }

    #[test]
    fn quote_fee_applies_discount_after_base() {
        // floor(50 * 5 / 100) = 2, no discount
        let fee = quote_fee(Amount::from_units(50), 5, None).expect("fee");
        assert_eq!(fee.as_units(), 2);

        // full discount
        let fee = quote_fee(Amount::from_units(50), 5, Some(100)).expect("fee");
        assert!(fee.is_zero());
    }

    #[test]
    fn split_payment_is_exact() {
        let (seller, fee) =
            split_payment(Amount::from_units(100), Amount::from_units(5)).expect("split");
        assert_eq!(seller.as_units(), 95);
        assert_eq!(fee.as_units(), 5);
    }

    #[test]
    fn split_payment_rejects_fee_above_price() {
        let result = split_payment(Amount::from_units(10), Amount::from_units(11));
        assert!(matches!(result, Err(MarketError::Overflow)));
    }

    proptest! {
        #[test]
        fn fee_never_exceeds_price(price in 0u64.., percent in 0u8..=MAX_FEE_PERCENT) {
            let fee = base_fee(Amount::from_units(price), percent).unwrap();
            prop_assert!(fee.as_units() <= price);
        }

        #[test]
        fn split_conserves_every_unit(
            price in 0u64..,
            percent in 0u8..=MAX_FEE_PERCENT,
            discount in 0u8..=100,
        ) {
            let fee = quote_fee(Amount::from_units(price), percent, Some(discount)).unwrap();
            let (seller, fee) = split_payment(Amount::from_units(price), fee).unwrap();
            prop_assert_eq!(seller.as_units() + fee.as_units(), price);
        }

        #[test]
        fn deeper_discount_never_raises_the_fee(
            price in 0u64..,
            d1 in 0u8..=100,
            d2 in 0u8..=100,
        ) {
            let lo = d1.min(d2);
            let hi = d1.max(d2);
            let fee_lo = quote_fee(Amount::from_units(price), MAX_FEE_PERCENT, Some(lo)).unwrap();
            let fee_hi = quote_fee(Amount::from_units(price), MAX_FEE_PERCENT, Some(hi)).unwrap();
            prop_assert!(fee_hi <= fee_lo);
        }
    }
}
