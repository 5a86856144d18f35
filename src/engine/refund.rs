//! Proportional reversal of prime earnings after a guest refund.

use crate::domain::{round_minor, EarningType};
use rust_decimal::Decimal;

use super::Calculation;

/// Append `refund` lines reversing each party's share of `refunded`.
///
/// Every positive party line gives back `amount * refunded / total_fee`
/// (rounded); the platform covers the remainder so the ledger nets to
/// `total_fee - refunded`.
pub fn apply_refund(calc: &mut Calculation, total_fee: i64, refunded: i64) {
    if refunded == 0 || total_fee == 0 {
        return;
    }

    let ratio = Decimal::from(refunded) / Decimal::from(total_fee);
    let reversals: Vec<_> = calc
        .entries
        .iter()
        .filter(|e| e.earning_type != EarningType::Refund && e.amount > 0)
        .map(|e| (e.user_id, e.earning_type, round_minor(Decimal::from(e.amount) * ratio)))
        .collect();

    let mut party_refunded = 0;
    for (user_id, refund_of, amount) in reversals {
        party_refunded += amount;
        calc.push_refund(user_id, refund_of, -amount);
    }

    calc.platform_earnings_refunded = refunded - party_refunded;
    calc.expected_total -= refunded;
}
