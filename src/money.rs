//! Money helpers.
//!
//! Amounts are `Decimal` end to end. Display follows the register pages:
//! `R$` prefix, two decimals, dot separator.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents (banker's rounding is not what a till shows).
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `R$ 12.50`
pub fn format_brl(amount: Decimal) -> String {
    format!("R$ {:.2}", round_cents(amount))
}

/// Signed variant used for day-over-day comparisons: `+R$ 3.00`, `R$ -3.00`.
pub fn format_signed_brl(amount: Decimal) -> String {
    if amount > Decimal::ZERO {
        format!("+{}", format_brl(amount))
    } else {
        format_brl(amount)
    }
}
