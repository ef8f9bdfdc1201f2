//! Amount formatting for the order sheet.

use rust_decimal::{Decimal, RoundingStrategy};

/// Two-decimal rendering without grouping, e.g. `1299.50`.
#[must_use]
pub fn format_plain(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Two-decimal rendering with Indian digit grouping: the last three integer
/// digits form one group, then groups of two (`12,34,567.89`).
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let plain = format_plain(amount.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let mut pairs: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            pairs.push(&head[start..end]);
            end = start;
        }
        pairs.reverse();
        format!("{},{tail}", pairs.join(","))
    };

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
