use crate::models::LineItem;

/// Sum of `quantity * unit_price` over `items`, unrounded.
pub fn compute_total(items: &[LineItem]) -> f64 {
    items
        .iter()
        .map(|item| item.quantity as f64 * item.unit_price)
        .sum()
}

/// Round a bundle total to a whole currency unit, ties up.
pub fn round_price(total: f64) -> i64 {
    (total + 0.5).floor() as i64
}
