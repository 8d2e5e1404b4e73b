//! Custom order quotes built by customers from the public catalog.

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::models::{Product, ProductId};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuoteSelection {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteRequest {
    pub selections: Vec<QuoteSelection>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub total: f64,
    /// Plain-text order message the customer sends to the business.
    pub summary: String,
}

/// Price `selections` against `catalog`.
///
/// Selections of the same product are merged before the minimum order is checked.
pub fn build_quote(
    selections: &[QuoteSelection],
    catalog: &[Product],
    greeting: &str,
) -> Result<Quote, QuoteError> {
    if selections.is_empty() {
        return Err(QuoteError::Empty);
    }

    let mut merged: Vec<(&Product, i64)> = Vec::new();
    for selection in selections {
        let product = catalog
            .iter()
            .find(|p| p.id == selection.product_id)
            .ok_or(QuoteError::UnknownProduct(selection.product_id))?;

        if !product.available {
            return Err(QuoteError::Unavailable(product.name.clone()));
        }

        match merged.iter_mut().find(|(p, _)| p.id == product.id) {
            Some((_, quantity)) => {
                *quantity = quantity
                    .checked_add(selection.quantity)
                    .ok_or_else(|| QuoteError::QuantityOverflow(product.name.clone()))?;
            }
            None => merged.push((product, selection.quantity)),
        }
    }

    let mut lines = Vec::with_capacity(merged.len());
    for (product, quantity) in merged {
        if quantity < i64::from(product.minimum_order) {
            return Err(QuoteError::BelowMinimum {
                name: product.name.clone(),
                minimum: product.minimum_order,
                requested: quantity,
            });
        }

        lines.push(QuoteLine {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
            subtotal: product.price * quantity as f64,
        });
    }

    let total = lines.iter().map(|line| line.subtotal).sum();
    let summary = order_summary(&lines, total, greeting);

    Ok(Quote {
        lines,
        total,
        summary,
    })
}

fn order_summary(lines: &[QuoteLine], total: f64, greeting: &str) -> String {
    let details = lines
        .iter()
        .map(|line| format!("{} {} (${:.2})", line.quantity, line.name, line.subtotal))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{greeting}\n\n{details}\n\nTotal: ${total:.2}")
}
