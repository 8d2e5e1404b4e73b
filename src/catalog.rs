//! Catalog product rules: unit parsing and cost/price derivation.

use std::str::FromStr;

use crate::error::CatalogError;
use crate::models::{
    CreateProductRequest, Product, ProductId, UnitOfMeasure, UpdateProductRequest,
    MAX_SERVICE_IMAGES,
};

impl FromStr for UnitOfMeasure {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UNIT" => Ok(UnitOfMeasure::Unit),
            "KILOGRAM" => Ok(UnitOfMeasure::Kilogram),
            _ => Err(CatalogError::InvalidUnit(s.to_string())),
        }
    }
}

impl UnitOfMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Unit => "UNIT",
            UnitOfMeasure::Kilogram => "KILOGRAM",
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cost of one unit: the purchase cost spread over the purchased quantity.
pub fn unit_cost(purchase_cost: f64, quantity: f64) -> Result<f64, CatalogError> {
    if !(quantity > 0.0) {
        return Err(CatalogError::InvalidQuantity);
    }
    Ok(round2(purchase_cost / quantity))
}

/// Selling price: unit cost plus a percentage margin.
pub fn sale_price(cost: f64, profit_margin: f64) -> Result<f64, CatalogError> {
    if !(cost > 0.0) {
        return Err(CatalogError::InvalidCost);
    }
    if !(profit_margin >= 0.0) {
        return Err(CatalogError::InvalidMargin);
    }
    Ok(round2(cost + cost * profit_margin / 100.0))
}

impl Product {
    /// Build a product from a create request. `id` is assigned by storage;
    /// pass `0` until the row exists.
    pub fn from_request(id: ProductId, request: &CreateProductRequest) -> Result<Self, CatalogError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let minimum_order = request.minimum_order.unwrap_or(1);
        if minimum_order < 1 {
            return Err(CatalogError::InvalidMinimumOrder);
        }

        let unit_of_measure = request.unit_of_measure.parse::<UnitOfMeasure>()?;
        let cost = unit_cost(request.purchase_cost, request.quantity)?;
        let price = sale_price(cost, request.profit_margin)?;

        Ok(Product {
            id,
            name: name.to_string(),
            unit_of_measure,
            quantity: request.quantity,
            purchase_cost: request.purchase_cost,
            cost,
            profit_margin: request.profit_margin,
            price,
            minimum_order,
            available: request.available.unwrap_or(true),
        })
    }

    /// Apply a partial update, re-deriving cost and price when their inputs change.
    /// On error the product is left untouched.
    pub fn apply_update(&mut self, update: &UpdateProductRequest) -> Result<(), CatalogError> {
        let mut next = self.clone();

        if let Some(name) = &update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyName);
            }
            next.name = name.to_string();
        }
        if let Some(unit) = &update.unit_of_measure {
            next.unit_of_measure = unit.parse::<UnitOfMeasure>()?;
        }
        if let Some(quantity) = update.quantity {
            next.quantity = quantity;
        }
        if let Some(purchase_cost) = update.purchase_cost {
            next.purchase_cost = purchase_cost;
        }
        if let Some(profit_margin) = update.profit_margin {
            next.profit_margin = profit_margin;
        }
        if update.quantity.is_some() || update.purchase_cost.is_some() {
            next.cost = unit_cost(next.purchase_cost, next.quantity)?;
        }
        if update.quantity.is_some()
            || update.purchase_cost.is_some()
            || update.profit_margin.is_some()
        {
            next.price = sale_price(next.cost, next.profit_margin)?;
        }
        if let Some(minimum_order) = update.minimum_order {
            if minimum_order < 1 {
                return Err(CatalogError::InvalidMinimumOrder);
            }
            next.minimum_order = minimum_order;
        }
        if let Some(available) = update.available {
            next.available = available;
        }

        *self = next;
        Ok(())
    }
}

pub fn validate_image_urls(urls: &[String]) -> Result<(), CatalogError> {
    if urls.len() > MAX_SERVICE_IMAGES {
        return Err(CatalogError::TooManyImages {
            max: MAX_SERVICE_IMAGES,
            got: urls.len(),
        });
    }
    Ok(())
}
