//! Inventory record: the payload stored in every tree node

use std::fmt;

/// Integer key identifying an item in the inventory.
pub type Code = i32;

/// Stock item keyed by its code.
///
/// Code, name and unit price are fixed at construction; only the stock
/// quantity changes, and only downwards via [`Record::reduce_stock`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    code: Code,
    name: String,
    stock: u32,
    unit_price: f64,
}

impl Record {
    pub fn new(code: Code, name: impl Into<String>, stock: u32, unit_price: f64) -> Self {
        Self {
            code,
            name: name.into(),
            stock,
            unit_price,
        }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    /// Decrement stock by `amount`, clamping at zero.
    pub fn reduce_stock(&mut self, amount: u32) {
        self.stock = self.stock.saturating_sub(amount);
    }

    pub fn is_depleted(&self) -> bool {
        self.stock == 0
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} | stock: {}", self.code, self.name, self.stock)
    }
}
