//! The single open holding and its cost basis.

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub quantity: f64,
    pub average_entry_price: f64,
}

impl Holding {
    pub fn new(quantity: f64, price: f64) -> Self {
        Holding {
            quantity,
            average_entry_price: price,
        }
    }

    /// Add a lot, moving the entry price to the quantity-weighted average.
    pub fn add_lot(&self, quantity: f64, price: f64) -> Self {
        let total = self.quantity + quantity;
        let average_entry_price =
            (self.average_entry_price * self.quantity + price * quantity) / total;
        Holding {
            quantity: total,
            average_entry_price,
        }
    }

    /// Half the quantity at the same cost basis.
    pub fn halve(&self) -> Self {
        Holding {
            quantity: self.quantity / 2.0,
            average_entry_price: self.average_entry_price,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}
