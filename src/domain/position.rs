//! Position — an open holding in a single symbol, with T+1 availability.

use serde::{Deserialize, Serialize};

/// Tolerance used for all "is this effectively zero" comparisons on
/// quantities (spec.md §7 "Numerical policy").
pub const QTY_EPSILON: f64 = 1e-9;

/// An open long position (no shorting — spec.md §1 Non-goals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: f64,
    pub avg_cost: f64,
    /// Shares eligible for sale right now. `<= qty`; shares bought this bar
    /// are excluded until the next bar's T+1 release, unless the symbol is
    /// in the configured `t0_symbols` set.
    pub available_qty: f64,
    /// The "acquired-today" bucket (spec.md §4.5 step 7), freshly credited
    /// by a fill this settlement and not yet through one `release_t1` call.
    locked_new: f64,
    /// Shares that have aged through exactly one `release_t1` call since
    /// being credited; the next call moves them into `available_qty`.
    ///
    /// Two stages, not one, because a next-bar-open fill is applied to the
    /// account during the bar *before* the one its settlement timestamp
    /// names (see `engine::matcher::resolve_ref_price`): the scheduler's
    /// very next `release_t1_all` call is the one matching that settlement
    /// bar itself, not the bar after it. Promoting straight to
    /// `available_qty` there would let a position be sold the same bar it
    /// was priced into, one bar earlier than spec.md's scenario B requires.
    locked_aging: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            qty: 0.0,
            avg_cost: 0.0,
            available_qty: 0.0,
            locked_new: 0.0,
            locked_aging: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.qty <= QTY_EPSILON
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.qty * price
    }

    /// Apply an incoming buy of `qty` shares at `price`; recomputes the
    /// weighted-average cost. If `t0` is true the new shares are
    /// immediately available for sale (t0_symbols exemption); otherwise
    /// they enter the acquired-today bucket, locked until two subsequent
    /// `release_t1` calls have passed.
    pub fn apply_buy(&mut self, qty: f64, price: f64, t0: bool) {
        let new_qty = self.qty + qty;
        self.avg_cost = if new_qty > QTY_EPSILON {
            (self.avg_cost * self.qty + price * qty) / new_qty
        } else {
            0.0
        };
        self.qty = new_qty;
        if t0 {
            self.available_qty += qty;
        } else {
            self.locked_new += qty;
        }
    }

    /// Apply an outgoing sell of `qty` shares; caller is responsible for
    /// ensuring `qty <= available_qty` beforehand.
    pub fn apply_sell(&mut self, qty: f64) {
        self.qty -= qty;
        self.available_qty -= qty;
        if self.qty < QTY_EPSILON {
            self.qty = 0.0;
        }
        if self.available_qty < QTY_EPSILON {
            self.available_qty = 0.0;
        }
    }

    /// T+1 release: called at the start of every bar, before `on_bar`.
    /// Ages `locked_new` into `locked_aging` and promotes whatever was
    /// already aging into `available_qty`.
    pub fn release_t1(&mut self) {
        self.available_qty += self.locked_aging;
        self.locked_aging = self.locked_new;
        self.locked_new = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fill credited this settlement stays locked through the scheduler's
    /// very next `release_t1` call (the bar the settlement itself names,
    /// under next-bar-open timing) and only opens up on the call after
    /// that (spec.md §8 scenario B).
    #[test]
    fn buy_locks_shares_through_one_release_then_opens_on_the_next() {
        let mut pos = Position::new("600000.SH");
        pos.apply_buy(1000.0, 10.0, false);
        assert_eq!(pos.qty, 1000.0);
        assert_eq!(pos.available_qty, 0.0);
        pos.release_t1();
        assert_eq!(pos.available_qty, 0.0, "still locked one bar after the buy");
        pos.release_t1();
        assert_eq!(pos.available_qty, 1000.0);
    }

    #[test]
    fn t0_symbol_buy_is_immediately_available() {
        let mut pos = Position::new("510300.SH");
        pos.apply_buy(500.0, 4.0, true);
        assert_eq!(pos.available_qty, 500.0);
    }

    #[test]
    fn weighted_average_cost_on_second_buy() {
        let mut pos = Position::new("600000.SH");
        pos.apply_buy(1000.0, 10.0, true);
        pos.apply_buy(1000.0, 12.0, true);
        assert!((pos.avg_cost - 11.0).abs() < 1e-9);
    }

    #[test]
    fn sell_prunes_to_flat() {
        let mut pos = Position::new("600000.SH");
        pos.apply_buy(1000.0, 10.0, true);
        pos.apply_sell(1000.0);
        assert!(pos.is_flat());
        assert_eq!(pos.available_qty, 0.0);
    }
}
