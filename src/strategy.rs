//! The strategy contract: the one trait user code implements.

use crate::domain::Fill;
use crate::engine::{Context, StartContext};

/// A trading strategy driven bar-by-bar by the scheduler.
///
/// Only `on_bar` is required. `on_start` runs once, before the first bar,
/// and is the only place indicators may be registered — `StartContext` has
/// no per-bar data and no order helper, so that ordering is enforced by the
/// type system rather than by convention. `on_trade` fires once per fill
/// produced while settling the bar's intents, in fill order. `on_stop` runs
/// once, after the last bar, with the final snapshot.
pub trait Strategy {
    fn on_start(&mut self, _ctx: &mut StartContext) {}

    fn on_bar(&mut self, ctx: &mut Context);

    fn on_trade(&mut self, _fill: &Fill, _ctx: &mut Context) {}

    fn on_stop(&mut self, _ctx: &mut Context) {}
}
