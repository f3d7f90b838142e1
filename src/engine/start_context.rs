//! The context passed to `on_start`, the only callback allowed to register
//! indicators (spec.md §3 "IndicatorSpec... Registered during on_start;
//! frozen thereafter").

use super::state_bag::StateBag;
use crate::indicators::{Indicator, IndicatorRegistry};

pub struct StartContext<'a> {
    pub state: &'a mut StateBag,
    registry: &'a mut IndicatorRegistry,
}

impl<'a> StartContext<'a> {
    pub(crate) fn new(state: &'a mut StateBag, registry: &'a mut IndicatorRegistry) -> Self {
        Self { state, registry }
    }

    pub fn register_indicator(&mut self, name: impl Into<String>, indicator: Box<dyn Indicator>) {
        self.registry.register(name, indicator);
    }
}
