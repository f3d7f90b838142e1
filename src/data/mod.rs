//! Data layer: the bar store and the benchmark timeline.

pub mod bar_store;
pub mod timeline;

pub use bar_store::BarStore;
pub use timeline::Timeline;
