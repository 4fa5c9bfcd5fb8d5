mod lightning;
mod rain;

pub use lightning::{BoltPath, LightningFrame, LightningShow};
pub use rain::{RainDrop, RainField};
