mod model;
mod persistence;

pub use model::{
    gain, AmbientSettings, LightningIntensity, LightningType, RainIntensity, ThunderFrequency,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, SettingsStore};

#[cfg(test)]
pub use persistence::SETTINGS_KEY;
