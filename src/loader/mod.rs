pub mod sample_loader;

pub use sample_loader::{spawn_loader, AssetLoader};
