// Fixed asset set, addressed the way the web client did: /static/<app>/sounds/<file>
use std::path::{Path, PathBuf};

use crate::settings::RainIntensity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Track {
    pub name: &'static str,
    pub file: &'static str,
}

pub const THUNDER_SOUNDS: [&str; 3] = ["thunder-1.m4a", "thunder-2.m4a", "earthquake.mp3"];

pub const CROWD_SOUND: &str = "Cafe.mp3";

pub const PLAYLIST: [Track; 11] = [
    Track { name: "Alliyambal", file: "Alliyambal.mp3" },
    Track { name: "Ente Ellam", file: "Ente Ellam.mp3" },
    Track { name: "Kinnaragaanam", file: "Kinnaragaanam.mp3" },
    Track { name: "Moonlight", file: "Moonlight.mp3" },
    Track { name: "Nee En Sarga", file: "NeeEnSarga.mp3" },
    Track { name: "O Priye", file: "O Priye.mp3" },
    Track { name: "Oru Pushpam", file: "Oru Pushpam.mp3" },
    Track { name: "Oruvenal Puzhayil", file: "Oruvenal Puzhayil.mp3" },
    Track { name: "Pavizhamalli", file: "Pavizhamalli.mp3" },
    Track { name: "Pookkalam", file: "Pookkalam.mp3" },
    Track { name: "Santhamee Rathri", file: "Santhamee Rathri.mp3" },
];

pub fn rain_sound(intensity: RainIntensity) -> &'static str {
    match intensity {
        RainIntensity::Light => "rain-light.mp3",
        RainIntensity::Medium | RainIntensity::Heavy | RainIntensity::Storm => "Rain.mp3",
    }
}

#[derive(Clone, Debug)]
pub struct AssetCatalog {
    app: String,
    static_root: PathBuf,
}

impl AssetCatalog {
    pub fn new(app: impl Into<String>, static_root: impl Into<PathBuf>) -> Self {
        Self { app: app.into(), static_root: static_root.into() }
    }

    pub fn url(&self, file: &str) -> String {
        format!("/static/{}/sounds/{}", self.app, file)
    }

    /// Maps an asset url onto the static root; anything outside `/static/` is
    /// taken as a plain path.
    pub fn resolve(&self, url: &str) -> PathBuf {
        match url.strip_prefix("/static/") {
            Some(rest) => self.static_root.join(rest),
            None => Path::new(url).to_path_buf(),
        }
    }
}
