// The settings record: one section per channel plus the lightning visuals.
// Defaults here are what a first run (or a missing field) falls back to.

use serde::{Deserialize, Deserializer, Serialize};

// Generates the lowercase select enums shared by the panel and the persisted blob.
macro_rules! select_enum {
    ($name:ident, default = $default:ident, [$($variant:ident => $text:literal),+ $(,)?]) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            // cycling, for left/right on a select control
            pub fn next(self) -> Self {
                let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
                Self::ALL[(i + 1) % Self::ALL.len()]
            }

            pub fn prev(self) -> Self {
                let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
                Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
            }
        }
    };
}

select_enum!(RainIntensity, default = Medium, [
    Light => "light",
    Medium => "medium",
    Heavy => "heavy",
    Storm => "storm",
]);

select_enum!(ThunderFrequency, default = Occasional, [
    Rare => "rare",
    Occasional => "occasional",
    Frequent => "frequent",
    Storm => "storm",
]);

select_enum!(LightningIntensity, default = Medium, [
    Subtle => "subtle",
    Medium => "medium",
    Bright => "bright",
    Extreme => "extreme",
]);

select_enum!(LightningType, default = Single, [
    Single => "single",
    Multiple => "multiple",
    Continuous => "continuous",
]);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RainSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_volume")]
    pub volume: i32,
    pub intensity: RainIntensity,
}

impl Default for RainSettings {
    fn default() -> Self {
        Self { enabled: false, volume: 30, intensity: RainIntensity::Medium }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThunderSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_volume")]
    pub volume: i32,
    pub frequency: ThunderFrequency,
}

impl Default for ThunderSettings {
    fn default() -> Self {
        Self { enabled: false, volume: 25, frequency: ThunderFrequency::Occasional }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightningSettings {
    pub intensity: LightningIntensity,
    #[serde(rename = "type")]
    pub kind: LightningType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrowdSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_volume")]
    pub volume: i32,
}

impl Default for CrowdSettings {
    fn default() -> Self {
        Self { enabled: false, volume: 15 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MusicSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_volume")]
    pub volume: i32,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self { enabled: false, volume: 25 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AmbientSettings {
    pub rain: RainSettings,
    pub thunder: ThunderSettings,
    pub lightning: LightningSettings,
    pub crowd: CrowdSettings,
    pub music: MusicSettings,
}

/// Volume (nominally 0..=100) as a gain in [0, 1].
pub fn gain(volume: i32) -> f32 {
    (volume as f32 / 100.0).clamp(0.0, 1.0)
}

// Browser sliders persisted their value as a string ("42"); both forms are accepted.
// Range is deliberately not checked here.
fn lenient_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVolume {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match RawVolume::deserialize(deserializer)? {
        RawVolume::Int(v) => Ok(v.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        RawVolume::Float(v) => Ok(v as i32),
        RawVolume::Text(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i32))
                .map_err(|_| serde::de::Error::custom(format!("not a volume: {s:?}")))
        }
    }
}
