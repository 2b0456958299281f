use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Epic,
    Steam,
    Psn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Epic, Platform::Steam, Platform::Psn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Epic => "epic",
            Platform::Steam => "steam",
            Platform::Psn => "psn",
        }
    }

    /// File name the platform fetcher dumps its raw result to.
    pub fn dump_file_name(&self) -> &'static str {
        match self {
            Platform::Epic => "EPIC.json",
            Platform::Steam => "STEAM.json",
            Platform::Psn => "PSN.json",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
