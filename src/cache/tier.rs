//! Cache Tier Module
//!
//! Names the four independently bounded cache partitions.

use std::fmt;

use serde::Serialize;

// == Cache Tier ==
/// One of the four named cache partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    /// Static assets: stylesheets, scripts, fonts and the allow-listed shell
    Static,
    /// Navigated pages and primed movie payloads
    Runtime,
    /// Images and posters
    Image,
    /// Allow-listed API responses
    Api,
}

impl CacheTier {
    /// Every tier, in a stable order.
    pub const ALL: [CacheTier; 4] = [
        CacheTier::Static,
        CacheTier::Runtime,
        CacheTier::Image,
        CacheTier::Api,
    ];

    /// Identifier prefix, without the version tag.
    pub fn prefix(self) -> &'static str {
        match self {
            CacheTier::Static => "static",
            CacheTier::Runtime => "runtime",
            CacheTier::Image => "images",
            CacheTier::Api => "api",
        }
    }

    /// Maximum number of entries the tier may hold.
    pub fn bound(self) -> usize {
        match self {
            CacheTier::Static => 50,
            CacheTier::Runtime => 100,
            CacheTier::Image => 200,
            CacheTier::Api => 50,
        }
    }

    /// Namespaced identifier, e.g. `images-v2`.
    ///
    /// A different version yields a different identifier, so bumping it
    /// leaves the old tiers orphaned.
    pub fn id(self, version: &str) -> String {
        format!("{}-v{}", self.prefix(), version)
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
