use serde::{Deserialize, Serialize};
use std::fmt;

use super::numeric::Measurement;
use super::sky::SkyPosition;
use crate::constants::NULL_TOKEN;
use crate::error::Result;

/// Which step of the resolution chain produced a parallax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParallaxFlag {
    Gaia,
    Catalog,
    Spectroscopic,
    None,
}

impl ParallaxFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParallaxFlag::Gaia => "GAIA",
            ParallaxFlag::Catalog => "CATALOG",
            ParallaxFlag::Spectroscopic => "SPECTROSCOPIC",
            ParallaxFlag::None => "NONE",
        }
    }

    /// Interpret a persisted flag, including the labels older catalog rows carry.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "GAIA" | "GAIADR2" | "GAIADR3" | "GAIAEDR3" => Some(ParallaxFlag::Gaia),
            "CATALOG" | "SIMBAD" => Some(ParallaxFlag::Catalog),
            "SPECTROSCOPIC" | "SPEC" => Some(ParallaxFlag::Spectroscopic),
            "NONE" | NULL_TOKEN => Some(ParallaxFlag::None),
            _ => None,
        }
    }
}

impl fmt::Display for ParallaxFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SWEET-Cat row. Text fields hold the persisted token, `NULL` when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    pub name: String,
    pub cross_id: String,
    pub ra: String,
    pub dec: String,
    pub v_mag: Measurement,
    pub parallax: Measurement,
    pub parallax_flag: String,
    pub teff: Measurement,
    pub logg: Measurement,
    pub reserved1: String,
    pub reserved2: String,
    pub microturbulence: Measurement,
    pub feh: Measurement,
    pub mass: Measurement,
    pub author: String,
    pub link: String,
    pub source_flag: String,
    pub update_date: String,
    pub comment: String,
    pub reserved3: String,
}

impl StarRecord {
    /// A record with every field unknown.
    pub fn empty(name: &str) -> Self {
        let null = || NULL_TOKEN.to_string();
        Self {
            name: name.trim().to_string(),
            cross_id: null(),
            ra: null(),
            dec: null(),
            v_mag: Measurement::unknown(),
            parallax: Measurement::unknown(),
            parallax_flag: null(),
            teff: Measurement::unknown(),
            logg: Measurement::unknown(),
            reserved1: null(),
            reserved2: null(),
            microturbulence: Measurement::unknown(),
            feh: Measurement::unknown(),
            mass: Measurement::unknown(),
            author: null(),
            link: null(),
            source_flag: null(),
            update_date: null(),
            comment: null(),
            reserved3: null(),
        }
    }

    pub fn sky_position(&self) -> Result<SkyPosition> {
        SkyPosition::from_sexagesimal(&self.ra, &self.dec)
    }

    pub fn set_position(&mut self, position: &SkyPosition) {
        let (ra, dec) = position.to_sexagesimal();
        self.ra = ra;
        self.dec = dec;
    }

    pub fn provenance(&self) -> Option<ParallaxFlag> {
        ParallaxFlag::from_label(&self.parallax_flag)
    }
}
