//! Feature categories and the climate/terrain lookup table.
//!
//! Each supported `(Climate, EnvironmentType)` pair owns a [`CategorySet`]: an ordered list
//! of OSM-style tag rules, plus the equivalent footprint used for line and point features.
//! The lookup is an exhaustive match, so adding a climate or terrain forces a decision here.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{Climate, EnvironmentType};
use crate::error::{Error, Result};

/// Category assigned to a classified feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FeatureCategory {
    Structure,
    Road,
    Linear,
    Drainage,
    Water,
    Brush,
    Scrub,
    Woodland,
    Field,
    Rock,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 10] = [
        FeatureCategory::Structure,
        FeatureCategory::Road,
        FeatureCategory::Linear,
        FeatureCategory::Drainage,
        FeatureCategory::Water,
        FeatureCategory::Brush,
        FeatureCategory::Scrub,
        FeatureCategory::Woodland,
        FeatureCategory::Field,
        FeatureCategory::Rock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureCategory::Structure => "structure",
            FeatureCategory::Road => "road",
            FeatureCategory::Linear => "linear",
            FeatureCategory::Drainage => "drainage",
            FeatureCategory::Water => "water",
            FeatureCategory::Brush => "brush",
            FeatureCategory::Scrub => "scrub",
            FeatureCategory::Woodland => "woodland",
            FeatureCategory::Field => "field",
            FeatureCategory::Rock => "rock",
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FeatureCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedName(s.to_owned()))
    }
}

/// Matches a single tag key, optionally restricted to a set of values.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    pub key: &'static str,
    /// Accepted values; empty accepts any value except `"no"`.
    pub values: &'static [&'static str],
}

impl TagRule {
    pub const fn any(key: &'static str) -> Self {
        Self { key, values: &[] }
    }

    pub const fn one_of(key: &'static str, values: &'static [&'static str]) -> Self {
        Self { key, values }
    }

    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match tags.get(self.key) {
            Some(value) if self.values.is_empty() => value != "no",
            Some(value) => self.values.contains(&value.as_str()),
            None => false,
        }
    }
}

/// Equivalent footprint dimensions for features without an area of their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Width in meters a line feature is assumed to occupy.
    pub line_width_m: f64,
    /// Radius in meters a point feature is assumed to occupy.
    pub point_radius_m: f64,
}

impl Footprint {
    pub const DEFAULT: Footprint = Footprint {
        line_width_m: 10.0,
        point_radius_m: 10.0,
    };
}

/// One category with the tags that select it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: FeatureCategory,
    pub tags: &'static [TagRule],
    pub footprint: Footprint,
}

impl CategoryRule {
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        self.tags.iter().any(|rule| rule.matches(tags))
    }
}

/// The ordered category rules of one climate/terrain pair.
#[derive(Debug)]
pub struct CategorySet {
    pub climate: Climate,
    pub environment_type: EnvironmentType,
    pub rules: &'static [CategoryRule],
}

impl CategorySet {
    /// First rule whose tags match, in table order.
    pub fn classify(&self, tags: &BTreeMap<String, String>) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.matches(tags))
    }

    pub fn rule(&self, category: FeatureCategory) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.category == category)
    }

    pub fn categories(&self) -> impl Iterator<Item = FeatureCategory> + '_ {
        self.rules.iter().map(|r| r.category)
    }

    /// Footprint for `category`, falling back to [`Footprint::DEFAULT`].
    pub fn footprint(&self, category: FeatureCategory) -> Footprint {
        self.rule(category).map_or(Footprint::DEFAULT, |r| r.footprint)
    }
}

/// Looks up the category set for a climate/terrain pair.
pub fn category_set(
    climate: Climate,
    environment_type: EnvironmentType,
) -> Result<&'static CategorySet> {
    match (climate, environment_type) {
        (Climate::Temperate, EnvironmentType::Flat) => Ok(&TEMPERATE_FLAT),
        (Climate::Temperate, EnvironmentType::Mountainous) => Ok(&TEMPERATE_MOUNTAINOUS),
        (Climate::Dry, EnvironmentType::Flat) => Ok(&DRY_FLAT),
        (Climate::Dry, EnvironmentType::Mountainous) => Err(Error::UnsupportedConfiguration {
            climate,
            environment_type,
        }),
    }
}

const BUILDING: &[TagRule] = &[TagRule::any("building")];
const ROAD: &[TagRule] = &[TagRule::any("highway")];
const LINEAR: &[TagRule] = &[
    TagRule::any("railway"),
    TagRule::one_of("power", &["line", "minor_line"]),
    TagRule::one_of("barrier", &["fence", "wall", "hedge"]),
    TagRule::one_of("man_made", &["pipeline", "embankment"]),
];
const DRAINAGE: &[TagRule] = &[TagRule::one_of(
    "waterway",
    &["river", "stream", "canal", "ditch", "drain", "brook"],
)];
const WATER: &[TagRule] = &[
    TagRule::one_of("natural", &["water", "wetland"]),
    TagRule::one_of("waterway", &["riverbank"]),
    TagRule::one_of("landuse", &["reservoir", "basin"]),
];
const WOODLAND: &[TagRule] = &[
    TagRule::one_of("landuse", &["forest"]),
    TagRule::one_of("natural", &["wood"]),
];
const SCRUB: &[TagRule] = &[TagRule::one_of("natural", &["scrub"])];
const BRUSH_FLAT: &[TagRule] = &[TagRule::one_of("natural", &["heath", "grassland"])];
const BRUSH_MOUNTAINOUS: &[TagRule] = &[
    TagRule::one_of("natural", &["heath", "grassland", "fell"]),
    TagRule::one_of("landuse", &["grass", "meadow"]),
];
const FIELD_FLAT: &[TagRule] = &[TagRule::one_of(
    "landuse",
    &[
        "farmland",
        "farmyard",
        "meadow",
        "grass",
        "orchard",
        "vineyard",
        "allotments",
    ],
)];
const FIELD_MOUNTAINOUS: &[TagRule] = &[TagRule::one_of(
    "landuse",
    &["farmland", "farmyard", "orchard", "vineyard", "allotments"],
)];
const ROCK: &[TagRule] = &[TagRule::one_of(
    "natural",
    &["bare_rock", "scree", "cliff", "stone", "rock", "shingle"],
)];

const fn rule(
    category: FeatureCategory,
    tags: &'static [TagRule],
    line_width_m: f64,
    point_radius_m: f64,
) -> CategoryRule {
    CategoryRule {
        category,
        tags,
        footprint: Footprint {
            line_width_m,
            point_radius_m,
        },
    }
}

static TEMPERATE_FLAT: CategorySet = CategorySet {
    climate: Climate::Temperate,
    environment_type: EnvironmentType::Flat,
    rules: &[
        rule(FeatureCategory::Structure, BUILDING, 10.0, 10.0),
        rule(FeatureCategory::Road, ROAD, 12.0, 10.0),
        rule(FeatureCategory::Linear, LINEAR, 6.0, 5.0),
        rule(FeatureCategory::Water, WATER, 10.0, 10.0),
        rule(FeatureCategory::Drainage, DRAINAGE, 8.0, 5.0),
        rule(FeatureCategory::Woodland, WOODLAND, 10.0, 15.0),
        rule(FeatureCategory::Scrub, SCRUB, 10.0, 15.0),
        rule(FeatureCategory::Brush, BRUSH_FLAT, 10.0, 15.0),
        rule(FeatureCategory::Field, FIELD_FLAT, 10.0, 15.0),
        rule(FeatureCategory::Rock, ROCK, 10.0, 15.0),
    ],
};

static TEMPERATE_MOUNTAINOUS: CategorySet = CategorySet {
    climate: Climate::Temperate,
    environment_type: EnvironmentType::Mountainous,
    rules: &[
        rule(FeatureCategory::Structure, BUILDING, 10.0, 10.0),
        rule(FeatureCategory::Road, ROAD, 10.0, 10.0),
        rule(FeatureCategory::Linear, LINEAR, 6.0, 5.0),
        rule(FeatureCategory::Water, WATER, 10.0, 10.0),
        rule(FeatureCategory::Drainage, DRAINAGE, 8.0, 5.0),
        rule(FeatureCategory::Rock, ROCK, 15.0, 20.0),
        rule(FeatureCategory::Scrub, SCRUB, 10.0, 15.0),
        rule(FeatureCategory::Woodland, WOODLAND, 10.0, 15.0),
        rule(FeatureCategory::Brush, BRUSH_MOUNTAINOUS, 10.0, 15.0),
        rule(FeatureCategory::Field, FIELD_MOUNTAINOUS, 10.0, 15.0),
    ],
};

static DRY_FLAT: CategorySet = CategorySet {
    climate: Climate::Dry,
    environment_type: EnvironmentType::Flat,
    rules: &[
        rule(FeatureCategory::Structure, BUILDING, 10.0, 10.0),
        rule(FeatureCategory::Road, ROAD, 10.0, 10.0),
        rule(FeatureCategory::Linear, LINEAR, 6.0, 5.0),
        rule(FeatureCategory::Water, WATER, 10.0, 10.0),
        rule(FeatureCategory::Drainage, DRAINAGE, 3.0, 3.0),
        rule(FeatureCategory::Scrub, SCRUB, 10.0, 15.0),
        rule(FeatureCategory::Brush, BRUSH_FLAT, 10.0, 15.0),
        rule(FeatureCategory::Rock, ROCK, 10.0, 15.0),
        rule(FeatureCategory::Field, FIELD_FLAT, 10.0, 15.0),
        rule(FeatureCategory::Woodland, WOODLAND, 10.0, 15.0),
    ],
};
