#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level catalog for Join Circuit.
//!
//! A catalog is an ordered sequence of [`LevelConfig`] records. The built-in
//! campaign ships with the crate; an alternative catalog can be loaded from a
//! TOML file whose schema mirrors the config types below. The core only ever
//! reads catalog data.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use join_circuit_core::{JoinType, NodeColor, RequiredConnection, TableId};

const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// Table source a player may spawn onto the canvas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    /// Catalog identifier referenced by required connections.
    pub id: TableId,
    /// Display label rendered at the node's center.
    pub label: String,
    /// Appearance assigned to nodes spawned from this source.
    pub color: NodeColor,
}

/// Definition of a single puzzle level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level number shown in the guide panel.
    pub id: u32,
    /// Level title shown in the guide panel.
    pub title: String,
    /// Teaching text describing the target query.
    pub description: String,
    /// Table sources available for placement.
    pub available_tables: Vec<TableSource>,
    /// Target solution the player's graph must reproduce.
    pub required_connections: Vec<RequiredConnection>,
    /// Forces source/target order to matter even for symmetric joins.
    #[serde(default)]
    pub strict_direction: bool,
}

impl LevelConfig {
    /// Looks up an available table source by its identifier.
    #[must_use]
    pub fn source(&self, id: &TableId) -> Option<&TableSource> {
        self.available_tables.iter().find(|table| &table.id == id)
    }
}

/// Ordered, validated collection of levels.
#[derive(Clone, Debug)]
pub struct Catalog {
    levels: Vec<LevelConfig>,
}

impl Catalog {
    /// Returns the built-in campaign shipped with the game.
    #[must_use]
    pub fn built_in() -> Self {
        Self {
            levels: built_in_levels(),
        }
    }

    /// Parses and validates a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        if file.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                version: file.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }
        Self::from_levels(file.levels)
    }

    /// Loads and validates a catalog from a TOML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validates an explicit level list.
    pub fn from_levels(levels: Vec<LevelConfig>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }
        for level in &levels {
            for requirement in &level.required_connections {
                if requirement.source == requirement.target {
                    return Err(CatalogError::SelfRequirement {
                        title: level.title.clone(),
                        table: requirement.source.clone(),
                    });
                }
                for endpoint in [&requirement.source, &requirement.target] {
                    if level.source(endpoint).is_none() {
                        return Err(CatalogError::UnknownRequiredTable {
                            title: level.title.clone(),
                            table: endpoint.clone(),
                        });
                    }
                }
            }
        }
        Ok(Self { levels })
    }

    /// Retrieves the level at the provided zero-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LevelConfig> {
        self.levels.get(index)
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the catalog holds no levels.
    ///
    /// Validation rejects empty catalogs, so this is only ever `false` for a
    /// constructed catalog; the accessor exists for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the level that follows the provided one.
    ///
    /// Advancing past the final level wraps back to the first.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        (index + 1) % self.levels.len()
    }

    /// Iterator over the levels in campaign order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.iter()
    }
}

/// Errors that can occur while loading a level catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read from disk.
    #[error("failed to read level catalog at {path}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog file is not valid TOML for the expected schema.
    #[error("failed to parse level catalog")]
    Parse(#[from] toml::de::Error),
    /// The catalog declares a schema version this build does not understand.
    #[error("unsupported catalog version {version}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the file.
        version: u32,
        /// Version this build supports.
        expected: u32,
    },
    /// The catalog contains no levels.
    #[error("level catalog contains no levels")]
    Empty,
    /// A required connection references a table the level does not offer.
    #[error("level `{title}` requires unavailable table `{table}`")]
    UnknownRequiredTable {
        /// Title of the offending level.
        title: String,
        /// Identifier that failed to resolve.
        table: TableId,
    },
    /// A required connection loops a table back onto itself.
    #[error("level `{title}` requires a self connection on `{table}`")]
    SelfRequirement {
        /// Title of the offending level.
        title: String,
        /// Identifier used for both endpoints.
        table: TableId,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    levels: Vec<LevelConfig>,
}

fn source(id: &str, label: &str, color: NodeColor) -> TableSource {
    TableSource {
        id: TableId::new(id),
        label: label.to_owned(),
        color,
    }
}

fn requirement(source: &str, target: &str, join_type: JoinType) -> RequiredConnection {
    RequiredConnection {
        source: TableId::new(source),
        target: TableId::new(target),
        join_type,
    }
}

fn built_in_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig {
            id: 1,
            title: "The Intersection".to_owned(),
            description: "Find users who have placed an order. Connect Users to Orders \
                          using an Inner Join."
                .to_owned(),
            available_tables: vec![
                source("users", "Users", NodeColor::from_rgb(0x0e, 0xa5, 0xe9)),
                source("orders", "Orders", NodeColor::from_rgb(0xf5, 0x9e, 0x0b)),
            ],
            required_connections: vec![requirement("users", "orders", JoinType::Inner)],
            strict_direction: false,
        },
        LevelConfig {
            id: 2,
            title: "No Order Left Behind".to_owned(),
            description: "List ALL users, and their orders if they have any. Use a Left \
                          Join from Users to Orders."
                .to_owned(),
            available_tables: vec![
                source("users", "Users", NodeColor::from_rgb(0x0e, 0xa5, 0xe9)),
                source("orders", "Orders", NodeColor::from_rgb(0xf5, 0x9e, 0x0b)),
            ],
            required_connections: vec![requirement("users", "orders", JoinType::Left)],
            strict_direction: true,
        },
        LevelConfig {
            id: 3,
            title: "Global Supply Chain".to_owned(),
            description: "Find Products in Orders that were shipped to 'Paris'. Connect \
                          Products -> Orders -> Cities(Paris). All connections must be \
                          exclusive (Inner)."
                .to_owned(),
            available_tables: vec![
                source("products", "Products", NodeColor::from_rgb(0x10, 0xb9, 0x81)),
                source("orders", "Orders", NodeColor::from_rgb(0xf5, 0x9e, 0x0b)),
                source("cities", "Cities (Paris)", NodeColor::from_rgb(0x8b, 0x5c, 0xf6)),
            ],
            required_connections: vec![
                requirement("products", "orders", JoinType::Inner),
                requirement("orders", "cities", JoinType::Inner),
            ],
            strict_direction: false,
        },
        LevelConfig {
            id: 4,
            title: "Data Integrity Check".to_owned(),
            description: "Identify mismatched records between Legacy and New Systems \
                          using a Full Outer Join."
                .to_owned(),
            available_tables: vec![
                source("legacy", "Legacy DB", NodeColor::from_rgb(0x64, 0x74, 0x8b)),
                source("new", "New Cloud", NodeColor::from_rgb(0x38, 0xbd, 0xf8)),
            ],
            required_connections: vec![requirement("legacy", "new", JoinType::Full)],
            strict_direction: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_campaign_matches_expected_shape() {
        let catalog = Catalog::built_in();

        assert_eq!(catalog.len(), 4);
        let titles: Vec<&str> = catalog.iter().map(|level| level.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "The Intersection",
                "No Order Left Behind",
                "Global Supply Chain",
                "Data Integrity Check",
            ]
        );

        let strict: Vec<bool> = catalog.iter().map(|level| level.strict_direction).collect();
        assert_eq!(strict, vec![false, true, false, false]);

        let supply_chain = catalog.get(2).expect("third level exists");
        assert_eq!(supply_chain.required_connections.len(), 2);
    }

    #[test]
    fn built_in_campaign_passes_validation() {
        let levels = built_in_levels();
        assert!(Catalog::from_levels(levels).is_ok());
    }

    #[test]
    fn next_index_wraps_to_the_first_level() {
        let catalog = Catalog::built_in();
        assert_eq!(catalog.next_index(0), 1);
        assert_eq!(catalog.next_index(3), 0);
    }

    #[test]
    fn parses_catalog_from_toml() {
        let contents = r##"
            version = 1

            [[levels]]
            id = 1
            title = "Warmup"
            description = "Connect the two tables."
            strict_direction = true

            [[levels.available_tables]]
            id = "users"
            label = "Users"
            color = "#0ea5e9"

            [[levels.available_tables]]
            id = "orders"
            label = "Orders"
            color = "#f59e0b"

            [[levels.required_connections]]
            source = "users"
            target = "orders"
            join_type = "LEFT"
        "##;

        let catalog = Catalog::from_toml_str(contents).expect("valid catalog");
        let level = catalog.get(0).expect("one level");

        assert_eq!(level.title, "Warmup");
        assert!(level.strict_direction);
        assert_eq!(level.required_connections[0].join_type, JoinType::Left);
        assert_eq!(
            level.source(&TableId::new("users")).map(|s| s.label.as_str()),
            Some("Users")
        );
    }

    #[test]
    fn rejects_unsupported_catalog_version() {
        let contents = "version = 9\nlevels = []\n";
        assert!(matches!(
            Catalog::from_toml_str(contents),
            Err(CatalogError::UnsupportedVersion {
                version: 9,
                expected: 1,
            })
        ));
    }

    #[test]
    fn rejects_empty_catalogs() {
        let contents = "version = 1\nlevels = []\n";
        assert!(matches!(
            Catalog::from_toml_str(contents),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn rejects_requirements_on_unavailable_tables() {
        let mut levels = built_in_levels();
        levels[0]
            .required_connections
            .push(RequiredConnection {
                source: TableId::new("users"),
                target: TableId::new("ghost"),
                join_type: JoinType::Inner,
            });

        assert!(matches!(
            Catalog::from_levels(levels),
            Err(CatalogError::UnknownRequiredTable { .. })
        ));
    }

    #[test]
    fn rejects_self_looping_requirements() {
        let mut levels = built_in_levels();
        levels[0].required_connections[0].target = TableId::new("users");

        assert!(matches!(
            Catalog::from_levels(levels),
            Err(CatalogError::SelfRequirement { .. })
        ));
    }
}
