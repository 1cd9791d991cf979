//! # Block Registry Module
//!
//! The registry is the static table of [`BlockDef`]s for a session. Block ids stored
//! in chunks are indices into this table.
//!
//! Content is loaded from JSON:
//!
//! ```json
//! {
//!   "materials": ["Opaque", "Water"],
//!   "blocks": [
//!     { "name": "Air", "tiles": [0], "is_transparent": true },
//!     { "name": "Water", "material_index": 1, "tiles": [14], "is_transparent": true }
//!   ]
//! }
//! ```
//!
//! Besides the name lookup, the registry resolves the handful of blocks that world
//! generation and simulation refer to directly ([`CoreBlocks`]). Loading fails if any of
//! them is missing.

use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::Deserialize;
use thiserror::Error;

use super::{BlockDef, BlockId, BlockTypeSize};

/// The content bundled with the crate.
pub const DEFAULT_BLOCKS_JSON: &str = include_str!("../../../../assets/blocks.json");

/// Errors raised while loading block content.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The content file could not be read.
    #[error("failed to read block content: {0}")]
    Io(#[from] std::io::Error),
    /// The content is not valid JSON for the expected schema.
    #[error("failed to parse block content: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two definitions share a name.
    #[error("block name '{0}' is defined more than once")]
    DuplicateName(String),
    /// A block the generator depends on is absent.
    #[error("required block '{0}' is not defined")]
    MissingCoreBlock(&'static str),
    /// A definition has no tile indices.
    #[error("block '{0}' has no tiles")]
    EmptyTiles(String),
    /// A definition points past the end of the material list.
    #[error("block '{block}' uses material {material} but only {available} materials exist")]
    MaterialOutOfRange {
        /// Offending block name.
        block: String,
        /// Requested material index.
        material: usize,
        /// Number of materials loaded.
        available: usize,
    },
    /// More blocks than a grid cell can address.
    #[error("{0} blocks exceed the storable id range")]
    TooManyBlocks(usize),
}

#[derive(Deserialize)]
struct BlockContent {
    #[serde(default)]
    materials: Vec<String>,
    blocks: Vec<BlockDef>,
}

/// Ids of the blocks that generation and simulation reference by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreBlocks {
    /// Empty space
    pub air: BlockId,
    /// Dirt
    pub dirt: BlockId,
    /// Grass-topped dirt
    pub dirt_with_grass: BlockId,
    /// Stone
    pub stone: BlockId,
    /// Unbreakable floor
    pub bedrock: BlockId,
    /// Falls when unsupported
    pub sand: BlockId,
    /// Ore stamped into stone
    pub diamond: BlockId,
    /// Water
    pub water: BlockId,
    /// Tree trunk
    pub oak_bark: BlockId,
    /// Tree canopy
    pub oak_leaves: BlockId,
}

/// Static table of block definitions with a name index.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
    materials: Vec<String>,
    def_indexes: HashMap<String, BlockId>,
    core: CoreBlocks,
}

impl BlockRegistry {
    /// Builds a registry from already-parsed definitions.
    pub fn new(materials: Vec<String>, defs: Vec<BlockDef>) -> Result<Self, RegistryError> {
        if defs.len() > BlockTypeSize::MAX as usize {
            return Err(RegistryError::TooManyBlocks(defs.len()));
        }

        let mut def_indexes = HashMap::with_capacity(defs.len());
        for (idx, def) in defs.iter().enumerate() {
            if def.tiles.is_empty() {
                return Err(RegistryError::EmptyTiles(def.name.clone()));
            }
            if def.material_index >= materials.len() {
                return Err(RegistryError::MaterialOutOfRange {
                    block: def.name.clone(),
                    material: def.material_index,
                    available: materials.len(),
                });
            }
            if def_indexes.insert(def.name.clone(), idx as BlockId).is_some() {
                return Err(RegistryError::DuplicateName(def.name.clone()));
            }
        }

        let require = |name: &'static str| -> Result<BlockId, RegistryError> {
            def_indexes
                .get(name)
                .copied()
                .ok_or(RegistryError::MissingCoreBlock(name))
        };

        let core = CoreBlocks {
            air: require("Air")?,
            dirt: require("Dirt")?,
            dirt_with_grass: require("DirtWithGrass")?,
            stone: require("Stone")?,
            bedrock: require("Bedrock")?,
            sand: require("Sand")?,
            diamond: require("Diamond")?,
            water: require("Water")?,
            oak_bark: require("OakBark")?,
            oak_leaves: require("OakLeaves")?,
        };

        info!(
            "Block registry loaded: {} blocks, {} materials",
            defs.len(),
            materials.len()
        );

        Ok(BlockRegistry {
            defs,
            materials,
            def_indexes,
            core,
        })
    }

    /// Parses a registry from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let content: BlockContent = serde_json::from_str(json)?;
        Self::new(content.materials, content.blocks)
    }

    /// Reads and parses a registry from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Loads the content bundled with the crate.
    pub fn with_default_blocks() -> Result<Self, RegistryError> {
        Self::from_json_str(DEFAULT_BLOCKS_JSON)
    }

    /// Looks up a block id by name. `None` means no such block.
    pub fn find_block_def_by_name(&self, name: &str) -> Option<BlockId> {
        self.def_indexes.get(name).copied()
    }

    /// Gets the definition for a block id.
    ///
    /// # Panics
    /// Panics if `id` is not a registry index. Grids only ever hold registry ids, so
    /// reaching this is a logic error rather than a recoverable condition.
    pub fn def(&self, id: BlockId) -> &BlockDef {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.defs.get(idx))
            .unwrap_or_else(|| panic!("invalid block id {id} (registry holds {})", self.defs.len()))
    }

    /// Returns `true` if `id` is a registry index.
    pub fn contains(&self, id: BlockId) -> bool {
        id >= 0 && (id as usize) < self.defs.len()
    }

    /// The role-resolved core block ids.
    pub fn core(&self) -> &CoreBlocks {
        &self.core
    }

    /// Material names, indexed by [`BlockDef::material_index`].
    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    /// Number of defined blocks.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry holds no blocks. Never true for a successfully loaded registry.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_content_resolves_core_blocks() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let core = registry.core();
        assert_eq!(registry.find_block_def_by_name("Air"), Some(core.air));
        assert_eq!(registry.find_block_def_by_name("Water"), Some(core.water));
        assert!(registry.def(core.water).is_transparent);
        assert!(registry.def(core.sand).uses_gravity);
        assert!(!registry.def(core.stone).uses_gravity);
    }

    #[test]
    fn bundled_materials_are_all_used() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        for material in 0..registry.materials().len() {
            assert!(
                (0..registry.len() as BlockId).any(|id| registry.def(id).material_index == material),
                "material {} has no block",
                registry.materials()[material]
            );
        }
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        assert_eq!(registry.find_block_def_by_name("Obsidian"), None);
        assert_eq!(registry.find_block_def_by_name(""), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let json = r#"{ "materials": ["m"], "blocks": [
            { "name": "Air", "tiles": [0] },
            { "name": "Air", "tiles": [0] }
        ] }"#;
        assert!(matches!(
            BlockRegistry::from_json_str(json),
            Err(RegistryError::DuplicateName(name)) if name == "Air"
        ));
    }

    #[test]
    fn missing_core_block_is_reported() {
        let json = r#"{ "materials": ["m"], "blocks": [ { "name": "Air", "tiles": [0] } ] }"#;
        assert!(matches!(
            BlockRegistry::from_json_str(json),
            Err(RegistryError::MissingCoreBlock("Dirt"))
        ));
    }

    #[test]
    fn material_out_of_range_is_reported() {
        let json = r#"{ "materials": ["m"], "blocks": [
            { "name": "Air", "tiles": [0], "material_index": 3 }
        ] }"#;
        assert!(matches!(
            BlockRegistry::from_json_str(json),
            Err(RegistryError::MaterialOutOfRange { material: 3, available: 1, .. })
        ));
    }

    #[test]
    fn empty_tiles_are_rejected() {
        let json = r#"{ "materials": ["m"], "blocks": [ { "name": "Air", "tiles": [] } ] }"#;
        assert!(matches!(
            BlockRegistry::from_json_str(json),
            Err(RegistryError::EmptyTiles(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            BlockRegistry::from_json_str("{ not json"),
            Err(RegistryError::Parse(_))
        ));
    }

    #[test]
    #[should_panic(expected = "invalid block id")]
    fn invalid_id_is_fatal() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        registry.def(registry.len() as BlockId);
    }
}
