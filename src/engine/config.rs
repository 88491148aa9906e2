//! Purpose: Construction-time configuration for engine drivers.
//! Exports: `EngineConfig`, `Algorithm`.
//! Role: Carries the storage location, algorithm choice and request limits.
//! Invariants: Unknown algorithm names resolve to MLD.
//! Invariants: Limits left as `None` mean "no limit".
use std::path::PathBuf;

use crate::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Algorithm {
    /// Contraction hierarchies.
    Ch,
    /// Multi-level Dijkstra.
    #[default]
    Mld,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Self {
        match name {
            "CH" => Algorithm::Ch,
            _ => Algorithm::Mld,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Ch => "CH",
            Algorithm::Mld => "MLD",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub storage_path: PathBuf,
    pub algorithm: Algorithm,
    pub use_shared_memory: bool,
    pub max_locations_trip: Option<usize>,
    pub max_locations_viaroute: Option<usize>,
    pub max_locations_distance_table: Option<usize>,
    pub max_locations_map_matching: Option<usize>,
    pub max_results_nearest: Option<u64>,
    pub max_alternatives: usize,
}

impl EngineConfig {
    pub fn new(storage_path: impl Into<PathBuf>, algorithm: Algorithm) -> Self {
        Self {
            storage_path: storage_path.into(),
            algorithm,
            use_shared_memory: false,
            max_locations_trip: None,
            max_locations_viaroute: None,
            max_locations_distance_table: None,
            max_locations_map_matching: None,
            max_results_nearest: None,
            max_alternatives: 3,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("storage path is empty")
                .with_field("base_path"));
        }
        if self.use_shared_memory {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("shared memory datasets are not supported"));
        }
        Ok(())
    }
}
