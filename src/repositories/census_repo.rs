use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::models::base::{Base, Continent, FacilityId};

/// Bases per continent, loaded once from the census file.
pub struct CensusRepo {
    continents: HashMap<Continent, Vec<Base>>,
}

impl CensusRepo {
    pub fn new(continents: HashMap<Continent, Vec<Base>>) -> Self {
        Self { continents }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let continents: HashMap<Continent, Vec<Base>> =
            serde_json::from_str(raw).context("Census file is not a continent to bases map")?;

        for continent in Continent::ALL {
            if !continents.contains_key(&continent) {
                warn!("Census has no bases for {}", continent);
            }
        }

        Ok(Self::new(continents))
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read census file {}", path.display()))?;
        let census = Self::from_json(&raw)?;
        info!(
            "Loaded census with {} bases from {}",
            census.continents.values().map(Vec::len).sum::<usize>(),
            path.display()
        );
        Ok(census)
    }

    pub fn continent_bases(&self, continent: Continent) -> &[Base] {
        self.continents
            .get(&continent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Known bases among `ids`, in the order given. Unknown ids are skipped.
    pub fn bases_by_ids(&self, ids: &[FacilityId]) -> Vec<Base> {
        ids.iter()
            .filter_map(|id| {
                self.continents
                    .values()
                    .flatten()
                    .find(|base| base.id == *id)
                    .cloned()
            })
            .collect()
    }
}
