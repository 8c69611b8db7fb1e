//! Static reference data shared by every session, and its validation errors.

use thiserror::Error;

use crate::faction::FactionCatalog;
use crate::region::RegionCatalog;

/// Errors raised when catalog data violates its invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {catalog} catalog: {source}")]
    Parse {
        catalog: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {catalog} id `{id}`")]
    DuplicateId { catalog: &'static str, id: String },
    #[error("{field} of `{id}` must be between 0.00 and 1.00 (got {value:.2})")]
    ProbabilityOutOfRange {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("{field} of `{id}` must be positive (got {value:.2})")]
    InvalidMultiplier {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("weight `{key}` of `{id}` must be a non-negative number (got {value})")]
    InvalidWeight { id: String, key: String, value: f64 },
    #[error("faction `{id}` defines {count} reputation labels, expected 7")]
    ReputationLabels { id: String, count: usize },
    #[error("region `{region}` refers to unknown faction `{faction}`")]
    UnknownFaction { region: String, faction: String },
}

/// Validate that `value` is a probability, reporting `field` of `id` otherwise.
pub(crate) fn check_probability(
    id: &str,
    field: &'static str,
    value: f64,
) -> Result<(), CatalogError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::ProbabilityOutOfRange {
            id: id.to_string(),
            field,
            value,
        })
    }
}

pub(crate) fn check_weight(id: &str, key: &str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidWeight {
            id: id.to_string(),
            key: key.to_string(),
            value,
        })
    }
}

/// Region and faction catalogs, validated against each other.
///
/// Read-only after construction, so one instance can back many sessions.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub regions: RegionCatalog,
    pub factions: FactionCatalog,
}

impl Catalogs {
    /// Pair two catalogs, rejecting regions whose default faction is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownFaction`] for a dangling faction reference.
    pub fn new(regions: RegionCatalog, factions: FactionCatalog) -> Result<Self, CatalogError> {
        for region in regions.iter() {
            if let Some(faction) = region.default_faction.as_deref()
                && factions.get(faction).is_none()
            {
                return Err(CatalogError::UnknownFaction {
                    region: region.id.clone(),
                    faction: faction.to_string(),
                });
            }
        }
        Ok(Self { regions, factions })
    }

    /// Parse both catalogs from JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if either document fails to parse or validate.
    pub fn from_json(regions_json: &str, factions_json: &str) -> Result<Self, CatalogError> {
        let regions = RegionCatalog::from_json(regions_json)?;
        let factions = FactionCatalog::from_json(factions_json)?;
        Self::new(regions, factions)
    }

    /// Catalogs embedded in the crate, cross-validated like loaded ones.
    #[must_use]
    pub fn default_catalogs() -> Self {
        Self::validated_or_empty(
            RegionCatalog::default_catalog(),
            FactionCatalog::default_catalog(),
        )
    }

    fn validated_or_empty(regions: RegionCatalog, factions: FactionCatalog) -> Self {
        Self::new(regions, factions).unwrap_or_else(|err| {
            log::error!("embedded catalogs are inconsistent: {err}");
            Self {
                regions: RegionCatalog::default(),
                factions: FactionCatalog::default(),
            }
        })
    }
}
