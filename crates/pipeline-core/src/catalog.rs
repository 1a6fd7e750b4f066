use crate::types::{ForecastStage, PrimaryStage, Taxonomy};
use serde::Serialize;

// ---------------------------------------------------------------------------
// StageEntry / Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageEntry {
    pub id: &'static str,
    pub label: &'static str,
}

/// Ordered, static description of one stage taxonomy.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub taxonomy: Taxonomy,
    pub entries: &'static [StageEntry],
}

const fn primary_entry(stage: PrimaryStage) -> StageEntry {
    StageEntry {
        id: stage.as_str(),
        label: stage.label(),
    }
}

const fn forecast_entry(stage: ForecastStage) -> StageEntry {
    StageEntry {
        id: stage.as_str(),
        label: stage.label(),
    }
}

static PRIMARY_ENTRIES: [StageEntry; 6] = [
    primary_entry(PrimaryStage::Sourced),
    primary_entry(PrimaryStage::Nurturing),
    primary_entry(PrimaryStage::Qualified),
    primary_entry(PrimaryStage::InProgress),
    primary_entry(PrimaryStage::Win),
    primary_entry(PrimaryStage::Lost),
];

static FORECAST_ENTRIES: [StageEntry; 3] = [
    forecast_entry(ForecastStage::Source),
    forecast_entry(ForecastStage::HighPriority),
    forecast_entry(ForecastStage::LowPriority),
];

static PRIMARY: Catalog = Catalog {
    taxonomy: Taxonomy::Primary,
    entries: &PRIMARY_ENTRIES,
};

static FORECAST: Catalog = Catalog {
    taxonomy: Taxonomy::Forecast,
    entries: &FORECAST_ENTRIES,
};

/// The catalog for a taxonomy.
pub fn catalog(taxonomy: Taxonomy) -> &'static Catalog {
    match taxonomy {
        Taxonomy::Primary => &PRIMARY,
        Taxonomy::Forecast => &FORECAST,
    }
}

/// Look up a catalog by taxonomy name.
///
/// # Panics
///
/// Panics on an unknown name. Taxonomy names are compiled into the callers;
/// an unknown one is a bug, not input to recover from. Use
/// [`Taxonomy::from_str`](std::str::FromStr) for untrusted input.
pub fn catalog_by_name(name: &str) -> &'static Catalog {
    match name.parse::<Taxonomy>() {
        Ok(taxonomy) => catalog(taxonomy),
        Err(_) => panic!("unknown stage taxonomy '{name}'"),
    }
}

impl Catalog {
    pub fn ids(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|e| e.id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Canonical `'static` form of a stage id, if it belongs to this catalog.
    pub fn resolve(&self, id: &str) -> Option<&'static StageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// First entry; records without a recognized stage land here.
    pub fn default_stage(&self) -> &'static StageEntry {
        &self.entries[0]
    }

    pub fn label_of(&self, id: &str) -> Option<&'static str> {
        self.resolve(id).map(|e| e.label)
    }
}
