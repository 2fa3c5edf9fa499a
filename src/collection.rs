use crate::filters::{apply_filters, sort_properties, PropertyFilters, SortKey};
use crate::schema::CanonicalProperty;
use crate::transformer::BatchResult;
use log::info;

/// The currently published record set.
///
/// Each completed ingestion replaces the previous records wholesale; there is
/// no merge. Views are computed on demand and never reorder the stored records.
#[derive(Debug, Clone, Default)]
pub struct PropertyCollection {
    properties: Vec<CanonicalProperty>,
    generation: u64,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the records of a finished batch, discarding the previous set.
    pub fn replace_with(&mut self, batch: &BatchResult) {
        self.replace_properties(batch.properties.clone());
    }

    pub fn replace_properties(&mut self, properties: Vec<CanonicalProperty>) {
        self.generation += 1;
        info!(
            "Publishing {} properties (generation {})",
            properties.len(),
            self.generation
        );
        self.properties = properties;
    }

    pub fn properties(&self) -> &[CanonicalProperty] {
        &self.properties
    }

    /// Number of completed replacements since creation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalProperty> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Filters, then orders the filtered set when a sort key is given.
    pub fn view(
        &self,
        filters: &PropertyFilters,
        sort: Option<SortKey>,
    ) -> Vec<&CanonicalProperty> {
        let mut selected = apply_filters(&self.properties, filters);
        if let Some(key) = sort {
            sort_properties(&mut selected, key);
        }
        selected
    }
}
