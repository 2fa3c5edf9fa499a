use crate::schema::{CanonicalProperty, PropertyType};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Optional predicates over canonical records. A record passes when it
/// satisfies every predicate that is present; absent predicates never exclude.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilters {
    /// Case-insensitive substring over address, city, state and zip. Blank means absent.
    pub search: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<f64>,
    pub min_roi: Option<f64>,
    pub min_cash_flow: Option<f64>,
}

impl PropertyFilters {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.property_type.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.min_bathrooms.is_none()
            && self.min_roi.is_none()
            && self.min_cash_flow.is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, property: &CanonicalProperty) -> bool {
        if let Some(term) = self.search_term() {
            if !property.search_text().contains(&term) {
                return false;
            }
        }

        if let Some(wanted) = self.property_type {
            if property.property_type != wanted {
                return false;
            }
        }

        let at_least = |bound: Option<f64>, value: f64| bound.map_or(true, |b| value >= b);

        at_least(self.min_price, property.price)
            && self.max_price.map_or(true, |max| property.price <= max)
            && self
                .min_bedrooms
                .map_or(true, |min| property.bedrooms >= min)
            && at_least(self.min_bathrooms, property.bathrooms)
            && at_least(self.min_roi, property.metrics.roi)
            && at_least(self.min_cash_flow, property.metrics.cash_flow)
    }
}

/// Keeps the records that pass `filters`, preserving collection order.
pub fn apply_filters<'a>(
    properties: &'a [CanonicalProperty],
    filters: &PropertyFilters,
) -> Vec<&'a CanonicalProperty> {
    properties.iter().filter(|p| filters.matches(p)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Price,
    Roi,
    CashFlow,
    CapRate,
    Bedrooms,
    Bathrooms,
}

impl SortKey {
    pub fn value(&self, property: &CanonicalProperty) -> f64 {
        match self {
            SortKey::Price => property.price,
            SortKey::Roi => property.metrics.roi,
            SortKey::CashFlow => property.metrics.cash_flow,
            SortKey::CapRate => property.metrics.cap_rate,
            SortKey::Bedrooms => f64::from(property.bedrooms),
            SortKey::Bathrooms => property.bathrooms,
        }
    }
}

/// Orders records highest first by `key`. Stable: equal keys keep their relative order.
pub fn sort_properties<P: Borrow<CanonicalProperty>>(properties: &mut [P], key: SortKey) {
    let value = |p: &P| key.value(Borrow::<CanonicalProperty>::borrow(p));
    properties.sort_by(|a, b| value(b).total_cmp(&value(a)));
}
