use crate::filters::{sort_properties, SortKey};
use crate::schema::{CanonicalProperty, PropertyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate figures over a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub property_count: usize,
    pub total_value: f64,
    pub average_price: f64,
    pub average_roi: f64,
    pub total_cash_flow: f64,
    pub average_cap_rate: f64,
    pub total_monthly_rent: f64,
    /// Record count per property-type label.
    pub type_distribution: BTreeMap<String, usize>,
    /// Ids of the best records by ROI, highest first.
    pub top_roi: Vec<String>,
    /// Ids of the best records by monthly cash flow, highest first.
    pub top_cash_flow: Vec<String>,
}

impl PortfolioSummary {
    pub fn from_properties(properties: &[CanonicalProperty], top_n: usize) -> Self {
        let count = properties.len();
        let average = |total: f64| if count > 0 { total / count as f64 } else { 0.0 };

        let total_value: f64 = properties.iter().map(|p| p.price).sum();
        let total_roi: f64 = properties.iter().map(|p| p.metrics.roi).sum();
        let total_cap_rate: f64 = properties.iter().map(|p| p.metrics.cap_rate).sum();
        let total_cash_flow: f64 = properties.iter().map(|p| p.metrics.cash_flow).sum();
        let total_monthly_rent: f64 = properties.iter().map(|p| p.monthly_rent).sum();

        let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for property in properties {
            *type_distribution
                .entry(property.property_type.label().to_string())
                .or_default() += 1;
        }

        Self {
            property_count: count,
            total_value,
            average_price: average(total_value),
            average_roi: average(total_roi),
            total_cash_flow,
            average_cap_rate: average(total_cap_rate),
            total_monthly_rent,
            type_distribution,
            top_roi: top_ids(properties, SortKey::Roi, top_n),
            top_cash_flow: top_ids(properties, SortKey::CashFlow, top_n),
        }
    }

    pub fn count_of(&self, property_type: PropertyType) -> usize {
        self.type_distribution
            .get(property_type.label())
            .copied()
            .unwrap_or(0)
    }
}

fn top_ids(properties: &[CanonicalProperty], key: SortKey, n: usize) -> Vec<String> {
    let mut ranked: Vec<&CanonicalProperty> = properties.iter().collect();
    sort_properties(&mut ranked, key);
    ranked.into_iter().take(n).map(|p| p.id.clone()).collect()
}
