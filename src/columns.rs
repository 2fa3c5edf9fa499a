//! Column resolution: mapping arbitrary source headers onto canonical fields.
//!
//! Every header is normalized (trimmed, quotes stripped, lower-cased) before
//! comparison. Candidates are tried in priority order and the first candidate
//! that matches any header wins; among headers matching the same candidate,
//! the earliest header in source order wins. Duplicate headers therefore
//! resolve to their first occurrence.

use crate::ingestion::RawRow;
use crate::schema::CanonicalField;
use crate::utils::normalize_header;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in a ranked candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Header text contains the fragment.
    Contains(&'static str),
    /// Header text equals the fragment. Used for short abbreviations like "st"
    /// and for fragments that also appear inside ratio or area headers.
    Exact(&'static str),
}

impl NameMatch {
    fn matches(&self, normalized_header: &str) -> bool {
        match self {
            NameMatch::Contains(fragment) => normalized_header.contains(fragment),
            NameMatch::Exact(name) => normalized_header == *name,
        }
    }
}

use NameMatch::{Contains, Exact};

/// Monetary proxies for price, in the order they are trusted.
pub const PRICE_CANDIDATES: &[NameMatch] = &[
    Contains("last_sale_price"),
    Contains("sale_price"),
    Contains("est_equity"),
    Contains("total_assessed_value"),
    Contains("assessed_value"),
    Contains("market_value"),
    Contains("list_price"),
    Exact("price"),
];

/// Columns inspected, in order, when classifying the property type.
pub const PROPERTY_TYPE_CANDIDATES: &[NameMatch] = &[
    Contains("property_type"),
    Contains("property_description"),
    Contains("type"),
    Contains("description"),
];

/// Ranked candidate names for each resolver-driven canonical field.
pub fn candidates(field: CanonicalField) -> &'static [NameMatch] {
    match field {
        CanonicalField::Address => &[
            Contains("address"),
            Contains("property_address"),
            Contains("street_address"),
            Contains("street"),
            Contains("addr"),
        ],
        CanonicalField::City => &[Contains("city"), Contains("municipality"), Contains("town")],
        CanonicalField::State => &[Contains("state"), Contains("province"), Exact("st")],
        CanonicalField::ZipCode => &[
            Contains("zip"),
            Contains("zipcode"),
            Contains("postal_code"),
            Contains("zip_code"),
            Contains("postal"),
        ],
        CanonicalField::Bedrooms => &[
            Contains("bedrooms"),
            Contains("bedroom_count"),
            Contains("beds"),
            Contains("bed"),
        ],
        CanonicalField::Bathrooms => &[
            Contains("bathrooms"),
            Contains("bathroom_count"),
            Contains("baths"),
            Contains("bath"),
        ],
        CanonicalField::SquareFeet => &[
            Contains("living_sqft"),
            Exact("sqft"),
            Contains("living_area"),
            Contains("square_feet"),
            Contains("total_sqft"),
            Contains("square_footage"),
            Contains("sq_ft"),
        ],
        CanonicalField::LotSize => &[
            Contains("lot_size"),
            Contains("lot_sqft"),
            Contains("lot_acres"),
            Exact("lot"),
        ],
        CanonicalField::YearBuilt => &[
            Contains("built_year"),
            Contains("year_built"),
            Contains("construction_year"),
            Contains("yearbuilt"),
        ],
        CanonicalField::MonthlyRent => &[
            Contains("monthly_rent"),
            Contains("rent_estimate"),
            Contains("market_rent"),
            Contains("rent_amount"),
        ],
        CanonicalField::YearlyTaxes => &[
            Contains("tax_amount"),
            Contains("taxes"),
            Contains("property_tax"),
            Contains("annual_tax"),
        ],
        CanonicalField::YearlyInsurance => &[Contains("yearly_insurance"), Contains("insurance")],
        CanonicalField::Maintenance => &[Contains("maintenance")],
        CanonicalField::VacancyRate => &[Contains("vacancy")],
        CanonicalField::Description => &[
            Contains("description"),
            Contains("remarks"),
            Contains("notes"),
        ],
        CanonicalField::ImageUrl => &[Contains("image_url"), Contains("image"), Contains("photo")],
    }
}

/// A header chosen for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    /// Position of the header in the source header row.
    pub index: usize,
    /// Header text as it appeared in the source.
    pub header: String,
}

/// Returns the first header matching the highest-priority candidate, or
/// `None` when no header matches any candidate.
pub fn find_best_match(headers: &[String], candidates: &[NameMatch]) -> Option<ResolvedColumn> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    candidates.iter().find_map(|candidate| {
        normalized
            .iter()
            .position(|h| !h.is_empty() && candidate.matches(h))
            .map(|index| ResolvedColumn {
                index,
                header: headers[index].trim().to_string(),
            })
    })
}

/// Header resolution for one batch. Built once, reused for every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    fields: BTreeMap<CanonicalField, Option<ResolvedColumn>>,
    /// Price proxy columns present in this batch, in priority order.
    price_columns: Vec<ResolvedColumn>,
    /// Type/description columns present in this batch, in priority order.
    type_columns: Vec<ResolvedColumn>,
}

impl ColumnMapping {
    pub fn resolve(headers: &[String]) -> Self {
        let fields = CanonicalField::ALL
            .iter()
            .map(|field| (*field, find_best_match(headers, candidates(*field))))
            .collect();

        Self {
            fields,
            price_columns: resolve_each(headers, PRICE_CANDIDATES),
            type_columns: resolve_each(headers, PROPERTY_TYPE_CANDIDATES),
        }
    }

    pub fn column(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        self.fields.get(&field).and_then(|c| c.as_ref())
    }

    /// The trimmed, non-empty cell for `field` in `row`.
    pub fn cell<'r>(&self, row: &'r RawRow, field: CanonicalField) -> Option<&'r str> {
        self.column(field).and_then(|c| row.get(c.index))
    }

    pub fn price_columns(&self) -> &[ResolvedColumn] {
        &self.price_columns
    }

    pub fn type_columns(&self) -> &[ResolvedColumn] {
        &self.type_columns
    }

    /// `(field, header or "NOT FOUND")` pairs in canonical field order.
    pub fn report(&self) -> Vec<(CanonicalField, String)> {
        CanonicalField::ALL
            .iter()
            .map(|field| {
                let header = self
                    .column(*field)
                    .map(|c| c.header.clone())
                    .unwrap_or_else(|| "NOT FOUND".to_string());
                (*field, header)
            })
            .collect()
    }
}

/// Resolves every candidate independently, dropping misses and keeping each
/// source column at most once.
fn resolve_each(headers: &[String], list: &[NameMatch]) -> Vec<ResolvedColumn> {
    let mut resolved: Vec<ResolvedColumn> = Vec::new();
    for candidate in list {
        if let Some(column) = find_best_match(headers, std::slice::from_ref(candidate)) {
            if !resolved.iter().any(|c| c.index == column.index) {
                resolved.push(column);
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_best_match_priority_order() {
        let h = headers(&["street_address", "property_address", "Address"]);
        let found = find_best_match(&h, candidates(CanonicalField::Address)).unwrap();
        // "address" is the first candidate and every header contains it; the first header wins.
        assert_eq!(found.index, 0);
        assert_eq!(found.header, "street_address");
    }

    #[test]
    fn test_find_best_match_candidate_beats_header_order() {
        let h = headers(&["Municipality", "City"]);
        let found = find_best_match(&h, candidates(CanonicalField::City)).unwrap();
        assert_eq!(found.header, "City");
    }

    #[test]
    fn test_find_best_match_normalizes_headers() {
        let h = headers(&["  \"ZIP Code\" ", "other"]);
        let found = find_best_match(&h, candidates(CanonicalField::ZipCode)).unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn test_find_best_match_not_found() {
        let h = headers(&["foo", "bar"]);
        assert_eq!(find_best_match(&h, candidates(CanonicalField::City)), None);
        assert_eq!(find_best_match(&[], candidates(CanonicalField::City)), None);
    }

    #[test]
    fn test_duplicate_headers_resolve_to_first() {
        let h = headers(&["city", "City", "CITY"]);
        let found = find_best_match(&h, candidates(CanonicalField::City)).unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn test_exact_candidates_do_not_capture_longer_headers() {
        let h = headers(&["Street Addr", "Town", "last_sale_price"]);
        assert_eq!(find_best_match(&h, candidates(CanonicalField::State)), None);

        let h = headers(&["Street Addr", "Town", "St", "last_sale_price"]);
        let found = find_best_match(&h, candidates(CanonicalField::State)).unwrap();
        assert_eq!(found.header, "St");
    }

    #[test]
    fn test_price_per_area_headers_are_not_price_or_living_area() {
        let h = headers(&["price_per_sqft", "lot_sqft", "living_area_sqft", "price_change"]);
        let mapping = ColumnMapping::resolve(&h);
        assert!(mapping.price_columns().is_empty());
        assert_eq!(
            mapping.column(CanonicalField::SquareFeet).unwrap().header,
            "living_area_sqft"
        );
        assert_eq!(mapping.column(CanonicalField::LotSize).unwrap().header, "lot_sqft");

        let h = headers(&["list_price", "Price"]);
        let names: Vec<String> = ColumnMapping::resolve(&h)
            .price_columns()
            .iter()
            .map(|c| c.header.clone())
            .collect();
        assert_eq!(names, vec!["list_price", "Price"]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let h = headers(&["Beds", "Bedrooms", "baths", "sqft"]);
        let first = ColumnMapping::resolve(&h);
        for _ in 0..5 {
            assert_eq!(ColumnMapping::resolve(&h), first);
        }
        assert_eq!(first.column(CanonicalField::Bedrooms).unwrap().header, "Bedrooms");
    }

    #[test]
    fn test_mapping_report_marks_missing_fields() {
        let h = headers(&["Street Addr", "Town", "St", "last_sale_price"]);
        let mapping = ColumnMapping::resolve(&h);
        let report: BTreeMap<CanonicalField, String> = mapping.report().into_iter().collect();
        assert_eq!(report[&CanonicalField::Address], "Street Addr");
        assert_eq!(report[&CanonicalField::City], "Town");
        assert_eq!(report[&CanonicalField::State], "St");
        assert_eq!(report[&CanonicalField::ZipCode], "NOT FOUND");
    }

    #[test]
    fn test_price_columns_in_priority_order() {
        let h = headers(&["market_value", "assessed_value", "last_sale_price"]);
        let mapping = ColumnMapping::resolve(&h);
        let names: Vec<&str> = mapping
            .price_columns()
            .iter()
            .map(|c| c.header.as_str())
            .collect();
        assert_eq!(names, vec!["last_sale_price", "assessed_value", "market_value"]);
    }

    #[test]
    fn test_cell_lookup_through_mapping() {
        let h = headers(&["address", "city", "state"]);
        let mapping = ColumnMapping::resolve(&h);
        let row = RawRow::new(vec!["1 A St".into(), "  ".into(), "CA".into()]);
        assert_eq!(mapping.cell(&row, CanonicalField::Address), Some("1 A St"));
        assert_eq!(mapping.cell(&row, CanonicalField::City), None);
        assert_eq!(mapping.cell(&row, CanonicalField::ZipCode), None);
    }
}
