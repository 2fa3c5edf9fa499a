use crate::columns::{ColumnMapping, ResolvedColumn};
use crate::config::PipelineConfig;
use crate::estimator::FieldEstimator;
use crate::export::EXPORT_COLUMNS;
use crate::ingestion::{RawRow, RawTable};
use crate::metrics::calculate_metrics;
use crate::schema::{CanonicalField, CanonicalProperty, FieldProvenance, PropertyType};
use crate::utils::percent_of;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source row that was left out of the output, with a 1-indexed row number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationError {
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for TransformationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Transformed(Box<CanonicalProperty>),
    Skipped(TransformationError),
}

/// Estimation reasoning for one transformed row, as shown in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowReasoning {
    pub row: usize,
    pub price: f64,
    pub price_source: String,
    pub property_type: PropertyType,
    pub monthly_rent: f64,
    pub rent_percent_of_price: f64,
    pub vacancy_rate: f64,
}

impl RowReasoning {
    fn from_property(row: usize, property: &CanonicalProperty) -> Self {
        Self {
            row,
            price: property.price,
            price_source: property.provenance.price.describe(),
            property_type: property.property_type,
            monthly_rent: property.monthly_rent,
            rent_percent_of_price: percent_of(property.monthly_rent, property.price),
            vacancy_rate: property.vacancy_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub properties: Vec<CanonicalProperty>,
    pub errors: Vec<TransformationError>,
    /// `(field, header or "NOT FOUND")` for every resolver-driven field.
    pub column_report: Vec<(CanonicalField, String)>,
    pub samples: Vec<RowReasoning>,
    pub summary: String,
    pub rows_in: usize,
    pub columns_in: usize,
    pub processed_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn rows_out(&self) -> usize {
        self.properties.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty() && !self.properties.is_empty()
    }
}

/// Turns source rows into canonical records, one row at a time.
pub struct RecordTransformer<'a> {
    config: &'a PipelineConfig,
    estimator: FieldEstimator<'a>,
}

impl<'a> RecordTransformer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            estimator: FieldEstimator::new(&config.estimation),
        }
    }

    /// Transforms one row. `row_number` is 1-indexed in source order.
    pub fn transform_row(
        &self,
        row_number: usize,
        row: &RawRow,
        mapping: &ColumnMapping,
    ) -> RowOutcome {
        let address = mapping.cell(row, CanonicalField::Address);
        let city = mapping.cell(row, CanonicalField::City);
        let state = mapping.cell(row, CanonicalField::State);

        let (address, city, state) = match (address, city, state) {
            (Some(a), Some(c), Some(s)) => (a, c, s),
            _ => {
                let missing: Vec<&str> = [
                    ("address", address),
                    ("city", city),
                    ("state", state),
                ]
                .iter()
                .filter(|(_, v)| v.is_none())
                .map(|(name, _)| *name)
                .collect();

                return RowOutcome::Skipped(TransformationError {
                    row: row_number,
                    reason: format!(
                        "Missing critical address information ({})",
                        missing.join(", ")
                    ),
                });
            }
        };

        let est = &self.estimator;
        let price = est.estimate_price(row, mapping);
        let property_type = est.determine_property_type(row, mapping);
        let rent = est.resolve_rent(row, mapping, price.value, property_type);
        let vacancy = est.resolve_vacancy(row, mapping, property_type);
        let taxes = est.resolve_yearly_amount(row, mapping, CanonicalField::YearlyTaxes, price.value);
        let insurance =
            est.resolve_yearly_amount(row, mapping, CanonicalField::YearlyInsurance, price.value);
        let maintenance =
            est.resolve_yearly_amount(row, mapping, CanonicalField::Maintenance, price.value);

        let metrics = calculate_metrics(
            price.value,
            rent.value,
            self.config.estimation.default_price,
            &self.config.metrics,
        );

        RowOutcome::Transformed(Box::new(CanonicalProperty {
            id: format!("property-{}", row_number),
            address: address.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip_code: mapping
                .cell(row, CanonicalField::ZipCode)
                .unwrap_or_default()
                .to_string(),
            bedrooms: est.bedrooms(row, mapping),
            bathrooms: est.bathrooms(row, mapping),
            square_feet: est.square_feet(row, mapping),
            lot_size: est.lot_size(row, mapping),
            year_built: est.year_built(row, mapping),
            property_type,
            price: price.value,
            monthly_rent: rent.value,
            yearly_taxes: taxes.value,
            yearly_insurance: insurance.value,
            yearly_maintenance: maintenance.value,
            vacancy_rate: vacancy.value,
            metrics,
            description: mapping
                .cell(row, CanonicalField::Description)
                .map(str::to_string),
            image_url: mapping
                .cell(row, CanonicalField::ImageUrl)
                .map(str::to_string),
            provenance: FieldProvenance {
                price: price.origin,
                monthly_rent: rent.origin,
                vacancy_rate: vacancy.origin,
                yearly_taxes: taxes.origin,
                yearly_insurance: insurance.origin,
                yearly_maintenance: maintenance.origin,
            },
        }))
    }

    /// Transforms a whole table. Row failures are collected, never fatal.
    pub fn transform_table(&self, table: &RawTable) -> BatchResult {
        let mapping = ColumnMapping::resolve(&table.headers);
        for (field, header) in mapping.report() {
            debug!("Column mapping {} -> {}", field, header);
        }

        let mut properties = Vec::new();
        let mut errors = Vec::new();
        let mut samples = Vec::new();

        for (index, row) in table.rows.iter().enumerate() {
            let row_number = index + 1;

            let outcome = match row {
                Ok(row) => self.transform_row(row_number, row, &mapping),
                Err(reason) => RowOutcome::Skipped(TransformationError {
                    row: row_number,
                    reason: reason.clone(),
                }),
            };

            match outcome {
                RowOutcome::Transformed(property) => {
                    if index < self.config.summary_sample_rows {
                        samples.push(RowReasoning::from_property(row_number, &property));
                    }
                    properties.push(*property);
                }
                RowOutcome::Skipped(error) => {
                    warn!("Skipping {}", error);
                    errors.push(error);
                }
            }
        }

        info!(
            "Transformed {} of {} rows ({} errors)",
            properties.len(),
            table.rows.len(),
            errors.len()
        );

        let column_report = mapping.report();
        let mut result = BatchResult {
            properties,
            errors,
            column_report,
            samples,
            summary: String::new(),
            rows_in: table.rows.len(),
            columns_in: table.headers.len(),
            processed_at: Utc::now(),
        };
        result.summary = build_summary(&result, &mapping, self.config);
        result
    }
}

/// Renders the human-readable transformation report.
pub fn build_summary(
    result: &BatchResult,
    mapping: &ColumnMapping,
    config: &PipelineConfig,
) -> String {
    let est = &config.estimation;
    let mut lines: Vec<String> = vec![
        "TRANSFORMATION SUMMARY".to_string(),
        "=====================".to_string(),
        String::new(),
        format!(
            "Original CSV: {} rows, {} columns",
            result.rows_in, result.columns_in
        ),
        format!(
            "Transformed CSV: {} rows, {} columns",
            result.rows_out(),
            EXPORT_COLUMNS.len()
        ),
        format!("Errors: {}", result.error_count()),
        String::new(),
        "Column Mappings:".to_string(),
    ];

    for (field, header) in &result.column_report {
        lines.push(format!("  {}: {}", field, header));
    }
    let first_header = |columns: &[ResolvedColumn]| {
        columns
            .first()
            .map(|c| c.header.clone())
            .unwrap_or_else(|| "NOT FOUND".to_string())
    };
    lines.push(format!("  price: {}", first_header(mapping.price_columns())));
    lines.push(format!(
        "  property_type: {}",
        first_header(mapping.type_columns())
    ));

    for sample in &result.samples {
        lines.push(String::new());
        lines.push(format!("Row {} Processing:", sample.row));
        lines.push(format!(
            "  Price: ${} (from {})",
            sample.price, sample.price_source
        ));
        lines.push(format!("  Property Type: {}", sample.property_type));
        lines.push(format!(
            "  Monthly Rent: ${} ({:.2}% of price)",
            sample.monthly_rent, sample.rent_percent_of_price
        ));
        lines.push(format!(
            "  Vacancy Rate: {:.1}%",
            sample.vacancy_rate * 100.0
        ));
    }

    lines.push(String::new());
    lines.push("ESTIMATION LOGIC APPLIED:".to_string());
    lines.push(format!(
        "- Monthly Rent: {:.1}% of price ({:.1}% multi-family, {:.1}% condo)",
        est.base_rent_rate * 100.0,
        est.multi_family_rent_rate * 100.0,
        est.condo_rent_rate * 100.0
    ));
    lines.push(format!(
        "- Yearly Taxes: {:.1}% of price if not available",
        est.tax_rate * 100.0
    ));
    lines.push(format!(
        "- Yearly Insurance: {:.1}% of price if not available",
        est.insurance_rate * 100.0
    ));
    lines.push(format!(
        "- Maintenance: {:.1}% of price annually if not available",
        est.maintenance_rate * 100.0
    ));
    lines.push(format!(
        "- Vacancy Rate: {:.1}% single family, {:.1}% multi-family, {:.1}% otherwise",
        est.single_family_vacancy * 100.0,
        est.multi_family_vacancy * 100.0,
        est.default_vacancy * 100.0
    ));
    lines.push(format!(
        "- Default Price: ${}, Bedrooms: {}, Bathrooms: {}",
        est.default_price, est.default_bedrooms, est.default_bathrooms
    ));

    lines.push(String::new());
    lines.push("ERRORS ENCOUNTERED:".to_string());
    if result.errors.is_empty() {
        lines.push("None".to_string());
    }
    for error in &result.errors {
        lines.push(error.to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueOrigin;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_rows(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_documented_scenario() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["Street Addr", "Town", "St", "last_sale_price"],
            &[&["12 Elm St", "Springfield", "IL", "350000"]],
        );

        let result = transformer.transform_table(&t);
        assert!(result.errors.is_empty());
        assert_eq!(result.properties.len(), 1);

        let p = &result.properties[0];
        assert_eq!(p.id, "property-1");
        assert_eq!(p.price, 350_000.0);
        assert_eq!(
            p.provenance.price,
            ValueOrigin::Source {
                column: "last_sale_price".to_string()
            }
        );
        assert_eq!(p.property_type, PropertyType::SingleFamily);
        assert_eq!(p.monthly_rent, 2_800.0);
        assert_eq!(p.vacancy_rate, 0.05);
        assert_eq!(p.yearly_taxes, 4_200.0);
        assert_eq!(p.yearly_insurance, 1_750.0);
        assert_eq!(p.yearly_maintenance, 3_500.0);
        assert_eq!(p.bedrooms, 3);
        assert_eq!(p.bathrooms, 2.0);
        assert_eq!(p.zip_code, "");
        assert_eq!(p.square_feet, None);
    }

    #[test]
    fn test_missing_location_skips_row_with_one_error() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["address", "city", "state"],
            &[
                &["1 A St", "Town", "CA"],
                &["", "Town", "CA"],
                &["3 C St", "", ""],
                &["4 D St", "Town", "NV"],
            ],
        );

        let result = transformer.transform_table(&t);
        assert_eq!(result.rows_in, 4);
        assert_eq!(result.rows_out(), 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].row, 2);
        assert!(result.errors[0].reason.contains("address"));
        assert_eq!(result.errors[1].row, 3);
        assert!(result.errors[1].reason.contains("city, state"));
        assert!(result.is_partial());

        let ids: Vec<&str> = result.properties.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["property-1", "property-4"]);
    }

    #[test]
    fn test_undecodable_row_becomes_error() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let mut t = table(&["address", "city", "state"], &[&["1 A St", "Town", "CA"]]);
        t.rows.push(Err("invalid utf-8 in record".to_string()));
        t.rows.push(Ok(RawRow::new(vec![
            "3 C St".into(),
            "Town".into(),
            "CA".into(),
        ])));

        let result = transformer.transform_table(&t);
        assert_eq!(result.rows_out(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 2);
        assert_eq!(result.errors[0].to_string(), "Row 2: invalid utf-8 in record");
    }

    #[test]
    fn test_duplex_classification_and_vacancy() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["address", "city", "state", "property_type", "price"],
            &[&["9 Oak", "Reno", "NV", "Duplex unit", "300000"]],
        );
        let result = transformer.transform_table(&t);
        let p = &result.properties[0];
        assert_eq!(p.property_type, PropertyType::MultiFamily);
        assert_eq!(p.vacancy_rate, 0.08);
        assert_eq!(p.monthly_rent, 3_000.0);
    }

    #[test]
    fn test_summary_contents() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["Street Addr", "Town", "St", "last_sale_price"],
            &[
                &["12 Elm St", "Springfield", "IL", "350000"],
                &["", "Springfield", "IL", "1"],
            ],
        );
        let result = transformer.transform_table(&t);
        let s = &result.summary;
        assert!(s.contains("Original CSV: 2 rows, 4 columns"));
        assert!(s.contains("Transformed CSV: 1 rows, 15 columns"));
        assert!(s.contains("Errors: 1"));
        assert!(s.contains("  address: Street Addr"));
        assert!(s.contains("  zip_code: NOT FOUND"));
        assert!(s.contains("  price: last_sale_price"));
        assert!(s.contains("Price: $350000 (from last_sale_price)"));
        assert!(s.contains("Monthly Rent: $2800 (0.80% of price)"));
        assert!(s.contains("Vacancy Rate: 5.0%"));
        assert!(s.contains("Row 2: Missing critical address information (address)"));
    }

    #[test]
    fn test_summary_samples_limited_to_leading_rows() {
        let config = PipelineConfig {
            summary_sample_rows: 1,
            ..PipelineConfig::default()
        };
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["address", "city", "state"],
            &[&["1 A", "X", "CA"], &["2 B", "Y", "CA"]],
        );
        let result = transformer.transform_table(&t);
        assert_eq!(result.samples.len(), 1);
        assert_eq!(result.samples[0].row, 1);
        assert_eq!(result.samples[0].price_source, "default");
    }

    #[test]
    fn test_metrics_always_floored() {
        let config = PipelineConfig::default();
        let transformer = RecordTransformer::new(&config);
        let t = table(
            &["address", "city", "state", "price", "monthly_rent"],
            &[&["1 A", "X", "CA", "900000", "1"]],
        );
        let result = transformer.transform_table(&t);
        let m = result.properties[0].metrics;
        assert_eq!(m.roi, 1.0);
        assert_eq!(m.cash_flow, 50.0);
        assert_eq!(m.cap_rate, 2.0);
        assert_eq!(m.gross_yield, 3.0);
    }
}
