use crate::columns::ColumnMapping;
use crate::config::EstimationConfig;
use crate::ingestion::RawRow;
use crate::schema::{CanonicalField, PropertyType, ValueOrigin};
use crate::utils::{parse_number, parse_positive, round_currency};
use chrono::{Datelike, Utc};
use log::debug;

/// Oldest construction year accepted from a source cell.
const EARLIEST_YEAR_BUILT: i32 = 1600;

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate<T> {
    pub value: T,
    pub origin: ValueOrigin,
}

impl<T> Estimate<T> {
    fn source(value: T, column: &str) -> Self {
        Self {
            value,
            origin: ValueOrigin::Source {
                column: column.to_string(),
            },
        }
    }

    fn estimated(value: T) -> Self {
        Self {
            value,
            origin: ValueOrigin::Estimated,
        }
    }

    fn default_value(value: T) -> Self {
        Self {
            value,
            origin: ValueOrigin::Default,
        }
    }
}

/// Ordered substring rules; the first rule with a matching keyword wins.
const TYPE_RULES: &[(&[&str], PropertyType)] = &[
    (&["single", "detached"], PropertyType::SingleFamily),
    (&["multi", "duplex"], PropertyType::MultiFamily),
    (&["condo", "townhouse"], PropertyType::Condo),
    (&["apartment"], PropertyType::Apartment),
];

/// Classifies free text into the property-type vocabulary, or `None` when no rule fires.
pub fn classify_property_type(text: &str) -> Option<PropertyType> {
    let lowered = text.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, property_type)| *property_type)
}

/// Fills canonical fields that are absent or invalid in a source row.
///
/// None of the methods fail: every field ends in a documented constant or
/// formula when the source has nothing usable.
pub struct FieldEstimator<'a> {
    config: &'a EstimationConfig,
    current_year: i32,
}

impl<'a> FieldEstimator<'a> {
    pub fn new(config: &'a EstimationConfig) -> Self {
        Self {
            config,
            current_year: Utc::now().year(),
        }
    }

    pub fn with_current_year(config: &'a EstimationConfig, current_year: i32) -> Self {
        Self {
            config,
            current_year,
        }
    }

    /// First price proxy column whose cell is a positive number, else the default price.
    pub fn estimate_price(&self, row: &RawRow, mapping: &ColumnMapping) -> Estimate<f64> {
        for column in mapping.price_columns() {
            if let Some(value) = row.get(column.index).and_then(parse_positive) {
                return Estimate::source(value, &column.header);
            }
        }

        debug!(
            "No usable price column, falling back to default {}",
            self.config.default_price
        );
        Estimate::default_value(self.config.default_price)
    }

    /// Guards the price invariant for callers holding an arbitrary number.
    pub fn sanitize_price(&self, price: f64) -> f64 {
        if price.is_finite() && price > 0.0 {
            price
        } else {
            self.config.default_price
        }
    }

    pub fn determine_property_type(&self, row: &RawRow, mapping: &ColumnMapping) -> PropertyType {
        mapping
            .type_columns()
            .iter()
            .filter_map(|column| row.get(column.index))
            .find_map(classify_property_type)
            .unwrap_or_default()
    }

    pub fn rent_rate(&self, property_type: PropertyType) -> f64 {
        match property_type {
            PropertyType::MultiFamily => self.config.multi_family_rent_rate,
            PropertyType::Condo => self.config.condo_rent_rate,
            _ => self.config.base_rent_rate,
        }
    }

    /// Monthly rent from price and type, rounded to a whole currency unit.
    pub fn estimate_rent(&self, price: f64, property_type: PropertyType) -> f64 {
        round_currency(self.sanitize_price(price) * self.rent_rate(property_type))
    }

    pub fn resolve_rent(
        &self,
        row: &RawRow,
        mapping: &ColumnMapping,
        price: f64,
        property_type: PropertyType,
    ) -> Estimate<f64> {
        if let Some(column) = mapping.column(CanonicalField::MonthlyRent) {
            if let Some(rent) = row.get(column.index).and_then(parse_positive) {
                return Estimate::source(rent, &column.header);
            }
        }
        Estimate::estimated(self.estimate_rent(price, property_type))
    }

    pub fn vacancy_rate(&self, property_type: PropertyType) -> f64 {
        match property_type {
            PropertyType::MultiFamily => self.config.multi_family_vacancy,
            PropertyType::SingleFamily => self.config.single_family_vacancy,
            _ => self.config.default_vacancy,
        }
    }

    /// A source vacancy is kept only when it is a fraction in `[0, 1)`.
    pub fn resolve_vacancy(
        &self,
        row: &RawRow,
        mapping: &ColumnMapping,
        property_type: PropertyType,
    ) -> Estimate<f64> {
        if let Some(column) = mapping.column(CanonicalField::VacancyRate) {
            if let Some(rate) = row
                .get(column.index)
                .and_then(parse_number)
                .filter(|r| (0.0..1.0).contains(r))
            {
                return Estimate::source(rate, &column.header);
            }
        }
        Estimate::estimated(self.vacancy_rate(property_type))
    }

    pub fn estimate_taxes(&self, price: f64) -> f64 {
        round_currency(self.sanitize_price(price) * self.config.tax_rate)
    }

    pub fn estimate_insurance(&self, price: f64) -> f64 {
        round_currency(self.sanitize_price(price) * self.config.insurance_rate)
    }

    pub fn estimate_maintenance(&self, price: f64) -> f64 {
        round_currency(self.sanitize_price(price) * self.config.maintenance_rate)
    }

    /// Yearly taxes, insurance or maintenance: a positive source value, else the price formula.
    pub fn resolve_yearly_amount(
        &self,
        row: &RawRow,
        mapping: &ColumnMapping,
        field: CanonicalField,
        price: f64,
    ) -> Estimate<f64> {
        if let Some(column) = mapping.column(field) {
            if let Some(amount) = row.get(column.index).and_then(parse_positive) {
                return Estimate::source(amount, &column.header);
            }
        }

        let value = match field {
            CanonicalField::YearlyInsurance => self.estimate_insurance(price),
            CanonicalField::Maintenance => self.estimate_maintenance(price),
            _ => self.estimate_taxes(price),
        };
        Estimate::estimated(value)
    }

    pub fn bedrooms(&self, row: &RawRow, mapping: &ColumnMapping) -> u32 {
        mapping
            .cell(row, CanonicalField::Bedrooms)
            .and_then(parse_number)
            .filter(|v| *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v.round() as u32)
            .unwrap_or(self.config.default_bedrooms)
    }

    pub fn bathrooms(&self, row: &RawRow, mapping: &ColumnMapping) -> f64 {
        mapping
            .cell(row, CanonicalField::Bathrooms)
            .and_then(parse_number)
            .filter(|v| *v >= 0.0)
            .unwrap_or(self.config.default_bathrooms)
    }

    pub fn square_feet(&self, row: &RawRow, mapping: &ColumnMapping) -> Option<u32> {
        mapping
            .cell(row, CanonicalField::SquareFeet)
            .and_then(parse_positive)
            .filter(|v| *v <= f64::from(u32::MAX))
            .map(|v| v.round() as u32)
    }

    pub fn lot_size(&self, row: &RawRow, mapping: &ColumnMapping) -> Option<f64> {
        mapping
            .cell(row, CanonicalField::LotSize)
            .and_then(parse_positive)
    }

    pub fn year_built(&self, row: &RawRow, mapping: &ColumnMapping) -> Option<i32> {
        let latest = self.current_year + 1;
        mapping
            .cell(row, CanonicalField::YearBuilt)
            .and_then(parse_number)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i32)
            .filter(|year| (EARLIEST_YEAR_BUILT..=latest).contains(year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(headers: &[&str], cells: &[&str]) -> (ColumnMapping, RawRow) {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let row = RawRow::new(cells.iter().map(|s| s.to_string()).collect());
        (ColumnMapping::resolve(&headers), row)
    }

    #[test]
    fn test_classify_property_type_rules() {
        assert_eq!(
            classify_property_type("Detached house"),
            Some(PropertyType::SingleFamily)
        );
        assert_eq!(
            classify_property_type("Duplex unit"),
            Some(PropertyType::MultiFamily)
        );
        assert_eq!(
            classify_property_type("TOWNHOUSE end unit"),
            Some(PropertyType::Condo)
        );
        assert_eq!(
            classify_property_type("Garden apartment"),
            Some(PropertyType::Apartment)
        );
        assert_eq!(classify_property_type("Barn"), None);
    }

    #[test]
    fn test_classify_first_rule_wins() {
        // "single" is checked before "condo" regardless of position in the text.
        assert_eq!(
            classify_property_type("condo, single level"),
            Some(PropertyType::SingleFamily)
        );
    }

    #[test]
    fn test_price_from_first_valid_proxy() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(
            &["last_sale_price", "assessed_value"],
            &["0", "$275,000"],
        );
        let price = estimator.estimate_price(&row, &mapping);
        assert_eq!(price.value, 275_000.0);
        assert_eq!(
            price.origin,
            ValueOrigin::Source {
                column: "assessed_value".to_string()
            }
        );
    }

    #[test]
    fn test_price_defaults_when_nothing_qualifies() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(&["sale_price", "notes"], &["n/a", "x"]);
        let price = estimator.estimate_price(&row, &mapping);
        assert_eq!(price.value, 200_000.0);
        assert_eq!(price.origin, ValueOrigin::Default);
    }

    #[test]
    fn test_property_type_scans_columns_in_order() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(
            &["description", "property_type"],
            &["Lovely duplex", "Residential"],
        );
        // property_type has no rule match, so the description column decides.
        assert_eq!(
            estimator.determine_property_type(&row, &mapping),
            PropertyType::MultiFamily
        );

        let (mapping, row) = fixture(&["address"], &["1 A St"]);
        assert_eq!(
            estimator.determine_property_type(&row, &mapping),
            PropertyType::SingleFamily
        );
    }

    #[test]
    fn test_rent_rates_by_type() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        assert_eq!(
            estimator.estimate_rent(350_000.0, PropertyType::SingleFamily),
            2_800.0
        );
        assert_eq!(
            estimator.estimate_rent(300_000.0, PropertyType::MultiFamily),
            3_000.0
        );
        assert_eq!(
            estimator.estimate_rent(300_000.0, PropertyType::Condo),
            2_100.0
        );
        assert_eq!(
            estimator.estimate_rent(300_000.0, PropertyType::Apartment),
            2_400.0
        );
        // Non-positive price is treated as the default price.
        assert_eq!(
            estimator.estimate_rent(0.0, PropertyType::SingleFamily),
            1_600.0
        );
    }

    #[test]
    fn test_rent_source_column_preferred() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(&["monthly_rent"], &["1950"]);
        let rent = estimator.resolve_rent(&row, &mapping, 350_000.0, PropertyType::SingleFamily);
        assert_eq!(rent.value, 1_950.0);

        let (mapping, row) = fixture(&["monthly_rent"], &["0"]);
        let rent = estimator.resolve_rent(&row, &mapping, 350_000.0, PropertyType::SingleFamily);
        assert_eq!(rent.value, 2_800.0);
        assert_eq!(rent.origin, ValueOrigin::Estimated);
    }

    #[test]
    fn test_vacancy_table() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        assert_eq!(estimator.vacancy_rate(PropertyType::MultiFamily), 0.08);
        assert_eq!(estimator.vacancy_rate(PropertyType::SingleFamily), 0.05);
        assert_eq!(estimator.vacancy_rate(PropertyType::Condo), 0.06);
        assert_eq!(estimator.vacancy_rate(PropertyType::VacantLand), 0.06);
    }

    #[test]
    fn test_vacancy_source_must_be_fraction() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(&["vacancy_rate"], &["0.1"]);
        let rate = estimator.resolve_vacancy(&row, &mapping, PropertyType::SingleFamily);
        assert_eq!(rate.value, 0.1);

        let (mapping, row) = fixture(&["vacancy_rate"], &["12"]);
        let rate = estimator.resolve_vacancy(&row, &mapping, PropertyType::SingleFamily);
        assert_eq!(rate.value, 0.05);
    }

    #[test]
    fn test_yearly_amounts_independent() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        assert_eq!(estimator.estimate_taxes(350_000.0), 4_200.0);
        assert_eq!(estimator.estimate_insurance(350_000.0), 1_750.0);
        assert_eq!(estimator.estimate_maintenance(350_000.0), 3_500.0);

        let (mapping, row) = fixture(&["property_tax", "insurance"], &["5100", ""]);
        let taxes =
            estimator.resolve_yearly_amount(&row, &mapping, CanonicalField::YearlyTaxes, 350_000.0);
        assert_eq!(taxes.value, 5_100.0);
        let insurance = estimator.resolve_yearly_amount(
            &row,
            &mapping,
            CanonicalField::YearlyInsurance,
            350_000.0,
        );
        assert_eq!(insurance.value, 1_750.0);
        assert_eq!(insurance.origin, ValueOrigin::Estimated);
    }

    #[test]
    fn test_physical_attributes() {
        let config = EstimationConfig::default();
        let estimator = FieldEstimator::with_current_year(&config, 2024);
        let (mapping, row) = fixture(
            &["beds", "baths", "living_sqft", "year_built", "lot_size"],
            &["4", "2.5", "1,850", "1999", "0.25"],
        );
        assert_eq!(estimator.bedrooms(&row, &mapping), 4);
        assert_eq!(estimator.bathrooms(&row, &mapping), 2.5);
        assert_eq!(estimator.square_feet(&row, &mapping), Some(1_850));
        assert_eq!(estimator.year_built(&row, &mapping), Some(1999));
        assert_eq!(estimator.lot_size(&row, &mapping), Some(0.25));

        let (mapping, row) = fixture(
            &["beds", "baths", "sqft", "year_built"],
            &["many", "", "-3", "2999"],
        );
        assert_eq!(estimator.bedrooms(&row, &mapping), 3);
        assert_eq!(estimator.bathrooms(&row, &mapping), 2.0);
        assert_eq!(estimator.square_feet(&row, &mapping), None);
        assert_eq!(estimator.year_built(&row, &mapping), None);
    }
}
