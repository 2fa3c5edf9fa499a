use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum PropertyType {
    #[serde(rename = "Single Family")]
    #[schemars(description = "Detached single-family home. Default when no type signal is found.")]
    SingleFamily,

    #[serde(rename = "Multi-family")]
    #[schemars(description = "Duplexes and other multi-unit residential buildings")]
    MultiFamily,

    #[serde(rename = "Condo")]
    #[schemars(description = "Condominium unit (townhouse descriptions are classified here)")]
    Condo,

    #[serde(rename = "Apartment")]
    Apartment,

    #[serde(rename = "Townhouse")]
    Townhouse,

    #[serde(rename = "Vacant Land")]
    VacantLand,
}

impl Default for PropertyType {
    fn default() -> Self {
        Self::SingleFamily
    }
}

impl PropertyType {
    pub const ALL: [PropertyType; 6] = [
        PropertyType::SingleFamily,
        PropertyType::MultiFamily,
        PropertyType::Condo,
        PropertyType::Apartment,
        PropertyType::Townhouse,
        PropertyType::VacantLand,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "Single Family",
            PropertyType::MultiFamily => "Multi-family",
            PropertyType::Condo => "Condo",
            PropertyType::Apartment => "Apartment",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::VacantLand => "Vacant Land",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical fields that are located through the column resolver.
///
/// Price and property type are not listed here: both are resolved through
/// their own ranked column lists by the estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Address,
    City,
    State,
    ZipCode,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    LotSize,
    YearBuilt,
    MonthlyRent,
    YearlyTaxes,
    YearlyInsurance,
    Maintenance,
    VacancyRate,
    Description,
    ImageUrl,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 16] = [
        CanonicalField::Address,
        CanonicalField::City,
        CanonicalField::State,
        CanonicalField::ZipCode,
        CanonicalField::Bedrooms,
        CanonicalField::Bathrooms,
        CanonicalField::SquareFeet,
        CanonicalField::LotSize,
        CanonicalField::YearBuilt,
        CanonicalField::MonthlyRent,
        CanonicalField::YearlyTaxes,
        CanonicalField::YearlyInsurance,
        CanonicalField::Maintenance,
        CanonicalField::VacancyRate,
        CanonicalField::Description,
        CanonicalField::ImageUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Address => "address",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::ZipCode => "zip_code",
            CanonicalField::Bedrooms => "bedrooms",
            CanonicalField::Bathrooms => "bathrooms",
            CanonicalField::SquareFeet => "square_feet",
            CanonicalField::LotSize => "lot_size",
            CanonicalField::YearBuilt => "year_built",
            CanonicalField::MonthlyRent => "monthly_rent",
            CanonicalField::YearlyTaxes => "yearly_taxes",
            CanonicalField::YearlyInsurance => "yearly_insurance",
            CanonicalField::Maintenance => "maintenance",
            CanonicalField::VacancyRate => "vacancy_rate",
            CanonicalField::Description => "description",
            CanonicalField::ImageUrl => "image_url",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a financial input on a record came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ValueOrigin {
    /// Read from a source column (the header text as it appeared in the input)
    Source { column: String },
    /// Derived from price and property type by a documented formula
    Estimated,
    /// A fixed fallback constant
    Default,
}

impl ValueOrigin {
    pub fn describe(&self) -> String {
        match self {
            ValueOrigin::Source { column } => column.clone(),
            ValueOrigin::Estimated => "estimate".to_string(),
            ValueOrigin::Default => "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldProvenance {
    pub price: ValueOrigin,
    pub monthly_rent: ValueOrigin,
    pub vacancy_rate: ValueOrigin,
    pub yearly_taxes: ValueOrigin,
    pub yearly_insurance: ValueOrigin,
    pub yearly_maintenance: ValueOrigin,
}

/// Metrics derived from price and monthly rent, already floored for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InvestmentMetrics {
    #[schemars(description = "Return on investment, percent")]
    pub roi: f64,
    #[schemars(description = "Monthly cash flow in currency units")]
    pub cash_flow: f64,
    #[schemars(description = "Capitalization rate, percent of price")]
    pub cap_rate: f64,
    #[schemars(description = "Gross yield, percent of price (same formula as cap rate)")]
    pub gross_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalProperty {
    #[schemars(description = "Identifier, unique within one ingestion (e.g. 'property-3')")]
    pub id: String,

    pub address: String,
    pub city: String,
    pub state: String,
    #[schemars(description = "Postal code, empty when the source has none")]
    pub zip_code: String,

    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_feet: Option<u32>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub property_type: PropertyType,

    #[schemars(description = "Purchase price, always positive")]
    pub price: f64,
    pub monthly_rent: f64,
    pub yearly_taxes: f64,
    pub yearly_insurance: f64,
    #[schemars(description = "Yearly maintenance amount in currency units")]
    pub yearly_maintenance: f64,
    #[schemars(description = "Expected vacancy as a fraction between 0 and 1")]
    pub vacancy_rate: f64,

    pub metrics: InvestmentMetrics,

    pub description: Option<String>,
    pub image_url: Option<String>,

    pub provenance: FieldProvenance,
}

impl CanonicalProperty {
    /// Text the free-text search predicate matches against.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.address, self.city, self.state, self.zip_code
        )
        .to_lowercase()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CanonicalProperty)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_serde_use_the_same_label() {
        for t in PropertyType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t));
        }
        assert!(serde_json::from_str::<PropertyType>("\"castle\"").is_err());
    }

    #[test]
    fn test_property_type_serializes_as_label() {
        let json = serde_json::to_string(&PropertyType::VacantLand).unwrap();
        assert_eq!(json, "\"Vacant Land\"");
        let back: PropertyType = serde_json::from_str("\"Multi-family\"").unwrap();
        assert_eq!(back, PropertyType::MultiFamily);
    }

    #[test]
    fn test_value_origin_describe() {
        let origin = ValueOrigin::Source {
            column: "last_sale_price".to_string(),
        };
        assert_eq!(origin.describe(), "last_sale_price");
        assert_eq!(ValueOrigin::Default.describe(), "default");
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = CanonicalProperty::schema_as_json().unwrap();
        assert!(schema_json.contains("monthly_rent"));
        assert!(schema_json.contains("vacancy_rate"));
        assert!(schema_json.contains("Vacant Land"));
    }
}
