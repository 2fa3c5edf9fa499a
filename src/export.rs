use crate::error::Result;
use crate::schema::CanonicalProperty;
use csv::WriterBuilder;
use std::io::Write;

/// Column order of the canonical CSV export, independent of the input schema.
pub const EXPORT_COLUMNS: [&str; 15] = [
    "address",
    "city",
    "state",
    "zip_code",
    "price",
    "bedrooms",
    "bathrooms",
    "square_feet",
    "year_built",
    "property_type",
    "monthly_rent",
    "yearly_taxes",
    "yearly_insurance",
    "maintenance_percentage",
    "vacancy_rate",
];

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// The export cells for one record, aligned with [`EXPORT_COLUMNS`].
pub fn export_row(property: &CanonicalProperty) -> [String; 15] {
    [
        property.address.clone(),
        property.city.clone(),
        property.state.clone(),
        property.zip_code.clone(),
        property.price.to_string(),
        property.bedrooms.to_string(),
        property.bathrooms.to_string(),
        optional(property.square_feet),
        optional(property.year_built),
        property.property_type.label().to_string(),
        property.monthly_rent.to_string(),
        property.yearly_taxes.to_string(),
        property.yearly_insurance.to_string(),
        // Column name kept for compatibility; the value is the yearly maintenance amount.
        property.yearly_maintenance.to_string(),
        property.vacancy_rate.to_string(),
    ]
}

pub fn write_csv<W: Write>(properties: &[CanonicalProperty], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(EXPORT_COLUMNS)?;
    for property in properties {
        csv_writer.write_record(export_row(property))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders records as CSV text with the fixed 15-column header.
pub fn export_csv(properties: &[CanonicalProperty]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(properties, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn export_json(properties: &[CanonicalProperty]) -> Result<String> {
    Ok(serde_json::to_string_pretty(properties)?)
}
