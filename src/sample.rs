use crate::config::PipelineConfig;
use crate::estimator::FieldEstimator;
use crate::metrics::calculate_metrics;
use crate::schema::{CanonicalProperty, FieldProvenance, PropertyType, ValueOrigin};
use rand::seq::SliceRandom;
use rand::Rng;

const SAMPLE_CITIES: [(&str, &str); 8] = [
    ("New York", "NY"),
    ("Los Angeles", "CA"),
    ("Chicago", "IL"),
    ("Houston", "TX"),
    ("Phoenix", "AZ"),
    ("Philadelphia", "PA"),
    ("San Antonio", "TX"),
    ("San Diego", "CA"),
];

const SAMPLE_STREETS: [&str; 6] = ["Main", "Oak", "Pine", "Maple", "Cedar", "Elm"];

const SAMPLE_TYPES: [PropertyType; 5] = [
    PropertyType::SingleFamily,
    PropertyType::Condo,
    PropertyType::MultiFamily,
    PropertyType::Townhouse,
    PropertyType::VacantLand,
];

/// Generates plausible demo records. Metrics come from the same calculator
/// and estimator constants as ingested records, so every invariant holds.
pub fn generate_sample_properties<R: Rng + ?Sized>(
    count: usize,
    config: &PipelineConfig,
    rng: &mut R,
) -> Vec<CanonicalProperty> {
    let estimator = FieldEstimator::new(&config.estimation);

    (1..=count)
        .map(|n| {
            let price = f64::from(rng.gen_range(200_000u32..1_000_000));
            let monthly_rent = (price * config.estimation.base_rent_rate
                + f64::from(rng.gen_range(0u32..500)))
            .floor();
            let (city, state) = SAMPLE_CITIES.choose(rng).copied().unwrap_or(("Chicago", "IL"));
            let street = SAMPLE_STREETS.choose(rng).copied().unwrap_or("Main");
            let property_type = SAMPLE_TYPES.choose(rng).copied().unwrap_or_default();

            CanonicalProperty {
                id: format!("property-{}", n),
                address: format!("{} {} St", rng.gen_range(1u32..10_000), street),
                city: city.to_string(),
                state: state.to_string(),
                zip_code: rng.gen_range(10_000u32..100_000).to_string(),
                bedrooms: rng.gen_range(1..=5),
                bathrooms: f64::from(rng.gen_range(1u32..=3)),
                square_feet: Some(rng.gen_range(800..2_800)),
                lot_size: None,
                year_built: Some(rng.gen_range(1970..2020)),
                property_type,
                price,
                monthly_rent,
                yearly_taxes: estimator.estimate_taxes(price),
                yearly_insurance: estimator.estimate_insurance(price),
                yearly_maintenance: estimator.estimate_maintenance(price),
                vacancy_rate: estimator.vacancy_rate(property_type),
                metrics: calculate_metrics(
                    price,
                    monthly_rent,
                    config.estimation.default_price,
                    &config.metrics,
                ),
                description: Some(format!(
                    "{} in {} with strong rental demand.",
                    property_type, city
                )),
                image_url: None,
                provenance: FieldProvenance {
                    price: ValueOrigin::Estimated,
                    monthly_rent: ValueOrigin::Estimated,
                    vacancy_rate: ValueOrigin::Estimated,
                    yearly_taxes: ValueOrigin::Estimated,
                    yearly_insurance: ValueOrigin::Estimated,
                    yearly_maintenance: ValueOrigin::Estimated,
                },
            }
        })
        .collect()
}
