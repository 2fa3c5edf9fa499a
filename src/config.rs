use crate::error::{PropertyIngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Constants used by the field estimator when a source value is absent or invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Price used when no monetary proxy column yields a positive number.
    pub default_price: f64,
    /// Monthly rent as a fraction of price for types without a specific rate.
    pub base_rent_rate: f64,
    pub multi_family_rent_rate: f64,
    pub condo_rent_rate: f64,
    pub multi_family_vacancy: f64,
    pub single_family_vacancy: f64,
    pub default_vacancy: f64,
    /// Yearly amounts as fractions of price.
    pub tax_rate: f64,
    pub insurance_rate: f64,
    pub maintenance_rate: f64,
    pub default_bedrooms: u32,
    pub default_bathrooms: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            default_price: 200_000.0,
            base_rent_rate: 0.008,
            multi_family_rent_rate: 0.010,
            condo_rent_rate: 0.007,
            multi_family_vacancy: 0.08,
            single_family_vacancy: 0.05,
            default_vacancy: 0.06,
            tax_rate: 0.012,
            insurance_rate: 0.005,
            maintenance_rate: 0.010,
            default_bedrooms: 3,
            default_bathrooms: 2.0,
        }
    }
}

/// Formula constants and display floors for the investment metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsPolicy {
    /// Yearly operating cost as a fraction of price, subtracted in ROI.
    pub annual_cost_rate: f64,
    /// Monthly carrying cost as a fraction of price, subtracted in cash flow.
    pub monthly_cost_rate: f64,
    pub roi_floor: f64,
    pub cash_flow_floor: f64,
    pub cap_rate_floor: f64,
    pub gross_yield_floor: f64,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self {
            annual_cost_rate: 0.02,
            monthly_cost_rate: 0.004,
            roi_floor: 1.0,
            cash_flow_floor: 50.0,
            cap_rate_floor: 2.0,
            gross_yield_floor: 3.0,
        }
    }
}

/// Loan terms used by the mortgage helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingAssumptions {
    pub down_payment_rate: f64,
    pub annual_interest_rate: f64,
    pub term_years: u32,
}

impl Default for FinancingAssumptions {
    fn default() -> Self {
        Self {
            down_payment_rate: 0.2,
            annual_interest_rate: 0.065,
            term_years: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub estimation: EstimationConfig,
    pub metrics: MetricsPolicy,
    pub financing: FinancingAssumptions,
    /// How many leading rows get their estimation reasoning written to the summary.
    pub summary_sample_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            estimation: EstimationConfig::default(),
            metrics: MetricsPolicy::default(),
            financing: FinancingAssumptions::default(),
            summary_sample_rows: 3,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let est = &self.estimation;

        if !(est.default_price.is_finite() && est.default_price > 0.0) {
            return Err(PropertyIngestError::InvalidConfig(format!(
                "default_price must be a positive number, got {}",
                est.default_price
            )));
        }

        let rates = [
            ("base_rent_rate", est.base_rent_rate),
            ("multi_family_rent_rate", est.multi_family_rent_rate),
            ("condo_rent_rate", est.condo_rent_rate),
            ("tax_rate", est.tax_rate),
            ("insurance_rate", est.insurance_rate),
            ("maintenance_rate", est.maintenance_rate),
            ("default_bathrooms", est.default_bathrooms),
            ("annual_cost_rate", self.metrics.annual_cost_rate),
            ("monthly_cost_rate", self.metrics.monthly_cost_rate),
            ("down_payment_rate", self.financing.down_payment_rate),
            ("annual_interest_rate", self.financing.annual_interest_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(PropertyIngestError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        let vacancies = [
            ("multi_family_vacancy", est.multi_family_vacancy),
            ("single_family_vacancy", est.single_family_vacancy),
            ("default_vacancy", est.default_vacancy),
        ];
        for (name, value) in vacancies {
            if !(0.0..1.0).contains(&value) {
                return Err(PropertyIngestError::InvalidConfig(format!(
                    "{} must be within [0, 1), got {}",
                    name, value
                )));
            }
        }

        let floors = [
            self.metrics.roi_floor,
            self.metrics.cash_flow_floor,
            self.metrics.cap_rate_floor,
            self.metrics.gross_yield_floor,
        ];
        if floors.iter().any(|f| !f.is_finite()) {
            return Err(PropertyIngestError::InvalidConfig(
                "metric floors must be finite".to_string(),
            ));
        }

        if self.financing.down_payment_rate > 1.0 {
            return Err(PropertyIngestError::InvalidConfig(format!(
                "down_payment_rate must not exceed 1.0, got {}",
                self.financing.down_payment_rate
            )));
        }

        Ok(())
    }
}
