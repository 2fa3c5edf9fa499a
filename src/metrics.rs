use crate::config::{FinancingAssumptions, MetricsPolicy};
use crate::schema::InvestmentMetrics;

/// Metrics before the display floors are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMetrics {
    pub roi: f64,
    pub cash_flow: f64,
    pub cap_rate: f64,
    pub gross_yield: f64,
}

/// Computes the unfloored metrics. `price` must be positive; callers go through
/// [`calculate_metrics`], which substitutes the fallback price first.
pub fn raw_metrics(price: f64, monthly_rent: f64, policy: &MetricsPolicy) -> RawMetrics {
    let annual_rent = monthly_rent * 12.0;
    let roi = (annual_rent - price * policy.annual_cost_rate) / price * 100.0;
    let cash_flow = monthly_rent - price * policy.monthly_cost_rate;
    let cap_rate = annual_rent / price * 100.0;

    RawMetrics {
        roi,
        cash_flow,
        cap_rate,
        gross_yield: cap_rate,
    }
}

/// Clamps a computed value up to its floor. Positive overflow saturates at
/// `f64::MAX`; NaN and negative overflow land on the floor.
fn floored(value: f64, floor: f64) -> f64 {
    if value == f64::INFINITY {
        f64::MAX
    } else if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}

/// ROI, cash flow, cap rate and gross yield for display.
///
/// A non-positive or non-finite `price` is replaced by `fallback_price` so no
/// division by zero can happen, and a non-finite or negative rent counts as
/// zero. Every result is finite and at least its floor in `policy`.
pub fn calculate_metrics(
    price: f64,
    monthly_rent: f64,
    fallback_price: f64,
    policy: &MetricsPolicy,
) -> InvestmentMetrics {
    let price = if price.is_finite() && price > 0.0 {
        price
    } else {
        fallback_price
    };
    let rent = if monthly_rent.is_finite() && monthly_rent > 0.0 {
        monthly_rent
    } else {
        0.0
    };

    let raw = raw_metrics(price, rent, policy);

    InvestmentMetrics {
        roi: floored(raw.roi, policy.roi_floor),
        cash_flow: floored(raw.cash_flow, policy.cash_flow_floor),
        cap_rate: floored(raw.cap_rate, policy.cap_rate_floor),
        gross_yield: floored(raw.gross_yield, policy.gross_yield_floor),
    }
}

/// Amount paid up front under the financing assumptions.
pub fn down_payment(price: f64, financing: &FinancingAssumptions) -> f64 {
    price * financing.down_payment_rate
}

/// Standard amortized monthly payment on the financed part of `price`.
pub fn monthly_mortgage_payment(price: f64, financing: &FinancingAssumptions) -> f64 {
    let principal = price - down_payment(price, financing);
    let payments = f64::from(financing.term_years * 12);
    if payments == 0.0 {
        return principal;
    }

    let monthly_rate = financing.annual_interest_rate / 12.0;
    if monthly_rate == 0.0 {
        return principal / payments;
    }

    let growth = (1.0 + monthly_rate).powf(payments);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

pub fn price_per_square_foot(price: f64, square_feet: Option<u32>) -> Option<f64> {
    square_feet
        .filter(|sqft| *sqft > 0)
        .map(|sqft| price / f64::from(sqft))
}
