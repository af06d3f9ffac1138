//! Presentation summary of an investment recommendation.
//!
//! Splits a result into the "future projections" block (rate, capacity) and
//! the cost-benefit rows (production, savings, payback), with display strings
//! already formatted.

use serde::Serialize;

use crate::domain::{InvestmentResult, PaybackPeriod};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FutureProjections {
    pub year: i32,
    pub title: String,
    pub predicted_rate: String,
    pub installable_capacity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
    /// Presentation hint: `energy`, `savings` or `roi`.
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSummary {
    pub future_projections: FutureProjections,
    pub cost_benefit_analysis: Vec<SummaryRow>,
}

impl RecommendationSummary {
    pub fn from_result(r: &InvestmentResult) -> Self {
        let row = |label: &str, value: String, icon: &str, description: &str| SummaryRow {
            label: label.to_string(),
            value,
            icon: icon.to_string(),
            description: description.to_string(),
        };

        Self {
            future_projections: FutureProjections {
                year: r.year,
                title: "Solar Investment Projections".to_string(),
                predicted_rate: format!("PHP {:.2} per kWh", r.predicted_unit_price),
                installable_capacity: format!("{:.2} kW", r.capacity),
            },
            cost_benefit_analysis: vec![
                row(
                    "Estimated Yearly Energy Production",
                    format!("{:.2} kWh", r.yearly_output),
                    "energy",
                    "Total energy production per year",
                ),
                row(
                    "Estimated Yearly Savings",
                    format!("PHP {:.2}", r.yearly_savings),
                    "savings",
                    "Total savings per year",
                ),
                row(
                    "Estimated ROI (Payback Period)",
                    format_payback(r.payback),
                    "roi",
                    "Return on investment period",
                ),
            ],
        }
    }
}

pub fn format_payback(p: PaybackPeriod) -> String {
    match p {
        PaybackPeriod::Years(y) => format!("{y:.2} years"),
        PaybackPeriod::Never => "never".to_string(),
    }
}
