//! Terminal output for forecasts, regional tables and recommendations.
//!
//! Formatting stays here so the forecasting code never builds strings, and
//! output changes are localized.

use crate::domain::{FittedTrendModel, ForecastPoint, InvestmentResult, RegionalForecast};
use crate::report::summary::RecommendationSummary;

/// Table of one metric's forecast.
pub fn format_trend(metric: &str, points: &[ForecastPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {metric} forecast ===\n"));
    if points.is_empty() {
        out.push_str("(no years in range)\n");
        return out;
    }

    push_line(&mut out, format!("{:<6} {:>16} {:<10}", "year", "value", "provenance"));
    push_line(&mut out, format!("{:-<6} {:-<16} {:-<10}", "", "", ""));
    for p in points {
        let flag = if p.provenance.is_predicted() { "predicted" } else { "actual" };
        push_line(&mut out, format!("{:<6} {:>16.3} {:<10}", p.year, p.value, flag));
    }
    out
}

/// Regional rows followed by any diagnostics.
pub fn format_regional(fc: &RegionalForecast) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Regional forecast for {} ===\n", fc.target_year));

    if fc.rows.is_empty() {
        out.push_str("(no predictions for this year)\n");
    } else {
        push_line(&mut out, format!("{:<14} {:<42} {:>14}", "region", "label", "value"));
        push_line(&mut out, format!("{:-<14} {:-<42} {:-<14}", "", "", ""));
        for r in &fc.rows {
            let value = match r.value {
                Some(v) => format!("{v:.3}"),
                None => "undefined".to_string(),
            };
            push_line(
                &mut out,
                format!("{:<14} {:<42} {:>14}", truncate(&r.region, 14), truncate(&r.label, 42), value),
            );
        }
    }

    if !fc.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for d in &fc.diagnostics {
            out.push_str(&format!("- {}: {}\n", d.subject, d.message));
        }
    }
    out
}

pub fn format_recommendation(r: &InvestmentResult) -> String {
    let summary = RecommendationSummary::from_result(r);
    let fp = &summary.future_projections;

    let mut out = String::new();
    out.push_str(&format!("=== {} ({}) ===\n", fp.title, fp.year));
    out.push_str(&format!("Budget: PHP {:.2}\n", r.budget));
    out.push_str(&format!("Predicted Solar Cost: PHP {:.2} per kW\n", r.predicted_unit_cost));
    out.push_str(&format!("Predicted MERALCO Rate: {}\n", fp.predicted_rate));
    out.push_str(&format!("Installable Solar Capacity: {}\n", fp.installable_capacity));

    out.push_str("\nCost-benefit analysis:\n");
    for row in &summary.cost_benefit_analysis {
        push_line(&mut out, format!("{:<34} {:>20}  {}", row.label, row.value, row.description));
    }
    out
}

/// One line per trained model with its hold-out diagnostics.
pub fn format_training(models: &[FittedTrendModel]) -> String {
    let mut out = String::new();
    out.push_str("=== Trained trend models ===\n");
    for m in models {
        let eval = match &m.evaluation {
            Some(e) => format!("MAE={:.3} MSE={:.3} (test n={})", e.mae, e.mse, e.n_test),
            None => "no hold-out".to_string(),
        };
        push_line(&mut out, format!("{:<22} rows={:<4} {eval}", m.metric, m.n_rows));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Diagnostic, PaybackPeriod, Provenance, RegionalEstimate, RegionalKind};

    #[test]
    fn trend_table_marks_provenance() {
        let points = vec![
            ForecastPoint {
                year: 2023,
                value: 10.0,
                provenance: Provenance::Actual,
            },
            ForecastPoint {
                year: 2024,
                value: 12.5,
                provenance: Provenance::Predicted,
            },
        ];
        let text = format_trend("solar", &points);
        assert!(text.contains("2023"));
        assert!(text.lines().any(|l| l.starts_with("2024") && l.ends_with("predicted")));
        assert!(format_trend("solar", &[]).contains("no years"));
    }

    #[test]
    fn regional_table_shows_undefined_and_diagnostics() {
        let fc = RegionalForecast {
            target_year: 2030,
            rows: vec![RegionalEstimate {
                year: 2030,
                region: "Cebu".into(),
                label: "Cebu Estimated Consumption (GWh)".into(),
                kind: RegionalKind::EstimatedConsumption,
                value: None,
            }],
            diagnostics: vec![Diagnostic::new("Negros", "no columns found for sub-region; skipped")],
        };
        let text = format_regional(&fc);
        assert!(text.contains("undefined"));
        assert!(text.contains("- Negros: no columns"));
    }

    #[test]
    fn recommendation_lists_cost_benefit_rows() {
        let r = InvestmentResult {
            year: 2030,
            budget: 100_000.0,
            predicted_unit_cost: 20_000.0,
            predicted_unit_price: 0.0,
            capacity: 5.0,
            yearly_output: 7300.0,
            yearly_savings: 0.0,
            payback: PaybackPeriod::Never,
        };
        let text = format_recommendation(&r);
        assert!(text.contains("Estimated ROI (Payback Period)"));
        assert!(text.contains("never"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Leyte-Samar", 6), "Leyte.");
        assert_eq!(truncate("Cebu", 6), "Cebu");
    }
}
