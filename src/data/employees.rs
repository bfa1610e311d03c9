use serde_json::json;

use super::frame::DataFrame;
use super::registry::FeatureGroup;

pub const EMPLOYEE_FEATURES: [&str; 5] = [
    "employee_id",
    "department",
    "salary",
    "years_experience",
    "performance_score",
];

/// Hardcoded employee dataset: 10 employees across 3 departments.
pub struct EmployeeDataFeatures;

impl FeatureGroup for EmployeeDataFeatures {
    fn name(&self) -> &str {
        "EmployeeDataFeatures"
    }

    fn description(&self) -> &str {
        "Hardcoded employee dataset. 10 employees across 3 departments."
    }

    fn feature_names_supported(&self) -> &[&str] {
        &EMPLOYEE_FEATURES
    }

    fn calculate_feature(&self) -> DataFrame {
        DataFrame::new()
            .with_column("employee_id", (1..=10).map(|id| json!(id)).collect())
            .with_column(
                "department",
                [
                    "Engineering",
                    "Engineering",
                    "Engineering",
                    "Sales",
                    "Sales",
                    "Sales",
                    "HR",
                    "HR",
                    "HR",
                    "Engineering",
                ]
                .iter()
                .map(|d| json!(d))
                .collect(),
            )
            .with_column(
                "salary",
                [95000, 88000, 102000, 72000, 68000, 75000, 61000, 58000, 64000, 110000]
                    .iter()
                    .map(|s| json!(s))
                    .collect(),
            )
            .with_column(
                "years_experience",
                [5, 3, 8, 4, 2, 6, 7, 3, 5, 10].iter().map(|y| json!(y)).collect(),
            )
            .with_column(
                "performance_score",
                [87, 72, 95, 81, 65, 78, 90, 55, 83, 98]
                    .iter()
                    .map(|p| json!(p))
                    .collect(),
            )
    }
}
