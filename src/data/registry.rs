use serde::Serialize;
use tracing::debug;

use super::frame::DataFrame;
use crate::errors::DataError;
use crate::observability::ObservabilityExtender;

/// A registered unit that produces one or more named features as columns.
pub trait FeatureGroup: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Feature names this group can produce
    fn feature_names_supported(&self) -> &[&str];

    /// Produce every supported feature as one frame
    fn calculate_feature(&self) -> DataFrame;

    fn match_feature_group_criteria(&self, feature_name: &str) -> bool {
        self.feature_names_supported()
            .iter()
            .any(|supported| *supported == feature_name)
    }
}

/// Documentation for one feature group, as returned by discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureGroupDoc {
    pub name: String,
    pub features: Vec<String>,
    pub description: String,
}

impl FeatureGroupDoc {
    fn from_group(group: &dyn FeatureGroup) -> Self {
        Self {
            name: group.name().to_string(),
            features: group
                .feature_names_supported()
                .iter()
                .map(|f| f.to_string())
                .collect(),
            description: group.description().to_string(),
        }
    }
}

#[derive(Default)]
pub struct FeatureRegistry {
    groups: Vec<Box<dyn FeatureGroup>>,
    extender: Option<ObservabilityExtender>,
}

impl FeatureRegistry {
    /// An empty registry without any extender
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every bundled feature group loaded
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::employees::EmployeeDataFeatures));
        registry
    }

    pub fn register(&mut self, group: Box<dyn FeatureGroup>) {
        self.groups.push(group);
    }

    /// Wrap every feature calculation with the given extender
    pub fn with_extender(mut self, extender: ObservabilityExtender) -> Self {
        self.extender = Some(extender);
        self
    }

    /// Documentation of the registered groups whose name contains `name_filter`
    pub fn docs(&self, name_filter: Option<&str>) -> Vec<FeatureGroupDoc> {
        self.groups
            .iter()
            .filter(|group| name_filter.map_or(true, |filter| group.name().contains(filter)))
            .map(|group| FeatureGroupDoc::from_group(group.as_ref()))
            .collect()
    }

    fn resolve(&self, feature_name: &str) -> Result<usize, DataError> {
        self.groups
            .iter()
            .position(|group| group.match_feature_group_criteria(feature_name))
            .ok_or_else(|| DataError::UnresolvedFeature(feature_name.to_string()))
    }

    /// Compute the requested features. Names are grouped by the feature group
    /// that produces them; one frame is returned per group, in order of first
    /// request, holding exactly the requested columns in request order.
    pub fn run_all<S: AsRef<str>>(&self, feature_names: &[S]) -> Result<Vec<DataFrame>, DataError> {
        if feature_names.is_empty() {
            return Err(DataError::EmptyRequest);
        }

        let mut plan: Vec<(usize, Vec<&str>)> = Vec::new();
        for name in feature_names {
            let name = name.as_ref();
            let index = self.resolve(name)?;
            match plan.iter_mut().find(|(group, _)| *group == index) {
                Some((_, names)) if !names.contains(&name) => names.push(name),
                Some(_) => {}
                None => plan.push((index, vec![name])),
            }
        }

        plan.into_iter()
            .map(|(index, names)| {
                let group = self.groups[index].as_ref();
                debug!(group = group.name(), features = ?names, "calculating features");
                let frame = match &self.extender {
                    Some(extender) => extender.call(|| group.calculate_feature()),
                    None => group.calculate_feature(),
                };
                frame.select(&names).map_err(|column| DataError::MissingColumn {
                    group: group.name().to_string(),
                    column,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::tests::CapturedLogs;
    use serde_json::json;

    struct Broken;

    impl FeatureGroup for Broken {
        fn name(&self) -> &str {
            "BrokenFeatures"
        }

        fn description(&self) -> &str {
            "Claims a feature it never produces"
        }

        fn feature_names_supported(&self) -> &[&str] {
            &["ghost"]
        }

        fn calculate_feature(&self) -> DataFrame {
            DataFrame::new().with_column("other", vec![json!(1)])
        }
    }

    #[test]
    fn test_docs_filter_is_substring_and_case_sensitive() {
        let registry = FeatureRegistry::with_defaults();

        assert_eq!(registry.docs(None).len(), 1);
        assert_eq!(registry.docs(Some("Employee"))[0].name, "EmployeeDataFeatures");
        assert_eq!(registry.docs(Some("DataFeat")).len(), 1);
        assert!(registry.docs(Some("employee")).is_empty());
        assert!(registry.docs(Some("zzz-no-match")).is_empty());
    }

    #[test]
    fn test_run_all_selects_requested_columns_in_order() {
        let registry = FeatureRegistry::with_defaults();
        let frames = registry
            .run_all(&["salary", "employee_id", "salary"])
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].column_names(), vec!["salary", "employee_id"]);
        assert_eq!(frames[0].shape(), (10, 2));
    }

    #[test]
    fn test_run_all_rejects_unknown_and_empty_requests() {
        let registry = FeatureRegistry::with_defaults();
        assert_eq!(
            registry.run_all(&["salary", "nonexistent_feature"]),
            Err(DataError::UnresolvedFeature("nonexistent_feature".into()))
        );
        assert_eq!(
            registry.run_all::<&str>(&[]),
            Err(DataError::EmptyRequest)
        );
    }

    #[test]
    fn test_run_all_reports_missing_columns() {
        let mut registry = FeatureRegistry::new();
        registry.register(Box::new(Broken));
        assert_eq!(
            registry.run_all(&["ghost"]),
            Err(DataError::MissingColumn {
                group: "BrokenFeatures".into(),
                column: "ghost".into()
            })
        );
    }

    #[test]
    fn test_extender_observes_each_calculation() {
        let registry = FeatureRegistry::with_defaults().with_extender(ObservabilityExtender::new());
        let logs = CapturedLogs::default();
        logs.capture(|| registry.run_all(&["employee_id", "salary"]).unwrap());

        let messages = logs.messages();
        assert_eq!(
            messages
                .iter()
                .filter(|m| m.starts_with("calculate_feature elapsed="))
                .count(),
            1
        );
        assert!(messages.iter().any(|m| m.contains("(10, 5)")));
    }
}
