//! Write operations and the cache entries each one invalidates.

use platformops_core::types::DbId;

use crate::cache::{QueryKey, Resource};

/// A backend write. [`Mutation::invalidates`] is the single table of
/// which cached queries go stale after it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    EvaluateAlerts,
    ResetAndEvaluate,
    GenerateRules,
    InjectAnomaly,
    AcknowledgeIncident(DbId),
    ResolveIncident(DbId),
    GroupAlerts,
    AddIncidentComment(DbId),
    /// Manual refresh of one component's detail page.
    RefreshComponent(String),
}

impl Mutation {
    /// Key prefixes to invalidate once the mutation has succeeded.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match self {
            Mutation::EvaluateAlerts | Mutation::ResetAndEvaluate => vec![
                QueryKey::new(Resource::AlertSummary),
                QueryKey::new(Resource::ActiveAlerts),
                QueryKey::new(Resource::AlertHistory),
            ],
            Mutation::GenerateRules => vec![QueryKey::new(Resource::AlertRules)],
            Mutation::InjectAnomaly => vec![
                QueryKey::new(Resource::ActiveAnomaly),
                QueryKey::new(Resource::AnomalyImpact),
                QueryKey::new(Resource::AnomalyAnalysis),
            ],
            Mutation::AcknowledgeIncident(id) | Mutation::ResolveIncident(id) => vec![
                QueryKey::new(Resource::Incidents),
                QueryKey::new(Resource::Incident).with(*id),
                QueryKey::new(Resource::IncidentTimeline).with(*id),
            ],
            Mutation::GroupAlerts => vec![QueryKey::new(Resource::Incidents)],
            Mutation::AddIncidentComment(id) => {
                vec![QueryKey::new(Resource::IncidentComments).with(*id)]
            }
            Mutation::RefreshComponent(code) => [
                Resource::ComponentDetails,
                Resource::AlertsByComponent,
                Resource::ComponentTimeAnalysis,
                Resource::ComponentRegimes,
                Resource::ComponentStress,
            ]
            .into_iter()
            .map(|resource| QueryKey::new(resource).with(code.as_str()))
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyPart;

    fn resources(mutation: Mutation) -> Vec<Resource> {
        mutation.invalidates().into_iter().map(|k| k.resource).collect()
    }

    #[test]
    fn evaluate_invalidates_alert_queries_only() {
        let expected = vec![Resource::AlertSummary, Resource::ActiveAlerts, Resource::AlertHistory];
        assert_eq!(resources(Mutation::EvaluateAlerts), expected);
        assert_eq!(resources(Mutation::ResetAndEvaluate), expected);
    }

    #[test]
    fn inject_invalidates_anomaly_queries() {
        assert_eq!(
            resources(Mutation::InjectAnomaly),
            vec![Resource::ActiveAnomaly, Resource::AnomalyImpact, Resource::AnomalyAnalysis]
        );
    }

    #[test]
    fn incident_actions_are_scoped_to_the_incident() {
        let keys = Mutation::ResolveIncident(9).invalidates();
        let detail = QueryKey::new(Resource::Incident).with(9_i64);
        let other = QueryKey::new(Resource::Incident).with(10_i64);

        assert!(keys.iter().any(|k| k.is_prefix_of(&detail)));
        assert!(!keys.iter().any(|k| k.is_prefix_of(&other)));
        assert!(keys.iter().any(|k| k.is_prefix_of(&QueryKey::new(Resource::Incidents).with("OPEN"))));
    }

    #[test]
    fn component_refresh_is_scoped_to_the_component() {
        let keys = Mutation::RefreshComponent("C3".into()).invalidates();
        assert_eq!(keys.len(), 5);
        assert!(keys.iter().all(|k| k.params == vec![KeyPart::from("C3")]));
    }
}
