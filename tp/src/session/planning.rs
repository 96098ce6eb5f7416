//! Planning step - a derived, coarse-grained view of progress
//!
//! Not a second state machine: the step is recomputed from TripFacts, the
//! machine state and the search count every time it is read.

use serde::{Deserialize, Serialize};

use crate::orchestrator::{OrchestratorState, StateName};
use crate::resolver::{FieldId, ResolverOptions, missing_fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanningStep {
    Destination,
    Dates,
    Travelers,
    TripType,
    Search,
    Recap,
}

impl std::fmt::Display for PlanningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Destination => "destination",
            Self::Dates => "dates",
            Self::Travelers => "travelers",
            Self::TripType => "tripType",
            Self::Search => "search",
            Self::Recap => "recap",
        };
        write!(f, "{}", name)
    }
}

pub fn planning_step(state: &OrchestratorState, options: &ResolverOptions) -> PlanningStep {
    match missing_fields(state.facts(), options).first() {
        Some(FieldId::Destination | FieldId::LegDestination(_)) => PlanningStep::Destination,
        Some(FieldId::DepartureDate | FieldId::ReturnDate | FieldId::LegDate(_)) => PlanningStep::Dates,
        Some(FieldId::Travelers) => PlanningStep::Travelers,
        Some(FieldId::TripTypeConfirmation) => PlanningStep::TripType,
        None if state.name() == StateName::Idle && state.searches_completed() > 0 => PlanningStep::Recap,
        None => PlanningStep::Search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{City, IntentEntities};
    use crate::orchestrator::{Event, Orchestrator};

    #[test]
    fn test_steps_follow_missing_fields() {
        let mut orch = Orchestrator::default();
        assert_eq!(planning_step(orch.state(), orch.options()), PlanningStep::Destination);

        orch.dispatch(Event::intent(IntentEntities {
            destination: Some(City::named("Paris")),
            ..Default::default()
        }));
        assert_eq!(planning_step(orch.state(), orch.options()), PlanningStep::Dates);
    }

    #[test]
    fn test_recap_after_successful_search() {
        let mut orch = Orchestrator::default();
        orch.dispatch(Event::intent(IntentEntities {
            destination: Some(City::named("Paris")),
            departure_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
            return_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 8),
            travelers: Some(crate::domain::Travelers::new(1, 0, 0)),
            ..Default::default()
        }));
        assert_eq!(planning_step(orch.state(), orch.options()), PlanningStep::TripType);

        orch.dispatch(Event::TripTypeConfirmed {
            trip_type: crate::domain::TripType::Roundtrip,
        });
        assert_eq!(planning_step(orch.state(), orch.options()), PlanningStep::Search);

        orch.dispatch(Event::SearchTriggered);
        orch.dispatch(Event::SearchSucceeded);
        assert_eq!(planning_step(orch.state(), orch.options()), PlanningStep::Recap);
    }
}
