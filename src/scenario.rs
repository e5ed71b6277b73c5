//! Replays a JSON script of fleet operations against an engine.
//!
//! ```json
//! { "steps": [
//!     { "op": "add_car", "car": { "make": "VW", "model": "Polo", "registration": "XX13 3UR",
//!                                 "group": "A1", "daily_rate": 65.0 } },
//!     { "op": "book", "registration": "XX13 3UR", "customer": { ... },
//!       "span": { "start": "2024-02-26", "end": "2024-03-03" }, "agreed_price": 100.0 },
//!     { "op": "maintenance", "registration": "XX13 3UR", "reason": "broken",
//!       "span": { "start": "2024-02-26", "end": "2024-03-03" } }
//! ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::engine::{Engine, EngineError};
use crate::model::*;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("reading scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddCar {
        car: Car,
    },
    Book {
        registration: String,
        customer: Customer,
        span: Span,
        #[serde(default)]
        agreed_price: Option<f64>,
    },
    Cancel {
        registration: String,
        customer: Customer,
        span: Span,
    },
    Maintenance {
        registration: String,
        reason: String,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepReport {
    CarAdded { registration: String },
    Booked { reservation: Reservation },
    Cancelled { registration: String, existed: bool },
    Maintenance { registration: String, outcomes: Vec<RebookingOutcome> },
    Rejected { step: usize, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepReport>,
    /// Store contents after the last step.
    pub reservations: Vec<Reservation>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Apply every step in order. Ordinary failures (unknown car, conflict,
/// duplicate registration) become `Rejected` entries; only an engine
/// invariant violation aborts the run.
pub async fn run<C: Catalog>(engine: &Engine<C>, scenario: Scenario) -> Result<ScenarioReport, ScenarioError> {
    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.into_iter().enumerate() {
        let report = match apply(engine, step).await {
            Ok(report) => report,
            Err(e @ EngineError::InvariantViolation(_)) => return Err(e.into()),
            Err(e) => {
                warn!("step {index} rejected: {e}");
                StepReport::Rejected {
                    step: index,
                    reason: e.to_string(),
                }
            }
        };
        steps.push(report);
    }
    let reservations = engine.all_reservations().await;
    info!("scenario applied: {} steps, {} reservations", steps.len(), reservations.len());
    Ok(ScenarioReport { steps, reservations })
}

async fn apply<C: Catalog>(engine: &Engine<C>, step: Step) -> Result<StepReport, EngineError> {
    match step {
        Step::AddCar { car } => {
            let registration = car.registration.clone();
            engine.add_car(car).await?;
            Ok(StepReport::CarAdded { registration })
        }
        Step::Book {
            registration,
            customer,
            span,
            agreed_price,
        } => {
            let car = lookup(engine, &registration).await?;
            let reservation = engine.book(&car, &customer, span, agreed_price).await?;
            Ok(StepReport::Booked { reservation })
        }
        Step::Cancel {
            registration,
            customer,
            span,
        } => {
            let car = lookup(engine, &registration).await?;
            let existed = engine
                .cancel(&Reservation::customer(car, customer, span))
                .await;
            Ok(StepReport::Cancelled {
                registration,
                existed,
            })
        }
        Step::Maintenance {
            registration,
            reason,
            span,
        } => {
            let car = lookup(engine, &registration).await?;
            let outcomes = engine.book_maintenance(&reason, &car, span).await?;
            Ok(StepReport::Maintenance {
                registration,
                outcomes,
            })
        }
    }
}

async fn lookup<C: Catalog>(engine: &Engine<C>, registration: &str) -> Result<Car, EngineError> {
    engine
        .find_car(registration)
        .await
        .ok_or_else(|| EngineError::NotFound(registration.to_string()))
}
