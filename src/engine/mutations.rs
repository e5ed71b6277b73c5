use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};
use ulid::Ulid;

use crate::catalog::Catalog;
use crate::model::*;
use crate::observability;

use super::conflict::substitution_criteria;
use super::{record_added, Engine, EngineError, Fleet, ReservationStore};

impl<C: Catalog> Engine<C> {
    pub async fn add_car(&self, car: Car) -> Result<(), EngineError> {
        let registration = car.registration.clone();
        let mut fleet = self.fleet.write().await;
        fleet.catalog.add(car)?;
        debug!("catalog add {registration}");
        self.notify.send(
            &registration,
            &Event::CarAdded {
                registration: registration.clone(),
            },
        );
        Ok(())
    }

    /// Reserve `car` for `customer` over `span`. Fails with
    /// [`EngineError::Conflict`] if the car already has a reservation sharing
    /// any day with `span`; the store is unchanged in that case.
    pub async fn book(
        &self,
        car: &Car,
        customer: &Customer,
        span: Span,
        agreed_price: Option<f64>,
    ) -> Result<Reservation, EngineError> {
        let reservation =
            Reservation::customer(car.clone(), customer.clone(), span).with_price(agreed_price);
        let mut fleet = self.fleet.write().await;
        self.confirm(&mut fleet.store, reservation.clone())?;
        Ok(reservation)
    }

    /// Returns whether the reservation existed.
    pub async fn cancel(&self, reservation: &Reservation) -> bool {
        let mut fleet = self.fleet.write().await;
        self.retract(&mut fleet.store, reservation)
    }

    /// Take `car` out of service for `span`.
    ///
    /// Each reservation on `car` overlapping `span` is moved to the first
    /// free car of the same group (catalog order), or cancelled when none is
    /// free. Moves commit one by one; a later cancellation never undoes an
    /// earlier move. The maintenance reservation is inserted last.
    /// Outcomes come back in the order the conflicts were found.
    pub async fn book_maintenance(
        &self,
        reason: &str,
        car: &Car,
        span: Span,
    ) -> Result<Vec<RebookingOutcome>, EngineError> {
        let started = Instant::now();
        let order = Ulid::new();
        let mut fleet = self.fleet.write().await;
        let result = self.schedule_maintenance(&mut fleet, order, reason, car, span);
        metrics::histogram!(observability::MAINTENANCE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    pub(super) fn schedule_maintenance(
        &self,
        fleet: &mut Fleet<C>,
        order: Ulid,
        reason: &str,
        car: &Car,
        span: Span,
    ) -> Result<Vec<RebookingOutcome>, EngineError> {
        let _entered = info_span!("maintenance", %order, registration = %car.registration).entered();

        let maintenance = Reservation::maintenance(car.clone(), span);
        let conflicts = fleet.store.conflicts(car, &span);
        let substitutes = substitution_criteria(car);
        let mut outcomes = Vec::with_capacity(conflicts.len());

        for conflict in conflicts {
            let alternative = fleet.available(&substitutes, &conflict.span).into_iter().next();

            match alternative {
                Some(alt) => {
                    let moved = conflict.relocated_to(alt);
                    if let Err(e) = fleet.store.move_reservation(&conflict, moved.clone()) {
                        error!("substitute rejected for {conflict}: {e}");
                        return Err(EngineError::InvariantViolation(format!(
                            "free substitute {} rejected {conflict}",
                            moved.registration()
                        )));
                    }
                    self.announce_move(&fleet.store, &conflict, &moved);
                    info!("moved {conflict} to {}", moved.registration());
                    metrics::counter!(observability::MAINTENANCE_OUTCOMES_TOTAL, "outcome" => "moved")
                        .increment(1);
                    outcomes.push(RebookingOutcome::Moved {
                        reason: reason.to_string(),
                        old: conflict,
                        new: moved,
                    });
                }
                None => {
                    let removed = self.retract(&mut fleet.store, &conflict);
                    debug_assert!(removed, "conflict vanished under the write lock");
                    if !removed {
                        error!("conflicting {conflict} missing from store");
                        return Err(EngineError::InvariantViolation(format!(
                            "{conflict} reported as conflict but not stored"
                        )));
                    }
                    warn!("cancelled {conflict}: no free car in group {}", car.group);
                    metrics::counter!(observability::MAINTENANCE_OUTCOMES_TOTAL, "outcome" => "cancelled")
                        .increment(1);
                    outcomes.push(RebookingOutcome::Cancelled {
                        reason: reason.to_string(),
                        old: conflict,
                    });
                }
            }
        }

        if let Err(e) = fleet.store.add(maintenance.clone()) {
            error!("maintenance insert failed after clearing conflicts: {e}");
            return Err(EngineError::InvariantViolation(format!(
                "{maintenance} still conflicts: {e}"
            )));
        }
        record_added(&fleet.store);
        info!(
            moved = outcomes.iter().filter(|o| o.is_moved()).count(),
            cancelled = outcomes.iter().filter(|o| !o.is_moved()).count(),
            "{maintenance} scheduled: {reason}"
        );
        self.notify.send(
            car.registration.as_str(),
            &Event::MaintenanceScheduled {
                order,
                reason: reason.to_string(),
                reservation: maintenance,
            },
        );
        Ok(outcomes)
    }

    fn announce_move(&self, store: &ReservationStore, old: &Reservation, new: &Reservation) {
        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        record_added(store);
        self.notify.send(
            old.registration(),
            &Event::ReservationCancelled {
                reservation: old.clone(),
            },
        );
        self.notify.send(
            new.registration(),
            &Event::ReservationConfirmed {
                reservation: new.clone(),
            },
        );
    }
}
