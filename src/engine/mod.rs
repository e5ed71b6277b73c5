mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use error::EngineError;
pub use store::ReservationStore;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::catalog::{Catalog, InMemoryCatalog};
use crate::criteria::Criteria;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability;

use conflict::booked_registrations;

/// Catalog and reservations, always locked together.
pub(crate) struct Fleet<C> {
    pub(crate) catalog: C,
    pub(crate) store: ReservationStore,
}

impl<C: Catalog> Fleet<C> {
    /// Cars matching `criteria` with no reservation sharing a day with `span`,
    /// in catalog order.
    pub(crate) fn available(&self, criteria: &Criteria, span: &Span) -> Vec<Car> {
        let booked = booked_registrations(&self.store.overlapping(span));
        let combined = criteria.clone().and(Criteria::Exclude(booked));
        self.catalog.filtered_list(&combined)
    }
}

/// Allocates cars to reservations.
///
/// One coarse lock covers the catalog and the store. Reads hold the read
/// guard and hand back owned snapshots; every write, including the whole
/// maintenance workflow, holds the write guard until it completes.
pub struct Engine<C = InMemoryCatalog> {
    fleet: RwLock<Fleet<C>>,
    pub notify: Arc<NotifyHub>,
}

impl Engine<InMemoryCatalog> {
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self::with_catalog(InMemoryCatalog::new(), notify)
    }
}

impl<C: Catalog> Engine<C> {
    pub fn with_catalog(catalog: C, notify: Arc<NotifyHub>) -> Self {
        Self {
            fleet: RwLock::new(Fleet {
                catalog,
                store: ReservationStore::new(),
            }),
            notify,
        }
    }

    /// Store add + metrics + notify in one call. Caller holds the write lock.
    pub(super) fn confirm(
        &self,
        store: &mut ReservationStore,
        reservation: Reservation,
    ) -> Result<(), EngineError> {
        if let Err(e) = store.add(reservation.clone()) {
            metrics::counter!(observability::RESERVATION_CONFLICTS_TOTAL).increment(1);
            warn!("rejected {reservation}: {e}");
            return Err(e);
        }
        record_added(store);
        let registration = reservation.registration().to_string();
        self.notify
            .send(&registration, &Event::ReservationConfirmed { reservation });
        Ok(())
    }

    /// Store remove + metrics + notify. Caller holds the write lock.
    pub(super) fn retract(&self, store: &mut ReservationStore, reservation: &Reservation) -> bool {
        if !store.remove(reservation) {
            return false;
        }
        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(store.len() as f64);
        self.notify.send(
            reservation.registration(),
            &Event::ReservationCancelled {
                reservation: reservation.clone(),
            },
        );
        true
    }
}

/// Metrics for one reservation entering the store.
pub(super) fn record_added(store: &ReservationStore) {
    metrics::counter!(observability::RESERVATIONS_CONFIRMED_TOTAL).increment(1);
    metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(store.len() as f64);
}
