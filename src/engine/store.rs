use std::collections::BTreeMap;

use tracing::debug;

use crate::model::*;

use super::conflict::check_no_conflict;
use super::EngineError;

/// One car's reservations, sorted by `span.start`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    entries: Vec<Reservation>,
}

impl Timeline {
    /// Insert maintaining sort order by span.start.
    fn insert(&mut self, reservation: Reservation) {
        let pos = self
            .entries
            .binary_search_by_key(&reservation.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.entries.insert(pos, reservation);
    }

    fn remove(&mut self, reservation: &Reservation) -> bool {
        if let Some(pos) = self.entries.iter().position(|r| r == reservation) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Reservations sharing at least one day with `query`.
    /// Binary search skips everything starting after `query.end`.
    pub(crate) fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Reservation> {
        let query = *query;
        let right_bound = self.entries.partition_point(|r| r.span.start <= query.end);
        self.entries[..right_bound]
            .iter()
            .filter(move |r| r.span.end >= query.start)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Saved timelines for a compound operation, restored verbatim on failure.
struct Snapshot(Vec<(String, Option<Timeline>)>);

/// The set of live reservations, keyed by car registration.
///
/// Reads return owned copies. Mutators take `&mut self`; callers sharing a
/// store wrap it in one lock so that check-then-insert cannot interleave.
#[derive(Debug, Clone, Default)]
pub struct ReservationStore {
    timelines: BTreeMap<String, Timeline>,
}

impl ReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timelines.values().map(|t| t.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    // ── Queries ──────────────────────────────────────────────

    /// Ordered by registration, then start date.
    pub fn list_all(&self) -> Vec<Reservation> {
        self.timelines
            .values()
            .flat_map(|t| t.entries.iter().cloned())
            .collect()
    }

    pub fn for_registration(&self, registration: &str) -> Vec<Reservation> {
        self.timelines
            .get(registration)
            .map(|t| t.entries.clone())
            .unwrap_or_default()
    }

    pub fn overlapping(&self, span: &Span) -> Vec<Reservation> {
        self.timelines
            .values()
            .flat_map(|t| t.overlapping(span).cloned())
            .collect()
    }

    pub fn overlapping_car(&self, span: &Span, car: &Car) -> Vec<Reservation> {
        self.timelines
            .get(&car.registration)
            .map(|t| t.overlapping(span).cloned().collect())
            .unwrap_or_default()
    }

    /// Everything that would block booking `car` over `span`.
    pub fn conflicts(&self, car: &Car, span: &Span) -> Vec<Reservation> {
        self.overlapping_car(span, car)
    }

    // ── Mutations ────────────────────────────────────────────

    pub fn add(&mut self, reservation: Reservation) -> Result<(), EngineError> {
        if let Some(timeline) = self.timelines.get(reservation.registration()) {
            check_no_conflict(timeline, &reservation.span)?;
        }
        debug!("store add {reservation}");
        self.timelines
            .entry(reservation.registration().to_string())
            .or_default()
            .insert(reservation);
        Ok(())
    }

    /// Returns whether a matching reservation was present.
    pub fn remove(&mut self, reservation: &Reservation) -> bool {
        let Some(timeline) = self.timelines.get_mut(reservation.registration()) else {
            return false;
        };
        let removed = timeline.remove(reservation);
        if timeline.is_empty() {
            self.timelines.remove(reservation.registration());
        }
        if removed {
            debug!("store remove {reservation}");
        }
        removed
    }

    /// Remove `old`, add `new`. On conflict the store is left exactly as it was.
    pub fn move_reservation(&mut self, old: &Reservation, new: Reservation) -> Result<(), EngineError> {
        let snapshot = self.snapshot(&[old.registration(), new.registration()]);
        self.remove(old);
        if let Err(cause) = self.add(new) {
            self.restore(snapshot);
            return Err(EngineError::MoveFailed(Box::new(cause)));
        }
        Ok(())
    }

    /// Remove `old_customer`, add `new_customer`, add `maintenance`, all or
    /// nothing. Any failure restores the pre-call state.
    pub fn maintenance_swap(
        &mut self,
        maintenance: Reservation,
        old_customer: &Reservation,
        new_customer: Reservation,
    ) -> Result<(), EngineError> {
        let snapshot = self.snapshot(&[
            maintenance.registration(),
            old_customer.registration(),
            new_customer.registration(),
        ]);
        self.remove(old_customer);
        let result = self
            .add(new_customer)
            .and_then(|()| self.add(maintenance));
        if let Err(cause) = result {
            self.restore(snapshot);
            return Err(EngineError::SwapFailed(Box::new(cause)));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.timelines.clear();
    }

    fn snapshot(&self, registrations: &[&str]) -> Snapshot {
        let mut saved: Vec<(String, Option<Timeline>)> = Vec::with_capacity(registrations.len());
        for reg in registrations {
            if saved.iter().any(|(r, _)| r == reg) {
                continue;
            }
            saved.push((reg.to_string(), self.timelines.get(*reg).cloned()));
        }
        Snapshot(saved)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        for (reg, timeline) in snapshot.0 {
            match timeline {
                Some(t) => {
                    self.timelines.insert(reg, t);
                }
                None => {
                    self.timelines.remove(&reg);
                }
            }
        }
    }
}
