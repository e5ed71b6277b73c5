use std::collections::BTreeSet;

use crate::criteria::Criteria;
use crate::model::*;

use super::store::Timeline;
use super::EngineError;

pub(crate) fn check_no_conflict(timeline: &Timeline, span: &Span) -> Result<(), EngineError> {
    match timeline.overlapping(span).next() {
        Some(existing) => Err(EngineError::conflict(existing)),
        None => Ok(()),
    }
}

/// Distinct registrations held by any of `reservations`.
pub(crate) fn booked_registrations(reservations: &[Reservation]) -> BTreeSet<String> {
    reservations
        .iter()
        .map(|r| r.registration().to_string())
        .collect()
}

/// Cars that may stand in for `car`: same group, not `car` itself.
pub(crate) fn substitution_criteria(car: &Car) -> Criteria {
    Criteria::Group(car.group.clone()).and(Criteria::excluding([car.registration.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_share_group_and_skip_self() {
        let broken = Car::new("Mini", "Cooper", "XX15 5UR", "C1", 70.0);
        let passat = Car::new("VW", "Passat", "XX12 2UR", "C1", 110.0);
        let golf = Car::new("VW", "Golf", "XX11 1UR", "B2", 90.0);
        let c = substitution_criteria(&broken);
        assert!(!c.matches(&broken));
        assert!(c.matches(&passat));
        assert!(!c.matches(&golf));
    }
}
