use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Closed date range `[start, end]`. Both boundary days are part of the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpanParts")]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("span start {start} is after end {end}")]
pub struct SpanError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize)]
struct SpanParts {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<SpanParts> for Span {
    type Error = SpanError;

    fn try_from(parts: SpanParts) -> Result<Self, Self::Error> {
        Span::new(parts.start, parts.end)
    }
}

impl Span {
    /// Every representable day.
    pub const ALL_TIME: Span = Span {
        start: NaiveDate::MIN,
        end: NaiveDate::MAX,
    };

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SpanError> {
        if start > end {
            return Err(SpanError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive on both ends: a span ending on day X overlaps one starting on day X.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains_date(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A bookable car. Identity is the registration number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub make: String,
    pub model: String,
    pub registration: String,
    /// Substitutability class used when rebooking.
    pub group: String,
    /// Guide price per day; not the price agreed on a reservation.
    pub daily_rate: f64,
}

impl Car {
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        registration: impl Into<String>,
        group: impl Into<String>,
        daily_rate: f64,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            registration: registration.into(),
            group: group.into(),
            daily_rate,
        }
    }
}

impl PartialEq for Car {
    fn eq(&self, other: &Self) -> bool {
        self.registration == other.registration
    }
}

impl Eq for Car {}

impl Hash for Car {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.registration.hash(state);
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, group {}, {:.2}/day)",
            self.make, self.model, self.registration, self.group, self.daily_rate
        )
    }
}

/// A renting customer. Identity is the driving licence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub last_name: String,
    pub first_name: String,
    pub licence: String,
    pub date_of_birth: NaiveDate,
}

impl Customer {
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        licence: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            licence: licence.into(),
            date_of_birth,
        }
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.licence == other.licence
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.licence.hash(state);
    }
}

/// Who holds a reservation. Maintenance stands in for the workshop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationKind {
    Customer(Customer),
    Maintenance,
}

/// A car held for a span of days. Never mutated; moves are remove + add.
///
/// Equality and hashing cover car, holder and span. The agreed price is
/// recorded as given and does not take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub car: Car,
    pub kind: ReservationKind,
    pub span: Span,
    pub agreed_price: Option<f64>,
}

impl Reservation {
    pub fn customer(car: Car, customer: Customer, span: Span) -> Self {
        Self {
            car,
            kind: ReservationKind::Customer(customer),
            span,
            agreed_price: None,
        }
    }

    pub fn maintenance(car: Car, span: Span) -> Self {
        Self {
            car,
            kind: ReservationKind::Maintenance,
            span,
            agreed_price: None,
        }
    }

    pub fn with_price(mut self, price: Option<f64>) -> Self {
        self.agreed_price = price;
        self
    }

    pub fn registration(&self) -> &str {
        &self.car.registration
    }

    pub fn holder(&self) -> Option<&Customer> {
        match &self.kind {
            ReservationKind::Customer(c) => Some(c),
            ReservationKind::Maintenance => None,
        }
    }

    pub fn is_maintenance(&self) -> bool {
        matches!(self.kind, ReservationKind::Maintenance)
    }

    /// Same holder, span and price on a different car.
    pub fn relocated_to(&self, car: Car) -> Self {
        Self {
            car,
            kind: self.kind.clone(),
            span: self.span,
            agreed_price: self.agreed_price,
        }
    }
}

impl PartialEq for Reservation {
    fn eq(&self, other: &Self) -> bool {
        self.car == other.car && self.kind == other.kind && self.span == other.span
    }
}

impl Eq for Reservation {}

impl Hash for Reservation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.car.hash(state);
        self.kind.hash(state);
        self.span.hash(state);
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ReservationKind::Customer(c) => write!(
                f,
                "{} for {} {} ({}) {}",
                self.car.registration, c.first_name, c.last_name, c.licence, self.span
            ),
            ReservationKind::Maintenance => {
                write!(f, "{} in maintenance {}", self.car.registration, self.span)
            }
        }
    }
}

/// What happened to one pre-existing reservation when its car was taken
/// out of service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RebookingOutcome {
    Moved {
        reason: String,
        old: Reservation,
        new: Reservation,
    },
    Cancelled {
        reason: String,
        old: Reservation,
    },
}

impl RebookingOutcome {
    pub fn reason(&self) -> &str {
        match self {
            RebookingOutcome::Moved { reason, .. } | RebookingOutcome::Cancelled { reason, .. } => {
                reason
            }
        }
    }

    pub fn old_reservation(&self) -> &Reservation {
        match self {
            RebookingOutcome::Moved { old, .. } | RebookingOutcome::Cancelled { old, .. } => old,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, RebookingOutcome::Moved { .. })
    }
}

/// Change notifications, routed by car registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    CarAdded {
        registration: String,
    },
    ReservationConfirmed {
        reservation: Reservation,
    },
    ReservationCancelled {
        reservation: Reservation,
    },
    MaintenanceScheduled {
        order: Ulid,
        reason: String,
        reservation: Reservation,
    },
}

impl Event {
    pub fn registration(&self) -> &str {
        match self {
            Event::CarAdded { registration } => registration,
            Event::ReservationConfirmed { reservation }
            | Event::ReservationCancelled { reservation }
            | Event::MaintenanceScheduled { reservation, .. } => reservation.registration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span(a: NaiveDate, b: NaiveDate) -> Span {
        Span::new(a, b).unwrap()
    }

    #[test]
    fn span_construction() {
        assert!(Span::new(day(2023, 1, 15), day(2023, 1, 16)).is_ok());
        assert!(Span::new(day(2023, 1, 15), day(2023, 1, 15)).is_ok());
        let err = Span::new(day(2023, 1, 16), day(2023, 1, 15)).unwrap_err();
        assert_eq!(err.start, day(2023, 1, 16));
    }

    #[test]
    fn span_equality() {
        let a = span(day(2023, 1, 16), day(2023, 1, 20));
        let b = span(day(2023, 1, 16), day(2023, 1, 20));
        assert_eq!(a, b);
    }

    #[test]
    fn span_overlap_is_boundary_inclusive() {
        let a = span(day(2024, 2, 19), day(2024, 2, 25));
        let touching = span(day(2024, 2, 25), day(2024, 3, 3));
        let after = span(day(2024, 2, 26), day(2024, 3, 3));
        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(!a.overlaps(&after)); // next day, no shared day
    }

    #[test]
    fn span_single_day() {
        let d = span(day(2024, 3, 1), day(2024, 3, 1));
        assert!(d.overlaps(&d));
        assert!(d.contains_date(day(2024, 3, 1)));
        assert!(!d.contains_date(day(2024, 3, 2)));
    }

    #[test]
    fn all_time_overlaps_everything() {
        let s = span(day(1900, 1, 1), day(1900, 1, 1));
        assert!(Span::ALL_TIME.overlaps(&s));
        assert!(s.overlaps(&Span::ALL_TIME));
    }

    #[test]
    fn span_deserialize_rejects_inverted() {
        let ok: Span = serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-02"}"#).unwrap();
        assert_eq!(ok.end, day(2024, 1, 2));
        let bad = serde_json::from_str::<Span>(r#"{"start":"2024-01-03","end":"2024-01-02"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn car_identity_is_registration() {
        let a = Car::new("VW", "Polo", "XX13 3UR", "A1", 65.0);
        let b = Car::new("Mini", "Cooper", "XX13 3UR", "C1", 170.0);
        assert_eq!(a, b);
    }

    #[test]
    fn reservation_equality_ignores_price() {
        let car = Car::new("VW", "Golf", "XX11 1UR", "B2", 90.0);
        let joe = Customer::new("Hydrogen", "Joe", "HYDRO010190JX8NM", day(1990, 1, 1));
        let s = span(day(2024, 2, 26), day(2024, 3, 3));
        let a = Reservation::customer(car.clone(), joe.clone(), s).with_price(Some(100.0));
        let b = Reservation::customer(car.clone(), joe, s).with_price(Some(900.0));
        assert_eq!(a, b);
        assert_ne!(a, Reservation::maintenance(car, s));
    }

    #[test]
    fn relocation_keeps_holder_span_and_price() {
        let from = Car::new("Mini", "Cooper", "XX15 5UR", "C1", 70.0);
        let to = Car::new("VW", "Passat", "XX12 2UR", "C1", 110.0);
        let joe = Customer::new("Hydrogen", "Joe", "HYDRO010190JX8NM", day(1990, 1, 1));
        let s = span(day(2024, 2, 26), day(2024, 3, 3));
        let old = Reservation::customer(from, joe.clone(), s).with_price(Some(100.0));
        let new = old.relocated_to(to.clone());
        assert_eq!(new.car, to);
        assert_eq!(new.holder(), Some(&joe));
        assert_eq!(new.span, s);
        assert_eq!(new.agreed_price, Some(100.0));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let car = Car::new("Mini", "Cooper", "XX15 5UR", "C1", 70.0);
        let s = span(day(2024, 2, 26), day(2024, 3, 3));
        let outcome = RebookingOutcome::Cancelled {
            reason: "broken".into(),
            old: Reservation::maintenance(car, s),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["reason"], "broken");
    }
}
