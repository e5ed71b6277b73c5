use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// ── Reservation flow ────────────────────────────────────────────

/// Counter: reservations added to the store (bookings and maintenance moves).
pub const RESERVATIONS_CONFIRMED_TOTAL: &str = "fleetbook_reservations_confirmed_total";

/// Counter: reservations removed from the store.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "fleetbook_reservations_cancelled_total";

/// Counter: bookings rejected because the car was already reserved.
pub const RESERVATION_CONFLICTS_TOTAL: &str = "fleetbook_reservation_conflicts_total";

/// Gauge: reservations currently held, maintenance included.
pub const RESERVATIONS_ACTIVE: &str = "fleetbook_reservations_active";

// ── Maintenance ─────────────────────────────────────────────────

/// Counter: rebooking outcomes. Labels: outcome (moved | cancelled).
pub const MAINTENANCE_OUTCOMES_TOTAL: &str = "fleetbook_maintenance_outcomes_total";

/// Histogram: wall time of one maintenance booking, lock wait included, in seconds.
pub const MAINTENANCE_DURATION_SECONDS: &str = "fleetbook_maintenance_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
