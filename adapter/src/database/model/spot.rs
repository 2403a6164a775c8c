use kernel::model::id::SpotNumber;

/// Physical flag, or an entry linked to a reservation of the spot that has
/// no exit recorded after it. `$1` is a reservation whose own entries are
/// ignored (bind `None` to count them all).
pub const SPOT_OCCUPANCY_SELECT: &str = r#"
    SELECT
        p.spot_number,
        (p.occupied OR EXISTS (
            SELECT 1
            FROM access_events e
            INNER JOIN reservations r ON r.reservation_id = e.reservation_id
            WHERE r.spot_number = p.spot_number
              AND e.event_type = 'entry'
              AND e.reservation_id IS DISTINCT FROM $1
              AND NOT EXISTS (
                  SELECT 1
                  FROM access_events x
                  WHERE x.reservation_id = e.reservation_id
                    AND x.event_type = 'exit'
                    AND x.occurred_at >= e.occurred_at
              )
        )) AS occupied
    FROM parking_spots p
"#;

#[derive(sqlx::FromRow)]
pub struct SpotOccupancyRow {
    pub spot_number: SpotNumber,
    pub occupied: bool,
}
