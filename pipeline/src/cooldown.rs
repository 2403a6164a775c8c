use std::{collections::HashMap, time::Duration};

use kernel::model::plate::Plate;
use tokio::time::Instant;

/// Remembers plates that were just admitted so that the same car seen on
/// consecutive frames is registered only once.
#[derive(Debug)]
pub struct EntryCooldown {
    window: Duration,
    admitted: HashMap<Plate, Instant>,
}

impl EntryCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            admitted: HashMap::new(),
        }
    }

    pub fn is_cooling_down(&self, plate: &Plate, now: Instant) -> bool {
        self.admitted
            .get(plate)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.window)
    }

    pub fn record(&mut self, plate: Plate, now: Instant) {
        let window = self.window;
        self.admitted
            .retain(|_, at| now.saturating_duration_since(*at) < window);
        self.admitted.insert(plate, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_blocked_only_inside_the_window() {
        let plate = Plate::parse("ABC123").unwrap();
        let other = Plate::parse("VIS111").unwrap();
        let start = Instant::now();
        let mut cooldown = EntryCooldown::new(Duration::from_secs(30));

        cooldown.record(plate.clone(), start);
        assert!(cooldown.is_cooling_down(&plate, start + Duration::from_secs(29)));
        assert!(!cooldown.is_cooling_down(&plate, start + Duration::from_secs(30)));
        assert!(!cooldown.is_cooling_down(&other, start));
    }

    #[test]
    fn zero_window_disables_the_cooldown() {
        let plate = Plate::parse("ABC123").unwrap();
        let now = Instant::now();
        let mut cooldown = EntryCooldown::new(Duration::ZERO);
        cooldown.record(plate.clone(), now);
        assert!(!cooldown.is_cooling_down(&plate, now));
    }
}
