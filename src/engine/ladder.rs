use super::predicates::Ranked;
use rand::seq::SliceRandom;
use rand::Rng;

/// Walk the radii smallest first and pick uniformly among the candidates
/// within the first radius that has any.
pub fn pick_from_ladder<R: Rng>(
    mut pool: Vec<Ranked>,
    radii: &[f64],
    rng: &mut R,
) -> Option<Ranked> {
    for &radius in radii {
        let mut ring: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, ranked)| ranked.distance <= radius)
            .map(|(index, _)| index)
            .collect();

        if ring.is_empty() {
            continue;
        }

        tracing::debug!("{} candidates within {} miles", ring.len(), radius);
        ring.shuffle(rng);
        let pick = ring[rng.gen_range(0..ring.len())];
        return Some(pool.swap_remove(pick));
    }
    None
}

/// Uniform pick among candidates within `radius`.
pub fn pick_within<R: Rng>(pool: Vec<Ranked>, radius: f64, rng: &mut R) -> Option<Ranked> {
    pick_from_ladder(pool, &[radius], rng)
}

/// The earliest-starting candidate within `radius`; ties keep pool order.
pub fn pick_soonest_within(pool: Vec<Ranked>, radius: f64) -> Option<Ranked> {
    pool.into_iter()
        .filter(|ranked| ranked.distance <= radius)
        .min_by_key(|ranked| {
            let start = ranked.candidate.start_time();
            (start.is_none(), start)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::Schedule;
    use crate::model::{Candidate, Event, Place};
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ranked_place(id: &str, distance: f64) -> Ranked {
        Ranked {
            candidate: Candidate::Place(Place {
                id: Some(id.to_string()),
                name: id.to_string(),
                address: None,
                lat: 37.77,
                lng: -122.42,
                description: None,
                our_description: None,
                tags: Vec::new(),
                hours: Schedule::default(),
                emoji: None,
            }),
            distance,
        }
    }

    fn ranked_event(id: &str, distance: f64, start_hour: u32) -> Ranked {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, start_hour, 0, 0).unwrap();
        Ranked {
            candidate: Candidate::Event(Event {
                id: Some(id.to_string()),
                title: id.to_string(),
                description: None,
                address: None,
                lat: 37.77,
                lng: -122.42,
                start_time: start,
                end_time: start + Duration::hours(1),
                cost: None,
                cost_label: None,
                urls: Vec::new(),
                emoji: None,
            }),
            distance,
        }
    }

    const LADDER: [f64; 6] = [0.5, 1.0, 1.5, 2.0, 3.0, 5.0];

    #[test]
    fn test_smallest_populated_radius_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pool = vec![
                ranked_place("far", 2.5),
                ranked_place("mid", 1.2),
                ranked_place("mid2", 1.4),
                ranked_place("outside", 6.0),
            ];
            let picked = pick_from_ladder(pool, &LADDER, &mut rng).unwrap();
            assert!(
                picked.distance <= 1.5,
                "picked {} at {}",
                picked.candidate.name(),
                picked.distance
            );
        }
    }

    #[test]
    fn test_nothing_inside_largest_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = vec![ranked_place("outside", 5.01)];
        assert!(pick_from_ladder(pool, &LADDER, &mut rng).is_none());
        assert!(pick_from_ladder(Vec::new(), &LADDER, &mut rng).is_none());
    }

    #[test]
    fn test_pick_is_spread_across_ring() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let pool = vec![
                ranked_place("a", 0.1),
                ranked_place("b", 0.2),
                ranked_place("c", 0.3),
            ];
            let picked = pick_from_ladder(pool, &LADDER, &mut rng).unwrap();
            seen.insert(picked.candidate.name().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_radius_boundary_inclusive() {
        let mut rng = StdRng::seed_from_u64(3);
        let picked = pick_within(vec![ranked_place("edge", 7.0)], 7.0, &mut rng);
        assert!(picked.is_some());
    }

    #[test]
    fn test_soonest_within() {
        let pool = vec![
            ranked_event("late", 1.0, 22),
            ranked_event("early_far", 8.0, 18),
            ranked_event("early", 3.0, 19),
            ranked_event("early_tie", 2.0, 19),
        ];
        let picked = pick_soonest_within(pool, 7.0).unwrap();
        assert_eq!(picked.candidate.name(), "early");
    }
}
