//! Target-set shapes.
//!
//! Pure functions over the roster. Every shape returns living units only, in
//! a deterministic order (distance, then id) so logs replay identically.

use crate::action::targeting::TargetFilter;
use crate::state::{Position, Unit, UnitId};

fn sorted_by_distance(mut hits: Vec<(u32, UnitId)>) -> Vec<UnitId> {
    hits.sort();
    hits.into_iter().map(|(_, id)| id).collect()
}

/// Living units within `radius` of `center` that `filter` accepts for `user`.
pub fn in_radius(
    units: &[Unit],
    user: &Unit,
    center: Position,
    radius: u32,
    filter: TargetFilter,
) -> Vec<UnitId> {
    let hits = units
        .iter()
        .filter(|u| u.is_alive())
        .filter(|u| center.distance(u.position) <= radius)
        .filter(|u| filter.accepts(user, Some(u)))
        .map(|u| (center.distance(u.position), u.id))
        .collect();
    sorted_by_distance(hits)
}

/// Units on a straight band from `user` toward `toward`.
///
/// The band runs along the dominant axis for `length` tiles and is `width`
/// tiles wide, centred on the axis. The user's own tile is excluded.
pub fn line(
    units: &[Unit],
    user: &Unit,
    toward: Position,
    length: u32,
    width: u32,
    filter: TargetFilter,
) -> Vec<UnitId> {
    let (dx, dy) = user.position.cardinal_toward(toward);
    if (dx, dy) == (0, 0) {
        return Vec::new();
    }
    let half = (width.max(1) as i32 - 1) / 2;
    let (px, py) = (-dy, dx);

    let mut tiles = Vec::new();
    for step in 1..=length as i32 {
        for lateral in -half..=half {
            tiles.push(
                user.position
                    .offset(dx * step + px * lateral, dy * step + py * lateral),
            );
        }
    }

    let hits = units
        .iter()
        .filter(|u| u.is_alive() && u.id != user.id)
        .filter(|u| tiles.contains(&u.position))
        .filter(|u| filter.accepts(user, Some(u)))
        .map(|u| (user.position.distance(u.position), u.id))
        .collect();
    sorted_by_distance(hits)
}

/// Units inside a cone opening from `user` toward `toward`.
///
/// `angle` is the full aperture in degrees around the dominant axis.
pub fn cone(
    units: &[Unit],
    user: &Unit,
    toward: Position,
    length: u32,
    angle: u32,
    filter: TargetFilter,
) -> Vec<UnitId> {
    let (dx, dy) = user.position.cardinal_toward(toward);
    if (dx, dy) == (0, 0) {
        return Vec::new();
    }
    let half_angle = (f64::from(angle.min(360)) / 2.0).to_radians();
    let min_cos = half_angle.cos() - 1e-9;

    let hits = units
        .iter()
        .filter(|u| u.is_alive() && u.id != user.id)
        .filter(|u| {
            let distance = user.position.distance(u.position);
            if distance == 0 || distance > length {
                return false;
            }
            let vx = f64::from(u.position.x - user.position.x);
            let vy = f64::from(u.position.y - user.position.y);
            let cos = (vx * f64::from(dx) + vy * f64::from(dy)) / (vx * vx + vy * vy).sqrt();
            cos >= min_cos
        })
        .filter(|u| filter.accepts(user, Some(u)))
        .map(|u| (user.position.distance(u.position), u.id))
        .collect();
    sorted_by_distance(hits)
}

/// A chain starting at `first`, each hop jumping to the nearest unvisited
/// unit within `jump` tiles of the previous link.
pub fn chain(
    units: &[Unit],
    user: &Unit,
    first: UnitId,
    max_targets: u32,
    jump: u32,
    filter: TargetFilter,
) -> Vec<UnitId> {
    let Some(start) = units.iter().find(|u| u.id == first && u.is_alive()) else {
        return Vec::new();
    };
    let mut links = vec![start.id];
    let mut last = start.position;

    while (links.len() as u32) < max_targets {
        let next = units
            .iter()
            .filter(|u| u.is_alive() && u.id != user.id && !links.contains(&u.id))
            .filter(|u| last.distance(u.position) <= jump)
            .filter(|u| filter.accepts(user, Some(u)))
            .min_by_key(|u| (last.distance(u.position), u.id));
        let Some(next) = next else {
            break;
        };
        links.push(next.id);
        last = next.position;
    }
    links
}

/// The closest living enemy of `user`, ties broken by id.
pub fn nearest_enemy(units: &[Unit], user: &Unit) -> Option<UnitId> {
    units
        .iter()
        .filter(|u| u.is_alive() && user.is_enemy_of(u))
        .min_by_key(|u| (user.position.distance(u.position), u.id))
        .map(|u| u.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Side;
    use crate::testing::unit_at;

    fn enemy(id: u32, x: i32, y: i32) -> Unit {
        let mut unit = unit_at(UnitId(id), Position::new(x, y));
        unit.side = Side::Opponent;
        unit
    }

    #[test]
    fn radius_orders_by_distance_and_filters_sides() {
        let user = unit_at(UnitId(1), Position::new(0, 0));
        let units = vec![
            user.clone(),
            enemy(2, 4, 4),
            enemy(3, 5, 4),
            enemy(4, 4, 6),
            unit_at(UnitId(5), Position::new(4, 3)),
        ];
        let hits = in_radius(&units, &user, Position::new(4, 4), 1, TargetFilter::Enemy);
        assert_eq!(hits, vec![UnitId(2), UnitId(3)]);
    }

    #[test]
    fn line_follows_the_dominant_axis() {
        let user = unit_at(UnitId(1), Position::new(0, 0));
        let units = vec![user.clone(), enemy(2, 2, 0), enemy(3, 2, 1), enemy(4, 5, 0)];
        assert_eq!(
            line(&units, &user, Position::new(3, 0), 3, 1, TargetFilter::Enemy),
            vec![UnitId(2)]
        );
        assert_eq!(
            line(&units, &user, Position::new(3, 0), 3, 3, TargetFilter::Enemy),
            vec![UnitId(2), UnitId(3)]
        );
    }

    #[test]
    fn cone_respects_aperture() {
        let user = unit_at(UnitId(1), Position::new(0, 0));
        let units = vec![user.clone(), enemy(2, 2, 1), enemy(3, 1, 2), enemy(4, -1, 0)];
        // 90 degrees: |lateral| <= forward
        assert_eq!(
            cone(&units, &user, Position::new(1, 0), 3, 90, TargetFilter::Enemy),
            vec![UnitId(2)]
        );
    }

    #[test]
    fn chain_hops_to_nearest_unvisited() {
        let user = unit_at(UnitId(1), Position::new(0, 0));
        let units = vec![
            user.clone(),
            enemy(2, 3, 0),
            enemy(3, 5, 0),
            enemy(4, 4, 1),
            enemy(5, 9, 9),
        ];
        assert_eq!(
            chain(&units, &user, UnitId(2), 4, 2, TargetFilter::Enemy),
            vec![UnitId(2), UnitId(4), UnitId(3)]
        );
    }

    #[test]
    fn nearest_enemy_ignores_allies() {
        let user = unit_at(UnitId(1), Position::new(0, 0));
        let units = vec![user.clone(), unit_at(UnitId(2), Position::new(1, 0)), enemy(3, 3, 0)];
        assert_eq!(nearest_enemy(&units, &user), Some(UnitId(3)));
    }
}
