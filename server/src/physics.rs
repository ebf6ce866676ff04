//! Puck simulation: movement, wall reflection, goal detection.

use crate::session::Session;
use log::{debug, info};
use rand::Rng;
use shared::{Rect, GOAL_PROTRUDE, GOAL_SIZE, PUCK_SIZE, PUCK_SPEED, TABLE_SIZE};

/// Table edge, numbered like the cardinal travel directions
/// (0 = +y, 1 = +x, 2 = -y, 3 = -x).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

/// New travel direction after the puck hits `wall`.
///
/// A puck travelling on a cardinal axis, or carrying a degree outside
/// `[0, 360)`, leaves in a uniformly random direction. Angles the reflection
/// table does not cover do the same.
pub fn calculate_degree<R: Rng + ?Sized>(degree: i32, wall: Wall, rng: &mut R) -> i32 {
    if matches!(degree, 0 | 90 | 180 | 270) || !(0..360).contains(&degree) {
        return rng.gen_range(0..360);
    }
    match wall {
        Wall::Top if degree < 90 => degree + 90,
        Wall::Top if degree > 270 => degree - 90,
        Wall::Right if degree < 90 => degree + 270,
        Wall::Right if degree < 180 => degree + 90,
        Wall::Bottom if degree < 180 => degree - 90,
        Wall::Bottom if degree < 270 => degree + 90,
        Wall::Left if degree < 270 => degree - 90,
        Wall::Left if degree < 360 => degree - 270,
        _ => rng.gen_range(0..360),
    }
}

/// Goal rectangles paired with the player_num credited when the puck
/// enters them, in the order they are checked.
pub fn goals() -> [(Rect, usize); 4] {
    [
        (Rect::new(0.0, TABLE_SIZE / 2.0, GOAL_PROTRUDE, GOAL_SIZE), 3),
        (
            Rect::new(TABLE_SIZE - PUCK_SIZE, TABLE_SIZE / 2.0, GOAL_PROTRUDE, GOAL_SIZE),
            1,
        ),
        (Rect::new(TABLE_SIZE / 2.0, TABLE_SIZE, GOAL_SIZE, GOAL_PROTRUDE), 0),
        (Rect::new(TABLE_SIZE / 2.0, 0.0, GOAL_SIZE, GOAL_PROTRUDE), 2),
    ]
}

/// Displacement for one frame.
///
/// A non-zero offset from the cardinal axis pushes the puck along both axes
/// by `amount + offset`.
fn displacement(direction: i32, amount: f64, offset: f64) -> (f64, f64) {
    if offset == 0.0 {
        match direction {
            0 => (0.0, amount),
            1 => (amount, 0.0),
            2 => (0.0, -amount),
            _ => (-amount, 0.0),
        }
    } else {
        let step = amount + offset;
        match direction {
            0 => (step, step),
            1 => (step, -step),
            2 => (-step, -step),
            _ => (-step, step),
        }
    }
}

fn wall_hit(puck: &Rect) -> Option<Wall> {
    if puck.right >= TABLE_SIZE {
        Some(Wall::Right)
    } else if puck.left <= 0.0 {
        Some(Wall::Left)
    } else if puck.top >= TABLE_SIZE {
        Some(Wall::Top)
    } else if puck.bottom <= 0.0 {
        Some(Wall::Bottom)
    } else {
        None
    }
}

/// Advances one session to `now` (seconds). Returns the player_num that
/// scored, if any.
pub fn advance<R: Rng + ?Sized>(session: &mut Session, now: f64, rng: &mut R) -> Option<usize> {
    let degree = session.puck.degree;
    let rounded = (f64::from(degree) / 90.0).round() as i32;
    let offset = f64::from(degree - rounded * 90);

    let move_amount = PUCK_SPEED * (now - session.update_time).max(0.0);
    session.update_time = session.update_time.max(now);

    let (dx, dy) = displacement(rounded.rem_euclid(4), move_amount, offset);
    session.puck.x += dx;
    session.puck.y += dy;

    let puck = Rect::new(session.puck.x, session.puck.y, PUCK_SIZE, PUCK_SIZE);
    if let Some(wall) = wall_hit(&puck) {
        session.puck.degree = calculate_degree(degree, wall, rng);
        debug!(
            "Puck hit {:?} wall, {} -> {}",
            wall, degree, session.puck.degree
        );
    }

    let scorer = goals()
        .iter()
        .find(|(goal, _)| puck.overlaps(goal))
        .map(|&(_, scorer)| scorer);
    if let Some(scorer) = scorer {
        let player = &mut session.players[scorer];
        player.score = player.score.saturating_add(1);
        info!("Goal for player {} (score {})", scorer, player.score);
        session.puck.reset(rng);
    }

    session.puck.x = session.puck.x.clamp(-PUCK_SIZE, TABLE_SIZE + PUCK_SIZE);
    session.puck.y = session.puck.y.clamp(-PUCK_SIZE, TABLE_SIZE + PUCK_SIZE);

    scorer
}

/// Advances every active session. Returns the number of goals scored.
pub fn update_sessions<R: Rng + ?Sized>(sessions: &mut [Session], now: f64, rng: &mut R) -> usize {
    sessions
        .iter_mut()
        .filter(|session| session.active)
        .filter_map(|session| advance(session, now, rng))
        .count()
}
