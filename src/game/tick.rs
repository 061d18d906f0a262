//! Authoritative Simulation Tick
//!
//! The per-tick state transition: round cooldown, player movement, pass
//! charging and shooting, ball carry and free flight, ball acquisition,
//! and zone damage. The server calls this exactly once per tick with the
//! measured elapsed wall time; nothing in here can fail.

use crate::core::vec2::Vec2;
use crate::game::court::{
    clamp_to_court, BALL_FRICTION, BALL_MIN_SPEED, BALL_SIZE, BLUE_ZONE_POSITION,
    CARRY_OFFSET_FACTOR, CARRY_SPEED_FACTOR, DIRECTION_EPSILON, FOOTPRINT_SCALE, LAUNCH_FACTOR,
    MAX_PASS_CHARGE, MIN_LAUNCH_POWER, OFFSET_SMOOTH_NEW, OFFSET_SMOOTH_OLD, PLAYER_SIZE,
    PLAYER_SPEED, RED_ZONE_POSITION, ROUND_COOLDOWN, SHOOT_GHOSTING_TIME, STUN_DURATION,
    ZONE_DEPLETION_RATE, ZONE_DIMENSIONS,
};
use crate::game::state::{Ball, GameState, PlayerId, PlayerState};

/// Advance the simulation by one tick of `elapsed` seconds.
///
/// While the end-of-round cooldown is running, only the countdown advances;
/// when it expires the state resets to the initial round layout and the
/// tick ends with no physics.
pub fn tick(state: &mut GameState, elapsed: f32) {
    debug_assert!(elapsed > 0.0);

    // 1. Round cooldown gate
    if state.cooldown > 0.0 {
        state.cooldown -= elapsed;
        if state.cooldown <= 0.0 {
            state.reset_round();
        }
        return;
    }

    // 2. Per-player movement, shooting, and ball integration
    update_players(state, elapsed);

    // 3. Ball acquisition
    resolve_acquisition(state);

    // 4. Zone damage
    resolve_zone_damage(state, elapsed);

    // 5. End-of-round check
    if state.red_zone_health <= 0.0 || state.blue_zone_health <= 0.0 {
        state.cooldown = ROUND_COOLDOWN;
    }

    debug_assert!(state.carrier_consistent());
}

/// Movement, charge/shoot, and ball position updates, one player at a time
/// in PlayerId order.
///
/// Ball free flight is integrated inside this loop, once per non-stunned
/// player; with the fixed per-tick elapsed this only changes how quickly
/// friction bites as the roster grows.
fn update_players(state: &mut GameState, elapsed: f32) {
    let GameState { players, ball, .. } = state;

    for player in players.values_mut() {
        player.just_stunned = false;

        if player.stunned_remaining > 0.0 {
            player.stunned_remaining = (player.stunned_remaining - elapsed).max(0.0);
            // Stunned players don't move, charge, or shoot
            continue;
        }

        if player.shoot_ghosting_remaining > 0.0 {
            player.shoot_ghosting_remaining =
                (player.shoot_ghosting_remaining - elapsed).max(0.0);
        }

        // Movement: unit direction (dead zone handled by InputState),
        // slower while carrying.
        let mut movement = player.input.move_direction() * (PLAYER_SPEED * elapsed);
        if player.has_ball {
            movement = movement * CARRY_SPEED_FACTOR;
        }
        player.position += movement;
        player.last_move = movement;
        player.position = clamp_to_court(player.position, PLAYER_SIZE / 2.0);

        // Pass charge accumulates while space is held; releasing with any
        // charge shoots. Releasing with zero charge does nothing.
        if player.has_ball {
            if player.input.space {
                player.pass_charge += elapsed;
            } else if player.pass_charge > 0.0 {
                shoot(player, ball);
            }
        }

        // Ball free flight with exponential friction and a hard stop below
        // the minimum speed.
        if ball.carrier.is_none() && ball.velocity.length() > DIRECTION_EPSILON {
            ball.position += ball.velocity * elapsed;
            ball.velocity = ball.velocity * BALL_FRICTION;
            if ball.velocity.length() < BALL_MIN_SPEED {
                ball.velocity = Vec2::ZERO;
            }
        }

        // Carried ball trails the carrier by a smoothed offset so a change
        // of direction doesn't pop the ball to the other side.
        if player.has_ball {
            let offset = ball.last_offset * OFFSET_SMOOTH_OLD
                + player.last_move * (OFFSET_SMOOTH_NEW * CARRY_OFFSET_FACTOR);
            ball.last_offset = offset;

            let new_position = player.position + offset;
            ball.last_move = new_position - ball.position;
            ball.position = new_position;
        }

        ball.position = clamp_to_court(ball.position, BALL_SIZE * FOOTPRINT_SCALE);
    }
}

/// Launch the ball away from the shooter.
///
/// Direction falls back from (ball - player) to the player's last movement
/// to straight up, so a degenerate layout still shoots deterministically.
fn shoot(player: &mut PlayerState, ball: &mut Ball) {
    let power = MIN_LAUNCH_POWER + LAUNCH_FACTOR * player.pass_charge.min(MAX_PASS_CHARGE);

    let toward_ball = ball.position - player.position;
    let direction = if toward_ball.length() >= DIRECTION_EPSILON {
        toward_ball
    } else if player.last_move.length() >= DIRECTION_EPSILON {
        player.last_move
    } else {
        Vec2::UP
    };

    ball.velocity = direction.normalize_or_zero() * power;
    ball.carrier = None;
    player.has_ball = false;
    player.shoot_ghosting_remaining = SHOOT_GHOSTING_TIME;
    player.pass_charge = 0.0;
}

/// Per-axis AABB overlap between a player and the ball.
#[inline]
fn player_touches_ball(player: &PlayerState, ball_position: Vec2) -> bool {
    let reach = (PLAYER_SIZE + BALL_SIZE) * FOOTPRINT_SCALE;
    (player.position.x - ball_position.x).abs() < reach
        && (player.position.y - ball_position.y).abs() < reach
}

/// Hand the ball to the first eligible overlapping player, in PlayerId
/// order, applying at most one acquisition per tick.
///
/// Eligible means: not stunned, not in a post-shot ghosting window, and not
/// on the carrier's team (which also keeps a carrier from intercepting
/// themself). A displaced carrier is stunned and flagged for its next
/// snapshot.
fn resolve_acquisition(state: &mut GameState) {
    let carrier_id = state.ball.carrier;
    let carrier_team = state.carrier().map(|p| p.team);
    let ball_position = state.ball.position;

    let winner = state
        .players
        .iter()
        .find(|(_, p)| {
            !p.is_stunned()
                && p.shoot_ghosting_remaining <= 0.0
                && Some(p.team) != carrier_team
                && player_touches_ball(p, ball_position)
        })
        .map(|(id, _)| *id);

    let Some(winner) = winner else {
        return;
    };

    if let Some(displaced) = carrier_id.and_then(|id| state.players.get_mut(&id)) {
        displaced.has_ball = false;
        displaced.stunned_remaining = STUN_DURATION;
        displaced.just_stunned = true;
    }

    if let Some(player) = state.players.get_mut(&winner) {
        player.has_ball = true;
        state.ball.carrier = Some(winner);
    }
}

/// Per-axis AABB overlap between the ball and a health-scaled zone.
#[inline]
fn ball_touches_zone(ball_position: Vec2, zone_position: Vec2, health: f32) -> bool {
    let dims = ZONE_DIMENSIONS * health;
    (ball_position.x - zone_position.x).abs() < (BALL_SIZE + dims.x) / 2.0
        && (ball_position.y - zone_position.y).abs() < (BALL_SIZE + dims.y) / 2.0
}

/// Deplete each zone the ball currently overlaps. Each zone's footprint
/// shrinks with its health, and health is not clamped mid-tick.
fn resolve_zone_damage(state: &mut GameState, elapsed: f32) {
    let ball_position = state.ball.position;

    if ball_touches_zone(ball_position, RED_ZONE_POSITION, state.red_zone_health) {
        state.red_zone_health -= ZONE_DEPLETION_RATE * elapsed;
    }
    if ball_touches_zone(ball_position, BLUE_ZONE_POSITION, state.blue_zone_health) {
        state.blue_zone_health -= ZONE_DEPLETION_RATE * elapsed;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::court::COURT;
    use crate::game::input::InputState;
    use crate::game::state::Team;

    const DT: f32 = 1.0 / 60.0;

    fn held(left: bool, right: bool, down: bool, up: bool, space: bool) -> InputState {
        InputState {
            left,
            right,
            down,
            up,
            space,
        }
    }

    /// Park the ball on a player and make them the carrier.
    fn give_ball(state: &mut GameState, id: PlayerId) {
        let position = state.players[&id].position;
        state.players.get_mut(&id).unwrap().has_ball = true;
        state.ball.carrier = Some(id);
        state.ball.position = position;
        state.ball.velocity = Vec2::ZERO;
    }

    #[test]
    fn test_idle_player_does_not_move() {
        let mut state = GameState::new();
        let id = state.connect();
        let start = state.players[&id].position;

        tick(&mut state, DT);

        let player = &state.players[&id];
        assert_eq!(player.position, start);
        assert_eq!(player.last_move, Vec2::ZERO);
    }

    #[test]
    fn test_movement_speed_and_last_move() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        state.apply_input(id, held(false, true, false, false, false));

        tick(&mut state, DT);

        let player = &state.players[&id];
        let expected = Vec2::new(PLAYER_SPEED * DT, 0.0);
        assert!((player.position.x - (4.0 + expected.x)).abs() < 1e-6);
        assert_eq!(player.position.y, 4.0);
        assert_eq!(player.last_move, expected);
    }

    #[test]
    fn test_carrier_moves_slower() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        give_ball(&mut state, id);
        state.apply_input(id, held(false, true, false, false, false));

        tick(&mut state, DT);

        let moved = state.players[&id].last_move.x;
        assert!((moved - PLAYER_SPEED * CARRY_SPEED_FACTOR * DT).abs() < 1e-6);
    }

    #[test]
    fn test_players_stay_in_court() {
        let mut state = GameState::new();
        let id = state.connect();
        // Hold down-left against the corner for a while
        state.apply_input(id, held(true, false, true, false, false));

        for _ in 0..600 {
            tick(&mut state, DT);
        }

        let half = PLAYER_SIZE / 2.0;
        for player in state.players.values() {
            assert!(player.position.x >= half && player.position.x <= COURT.x - half);
            assert!(player.position.y >= half && player.position.y <= COURT.y - half);
        }
        let inset = BALL_SIZE * FOOTPRINT_SCALE;
        assert!(state.ball.position.x >= inset && state.ball.position.x <= COURT.x - inset);
        assert!(state.ball.position.y >= inset && state.ball.position.y <= COURT.y - inset);
    }

    #[test]
    fn test_stunned_player_is_immobile_and_timer_floors_at_zero() {
        let mut state = GameState::new();
        let id = state.connect();
        let start = state.players[&id].position;
        state.players.get_mut(&id).unwrap().stunned_remaining = 0.01;
        state.apply_input(id, held(false, true, false, false, false));

        tick(&mut state, DT);
        assert_eq!(state.players[&id].position, start);
        assert_eq!(state.players[&id].stunned_remaining, 0.0);

        // Next tick the stun has expired and movement resumes
        tick(&mut state, DT);
        assert!(state.players[&id].position.x > start.x);
    }

    #[test]
    fn test_release_without_charge_does_not_shoot() {
        let mut state = GameState::new();
        let id = state.connect();
        give_ball(&mut state, id);
        // Space never held, so no charge
        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, Some(id));
        assert!(state.players[&id].has_ball);
        assert_eq!(state.ball.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_charge_then_release_shoots_with_capped_power() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        give_ball(&mut state, id);

        // Hold space well past the charge cap
        state.apply_input(id, held(false, false, false, false, true));
        for _ in 0..180 {
            tick(&mut state, DT);
        }
        assert!(state.players[&id].pass_charge > MAX_PASS_CHARGE);

        // Release
        state.apply_input(id, held(false, false, false, false, false));
        tick(&mut state, DT);

        let player = &state.players[&id];
        assert!(!player.has_ball);
        assert_eq!(state.ball.carrier, None);
        assert_eq!(player.pass_charge, 0.0);
        assert_eq!(player.shoot_ghosting_remaining, SHOOT_GHOSTING_TIME);

        let speed = state.ball.velocity.length();
        let capped = MIN_LAUNCH_POWER + LAUNCH_FACTOR * MAX_PASS_CHARGE;
        // One free-flight friction step may already have run this tick
        assert!(speed <= capped + 1e-4 && speed >= capped * BALL_FRICTION - 1e-4);
    }

    #[test]
    fn test_shot_direction_falls_back_to_up() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        give_ball(&mut state, id);
        // Ball exactly on the player and no movement: degenerate direction
        state.ball.position = state.players[&id].position;
        state.players.get_mut(&id).unwrap().pass_charge = 0.5;

        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, None);
        assert!(state.ball.velocity.y > 0.0, "fallback shot goes straight up");
        assert_eq!(state.ball.velocity.x, 0.0);
    }

    #[test]
    fn test_free_ball_decelerates_and_stops() {
        let mut state = GameState::new();
        let _id = state.connect();
        state.ball.position = Vec2::new(4.0, 4.0);
        state.ball.velocity = Vec2::new(0.05, 0.0);
        // Park the player away from the ball so it isn't picked up
        state
            .players
            .values_mut()
            .for_each(|p| p.position = Vec2::new(7.0, 1.0));

        for _ in 0..600 {
            tick(&mut state, DT);
        }
        assert_eq!(state.ball.velocity, Vec2::ZERO, "friction stops the ball");
    }

    #[test]
    fn test_pickup_by_overlap() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        state.ball.position = Vec2::new(4.05, 4.0);

        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, Some(id));
        assert!(state.players[&id].has_ball);
        assert!(state.carrier_consistent());
    }

    #[test]
    fn test_interception_stuns_carrier() {
        let mut state = GameState::new();
        let blue = state.connect();
        let red = state.connect();
        assert_ne!(state.players[&blue].team, state.players[&red].team);

        state.players.get_mut(&blue).unwrap().position = Vec2::new(4.0, 4.0);
        give_ball(&mut state, blue);
        state.players.get_mut(&red).unwrap().position = Vec2::new(4.05, 4.0);

        tick(&mut state, DT);

        let old = &state.players[&blue];
        assert!(!old.has_ball);
        assert!(old.just_stunned);
        assert_eq!(old.stunned_remaining, STUN_DURATION);
        assert_eq!(state.ball.carrier, Some(red));
        assert!(state.carrier_consistent());

        // The flag is consumed on the following tick
        tick(&mut state, DT);
        assert!(!state.players[&blue].just_stunned);
        assert!(state.players[&blue].stunned_remaining > 0.0);
    }

    #[test]
    fn test_teammate_cannot_intercept() {
        let mut state = GameState::new();
        let blue_a = state.connect();
        let _red = state.connect();
        let blue_b = state.connect();
        assert_eq!(state.players[&blue_a].team, Team::Blue);
        assert_eq!(state.players[&blue_b].team, Team::Blue);

        state.players.get_mut(&blue_a).unwrap().position = Vec2::new(4.0, 4.0);
        give_ball(&mut state, blue_a);
        state.players.get_mut(&blue_b).unwrap().position = Vec2::new(4.01, 4.0);

        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, Some(blue_a));
        assert!(!state.players[&blue_a].just_stunned);
    }

    #[test]
    fn test_acquisition_tie_breaks_by_lowest_id() {
        let mut state = GameState::new();
        let first = state.connect();
        let second = state.connect();

        // Both overlap a free ball
        state.players.get_mut(&first).unwrap().position = Vec2::new(4.0, 4.0);
        state.players.get_mut(&second).unwrap().position = Vec2::new(4.0, 4.0);
        state.ball.position = Vec2::new(4.0, 4.0);

        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, Some(first));
        // Only one acquisition per tick: second didn't steal afterwards
        assert!(!state.players[&first].is_stunned());
    }

    #[test]
    fn test_ghosting_blocks_reacquisition() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        state.players.get_mut(&id).unwrap().shoot_ghosting_remaining = 1.0;
        state.ball.position = Vec2::new(4.0, 4.0);

        tick(&mut state, DT);

        assert_eq!(state.ball.carrier, None);
        assert!(!state.players[&id].has_ball);
    }

    #[test]
    fn test_zone_depletion_is_rate_times_elapsed() {
        let mut state = GameState::new();
        // No players: physics still damages zones via the standing ball.
        state.ball.position = RED_ZONE_POSITION;

        tick(&mut state, 1.0);

        assert!((state.red_zone_health - (1.0 - ZONE_DEPLETION_RATE)).abs() < 1e-6);
        assert_eq!(state.blue_zone_health, 1.0);
    }

    #[test]
    fn test_zone_footprint_shrinks_with_health() {
        // A ball just inside the full-health edge stops overlapping once
        // the zone has shrunk.
        let edge_x = RED_ZONE_POSITION.x + (BALL_SIZE + ZONE_DIMENSIONS.x) / 2.0 - 0.01;
        assert!(ball_touches_zone(
            Vec2::new(edge_x, RED_ZONE_POSITION.y),
            RED_ZONE_POSITION,
            1.0
        ));
        assert!(!ball_touches_zone(
            Vec2::new(edge_x, RED_ZONE_POSITION.y),
            RED_ZONE_POSITION,
            0.5
        ));
    }

    #[test]
    fn test_round_end_sets_cooldown_without_resetting() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(7.0, 1.0);
        state.ball.position = RED_ZONE_POSITION;
        state.red_zone_health = ZONE_DEPLETION_RATE * DT * 0.5;

        tick(&mut state, DT);

        assert!(state.red_zone_health <= 0.0);
        assert_eq!(state.cooldown, ROUND_COOLDOWN);
        // State does not reset on the tick the round ends
        assert!(state.red_zone_health < 1.0);
    }

    #[test]
    fn test_cooldown_freezes_physics_then_resets() {
        let mut state = GameState::new();
        let id = state.connect();
        state.players.get_mut(&id).unwrap().position = Vec2::new(4.0, 4.0);
        state.apply_input(id, held(false, true, false, false, false));
        state.cooldown = 2.0 * DT;
        state.red_zone_health = -0.01;

        // First tick: countdown only, no movement, no reset yet
        tick(&mut state, DT);
        assert_eq!(state.players[&id].position, Vec2::new(4.0, 4.0));
        assert!(state.cooldown > 0.0);
        assert!(state.red_zone_health < 0.0);

        // Second tick crosses zero: full reset, still no physics
        tick(&mut state, DT);
        assert_eq!(state.cooldown, 0.0);
        assert_eq!(state.red_zone_health, 1.0);
        assert_eq!(
            state.players[&id].position,
            state.players[&id].team.spawn_position()
        );

        // Round is live again: input (still held) moves the player
        tick(&mut state, DT);
        assert!(state.players[&id].position.x > state.players[&id].team.spawn_position().x);
    }

    #[test]
    fn test_cooldown_never_negative_after_ticks() {
        let mut state = GameState::new();
        state.cooldown = 0.001;
        tick(&mut state, 1.0);
        assert!(state.cooldown >= 0.0);
    }

    #[test]
    fn test_carrier_consistency_over_long_run() {
        let mut state = GameState::new();
        let ids: Vec<_> = (0..4).map(|_| state.connect()).collect();

        // Everyone chases the ball with different keys held
        state.apply_input(ids[0], held(false, true, false, true, false));
        state.apply_input(ids[1], held(true, false, false, true, true));
        state.apply_input(ids[2], held(false, true, true, false, false));
        state.apply_input(ids[3], held(false, false, false, true, true));

        for i in 0..1800 {
            tick(&mut state, DT);
            assert!(state.carrier_consistent(), "tick {i}");
            for player in state.players.values() {
                assert!(player.stunned_remaining >= 0.0);
                assert!(player.shoot_ghosting_remaining >= 0.0);
                assert!(player.pass_charge >= 0.0);
            }
            assert!(state.cooldown >= 0.0);
        }
    }
}
