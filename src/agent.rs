//! Agents on the grid and their per-kind movement policies.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Grid, Pos};
use crate::pathfinding::find_path;

/// Global behaviour mode. Aggression speeds up enemies and sends police after
/// the last place an enemy was seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Aggression {
    #[default]
    Calm,
    Aggressive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Agent {
    /// Moved only by input.
    Player(Pos),
    Enemy(Pos),
    Police(Pos),
}

/// Everything a movement policy may look at when choosing a step.
#[derive(Clone, Copy, Debug)]
pub struct StepContext<'a> {
    pub grid: &'a Grid,
    pub player: Pos,
    pub police: &'a [Pos],
    pub mode: Aggression,
    /// Where an enemy last moved to, if any has moved yet.
    pub pursuit_target: Option<Pos>,
    pub patrol_when_calm: bool,
}

impl Agent {
    pub fn pos(&self) -> Pos {
        match *self {
            Agent::Player(pos) | Agent::Enemy(pos) | Agent::Police(pos) => pos,
        }
    }

    pub fn set_pos(&mut self, to: Pos) {
        match self {
            Agent::Player(pos) | Agent::Enemy(pos) | Agent::Police(pos) => *pos = to,
        }
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self, Agent::Enemy(_))
    }

    pub fn is_police(&self) -> bool {
        matches!(self, Agent::Police(_))
    }

    /// Proposed next cell for this agent. Returns the current cell when the
    /// agent has nowhere to go this tick.
    pub fn next_step(&self, ctx: &StepContext<'_>, rng: &mut impl Rng) -> Pos {
        match *self {
            Agent::Player(pos) => pos,
            Agent::Enemy(pos) => enemy_next_step(pos, ctx.player, ctx.grid, ctx.police),
            Agent::Police(pos) => match ctx.mode {
                Aggression::Aggressive => ctx
                    .pursuit_target
                    .map(|target| police_step_towards(pos, target, ctx.grid))
                    .unwrap_or(pos),
                Aggression::Calm if ctx.patrol_when_calm => police_patrol_step(pos, ctx.grid, rng),
                Aggression::Calm => pos,
            },
        }
    }
}

/// Second cell of the shortest path to the player with police cells treated
/// as blocked, or `pos` when no such path exists.
pub fn enemy_next_step(pos: Pos, player: Pos, grid: &Grid, police: &[Pos]) -> Pos {
    let path = find_path(grid, pos, player, police);
    path.get(1).copied().unwrap_or(pos)
}

/// Greedy step toward `target`: combined step first, then horizontal only,
/// then vertical only. Stays put when all three are blocked.
pub fn police_step_towards(pos: Pos, target: Pos, grid: &Grid) -> Pos {
    let dx = signum(pos.x, target.x);
    let dy = signum(pos.y, target.y);

    let mut candidates = Vec::with_capacity(3);
    candidates.push(pos.offset(dx, dy));
    if dx != 0 {
        candidates.push(pos.offset(dx, 0));
    }
    if dy != 0 {
        candidates.push(pos.offset(0, dy));
    }

    candidates
        .into_iter()
        .flatten()
        .find(|next| grid.is_open(*next))
        .unwrap_or(pos)
}

/// Random open cell among the eight surrounding ones. Each neighbour is tried
/// at most once; a unit with no open neighbour stays where it is.
pub fn police_patrol_step(pos: Pos, grid: &Grid, rng: &mut impl Rng) -> Pos {
    let mut offsets = [
        (-1isize, -1isize),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    offsets.shuffle(rng);
    offsets
        .into_iter()
        .filter_map(|(dx, dy)| pos.offset(dx, dy))
        .find(|next| grid.is_open(*next))
        .unwrap_or(pos)
}

fn signum(from: usize, to: usize) -> isize {
    if to > from {
        1
    } else if to < from {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn enemy_takes_second_cell_of_path() {
        let grid = Grid::from_rows(&["....."]);
        assert_eq!(
            enemy_next_step(Pos::new(0, 0), Pos::new(4, 0), &grid, &[]),
            Pos::new(1, 0)
        );
    }

    #[test]
    fn enemy_waits_when_police_block_the_corridor() {
        let grid = Grid::from_rows(&["....."]);
        let police = [Pos::new(2, 0)];
        assert_eq!(
            enemy_next_step(Pos::new(0, 0), Pos::new(4, 0), &grid, &police),
            Pos::new(0, 0)
        );
    }

    #[test]
    fn enemy_on_player_stays() {
        let grid = Grid::from_rows(&["..."]);
        let pos = Pos::new(1, 0);
        assert_eq!(enemy_next_step(pos, pos, &grid, &[]), pos);
    }

    #[test]
    fn police_prefers_diagonal_then_horizontal_then_vertical() {
        let open = Grid::from_rows(&["...", "...", "..."]);
        let start = Pos::new(0, 0);
        let target = Pos::new(2, 2);
        assert_eq!(police_step_towards(start, target, &open), Pos::new(1, 1));

        let no_diagonal = Grid::from_rows(&["...", ".#.", "..."]);
        assert_eq!(police_step_towards(start, target, &no_diagonal), Pos::new(1, 0));

        let vertical_only = Grid::from_rows(&[".#.", ".#.", "..."]);
        assert_eq!(police_step_towards(start, target, &vertical_only), Pos::new(0, 1));

        let boxed = Grid::from_rows(&[".#.", "##.", "..."]);
        assert_eq!(police_step_towards(start, target, &boxed), start);
    }

    #[test]
    fn police_at_target_holds() {
        let grid = Grid::from_rows(&["..", ".."]);
        let pos = Pos::new(1, 1);
        assert_eq!(police_step_towards(pos, pos, &grid), pos);
    }

    #[test]
    fn patrol_moves_to_an_open_neighbour() {
        let grid = Grid::from_rows(&["...", "...", "..."]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let pos = Pos::new(1, 1);
        for _ in 0..50 {
            let next = police_patrol_step(pos, &grid, &mut rng);
            assert_ne!(next, pos);
            assert!(grid.is_open(next));
            assert!(next.x.abs_diff(pos.x) <= 1 && next.y.abs_diff(pos.y) <= 1);
        }
    }

    #[test]
    fn patrol_in_sealed_pocket_stays() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(police_patrol_step(Pos::new(1, 1), &grid, &mut rng), Pos::new(1, 1));
    }

    #[test]
    fn dispatch_selects_policy_by_kind_and_mode() {
        let grid = Grid::from_rows(&["....."]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ctx = StepContext {
            grid: &grid,
            player: Pos::new(4, 0),
            police: &[],
            mode: Aggression::Aggressive,
            pursuit_target: Some(Pos::new(0, 0)),
            patrol_when_calm: false,
        };
        assert_eq!(Agent::Player(Pos::new(4, 0)).next_step(&ctx, &mut rng), Pos::new(4, 0));
        assert_eq!(Agent::Enemy(Pos::new(2, 0)).next_step(&ctx, &mut rng), Pos::new(3, 0));
        assert_eq!(Agent::Police(Pos::new(2, 0)).next_step(&ctx, &mut rng), Pos::new(1, 0));

        let calm = StepContext {
            mode: Aggression::Calm,
            ..ctx
        };
        assert_eq!(Agent::Police(Pos::new(2, 0)).next_step(&calm, &mut rng), Pos::new(2, 0));

        let no_target = StepContext {
            pursuit_target: None,
            ..ctx
        };
        assert_eq!(Agent::Police(Pos::new(2, 0)).next_step(&no_target, &mut rng), Pos::new(2, 0));
    }
}
