//! Game session: owns the maze and every agent, and runs the tick handlers.

use std::fmt;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agent::{Agent, Aggression, StepContext};
use crate::clock::TickKind;
use crate::config::Config;
use crate::error::{GameError, Result};
use crate::grid::{Dir, Grid, Pos};
use crate::maze;
use crate::pathfinding::is_reachable;

/// The player is always the first agent and is never removed.
const PLAYER: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossReason {
    HealthExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss(LossReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "You reached the exit and won!"),
            Outcome::Loss(LossReason::HealthExhausted) => {
                write!(f, "You were caught by an enemy and lost all health!")
            }
        }
    }
}

/// State changes reported by the tick handlers, in the order they happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    EnemyMoved { from: Pos, to: Pos },
    PoliceMoved { from: Pos, to: Pos },
    HealthLost { remaining: u32 },
    EnemyCaught { at: Pos },
    /// Walls were removed; the grid needs redrawing.
    MazeRepaired { from: Pos, to: Pos },
    AggressionStarted,
    AggressionEnded,
    Finished(Outcome),
}

/// Explicit starting arrangement for a session.
#[derive(Clone, Debug)]
pub struct Layout {
    pub grid: Grid,
    pub player: Pos,
    pub exit: Pos,
    pub enemies: Vec<Pos>,
    pub police: Vec<Pos>,
    pub health: u32,
    pub patrol_when_calm: bool,
    pub seed: u64,
}

impl Layout {
    pub fn new(grid: Grid, player: Pos, exit: Pos) -> Self {
        let defaults = Config::default();
        Self {
            grid,
            player,
            exit,
            enemies: Vec::new(),
            police: Vec::new(),
            health: defaults.agents.starting_health,
            patrol_when_calm: defaults.agents.police_patrol_when_calm,
            seed: 0,
        }
    }

    pub fn enemy(mut self, pos: Pos) -> Self {
        self.enemies.push(pos);
        self
    }

    pub fn police(mut self, pos: Pos) -> Self {
        self.police.push(pos);
        self
    }

    pub fn health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    pub fn patrol_when_calm(mut self, enabled: bool) -> Self {
        self.patrol_when_calm = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        let (rows, cols) = self.grid.dimensions();
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        let named = [("player", self.player), ("exit", self.exit)]
            .into_iter()
            .chain(self.enemies.iter().map(|pos| ("enemy", *pos)))
            .chain(self.police.iter().map(|pos| ("police", *pos)));

        let mut taken: Vec<Pos> = Vec::new();
        for (what, pos) in named {
            if !self.grid.is_open(pos) {
                return Err(GameError::InvalidPlacement(format!(
                    "{what} at ({}, {}) is not an open cell",
                    pos.x, pos.y
                )));
            }
            if taken.contains(&pos) {
                return Err(GameError::InvalidPlacement(format!(
                    "{what} at ({}, {}) shares a cell",
                    pos.x, pos.y
                )));
            }
            taken.push(pos);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct GameState {
    grid: Grid,
    agents: Vec<Agent>,
    exit: Pos,
    health: u32,
    aggression: Aggression,
    last_enemy_pos: Option<Pos>,
    outcome: Option<Outcome>,
    patrol_when_calm: bool,
    rng: ChaCha8Rng,
}

impl GameState {
    /// Generates a maze and places every agent on its own random open cell,
    /// seeding from `config.seed` or entropy.
    pub fn new(config: &Config) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &Config, mut rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let grid = maze::generate(config.grid.rows, config.grid.cols, &mut rng);
        let mut cells = maze::distinct_open_cells(&grid, config.required_cells(), &mut rng)?
            .into_iter();

        let (Some(player), Some(exit)) = (cells.next(), cells.next()) else {
            return Err(GameError::NotEnoughOpenCells {
                needed: config.required_cells(),
                available: grid.open_count(),
            });
        };
        let enemies: Vec<Pos> = cells.by_ref().take(config.agents.enemies).collect();
        let police: Vec<Pos> = cells.collect();

        let mut game = Self::assemble(
            grid,
            player,
            exit,
            &enemies,
            &police,
            config.agents.starting_health,
            config.agents.police_patrol_when_calm,
            rng,
        );
        info!(
            "new game: player {:?}, exit {:?}, {} enemies, {} police",
            player,
            exit,
            enemies.len(),
            police.len()
        );

        let mut events = Vec::new();
        game.ensure_path_exists(&mut events);
        Ok(game)
    }

    /// Builds a session from an explicit layout. The layout is taken as given;
    /// connectivity is first checked on the next main tick.
    pub fn from_layout(layout: Layout) -> Result<Self> {
        layout.validate()?;
        Ok(Self::assemble(
            layout.grid,
            layout.player,
            layout.exit,
            &layout.enemies,
            &layout.police,
            layout.health,
            layout.patrol_when_calm,
            ChaCha8Rng::seed_from_u64(layout.seed),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        grid: Grid,
        player: Pos,
        exit: Pos,
        enemies: &[Pos],
        police: &[Pos],
        health: u32,
        patrol_when_calm: bool,
        rng: ChaCha8Rng,
    ) -> Self {
        let mut agents = Vec::with_capacity(1 + enemies.len() + police.len());
        agents.push(Agent::Player(player));
        agents.extend(enemies.iter().map(|pos| Agent::Enemy(*pos)));
        agents.extend(police.iter().map(|pos| Agent::Police(*pos)));
        Self {
            grid,
            agents,
            exit,
            health,
            aggression: Aggression::Calm,
            last_enemy_pos: None,
            outcome: None,
            patrol_when_calm,
            rng,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn player(&self) -> Pos {
        self.agents[PLAYER].pos()
    }

    pub fn exit(&self) -> Pos {
        self.exit
    }

    pub fn enemies(&self) -> Vec<Pos> {
        self.positions(Agent::is_enemy)
    }

    pub fn police(&self) -> Vec<Pos> {
        self.positions(Agent::is_police)
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn aggression(&self) -> Aggression {
        self.aggression
    }

    pub fn last_enemy_pos(&self) -> Option<Pos> {
        self.last_enemy_pos
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn positions(&self, keep: impl Fn(&Agent) -> bool) -> Vec<Pos> {
        self.agents
            .iter()
            .filter(|agent| keep(*agent))
            .map(Agent::pos)
            .collect()
    }

    /// Moves the player one cell if the destination is open. Returns whether
    /// the player moved.
    pub fn on_key_move(&mut self, dir: Dir) -> bool {
        if self.is_finished() {
            return false;
        }
        let from = self.player();
        let Some(to) = self.grid.neighbor(from, dir) else {
            return false;
        };
        if !self.grid.is_open(to) {
            return false;
        }
        self.agents[PLAYER].set_pos(to);
        true
    }

    /// Runs one trigger's handler. Does nothing once the game has an outcome.
    pub fn tick(&mut self, kind: TickKind, out: &mut Vec<Event>) {
        if self.is_finished() {
            return;
        }
        match kind {
            TickKind::Main => {
                self.resolve_collisions(out);
                if !self.is_finished() {
                    self.ensure_path_exists(out);
                }
            }
            TickKind::Enemy => self.move_enemies(out),
            TickKind::Police => self.move_police(out),
            TickKind::AggressionTimeout => self.end_aggression(out),
        }
    }

    fn resolve_collisions(&mut self, out: &mut Vec<Event>) {
        let player = self.player();

        let hits = self
            .agents
            .iter()
            .filter(|agent| agent.is_enemy() && agent.pos() == player)
            .count();
        for _ in 0..hits {
            self.health = self.health.saturating_sub(1);
            debug!("player hit at {player:?}, health {}", self.health);
            out.push(Event::HealthLost {
                remaining: self.health,
            });
            if self.health == 0 {
                self.finish(Outcome::Loss(LossReason::HealthExhausted), out);
                return;
            }
        }

        let police = self.police();
        let mut caught = Vec::new();
        self.agents.retain(|agent| {
            let hit = agent.is_enemy() && police.contains(&agent.pos());
            if hit {
                caught.push(agent.pos());
            }
            !hit
        });
        for at in caught {
            info!("enemy caught by police at {at:?}");
            out.push(Event::EnemyCaught { at });
        }

        if player == self.exit {
            self.finish(Outcome::Win, out);
        }
    }

    /// Only walls count here. The player may step onto police cells, and
    /// police can't be carved away, so treating them as blocked would repair
    /// on every tick without ever restoring a path.
    fn ensure_path_exists(&mut self, out: &mut Vec<Event>) {
        let player = self.player();
        if is_reachable(&self.grid, player, self.exit) {
            return;
        }
        warn!("no path from {player:?} to exit {:?}, carving one", self.exit);
        maze::carve_direct_path(&mut self.grid, player, self.exit);
        out.push(Event::MazeRepaired {
            from: player,
            to: self.exit,
        });
    }

    fn move_enemies(&mut self, out: &mut Vec<Event>) {
        if self.aggression == Aggression::Calm {
            self.aggression = Aggression::Aggressive;
            info!("aggression started");
            out.push(Event::AggressionStarted);
        }

        let police = self.police();
        let ctx = StepContext {
            grid: &self.grid,
            player: self.agents[PLAYER].pos(),
            police: &police,
            mode: self.aggression,
            pursuit_target: self.last_enemy_pos,
            patrol_when_calm: self.patrol_when_calm,
        };
        for agent in self.agents.iter_mut().filter(|agent| agent.is_enemy()) {
            let from = agent.pos();
            let to = agent.next_step(&ctx, &mut self.rng);
            if to == from || !ctx.grid.is_open(to) || to == self.exit {
                continue;
            }
            agent.set_pos(to);
            self.last_enemy_pos = Some(to);
            debug!("enemy {from:?} -> {to:?}");
            out.push(Event::EnemyMoved { from, to });
        }
    }

    fn move_police(&mut self, out: &mut Vec<Event>) {
        let police = self.police();
        let ctx = StepContext {
            grid: &self.grid,
            player: self.agents[PLAYER].pos(),
            police: &police,
            mode: self.aggression,
            pursuit_target: self.last_enemy_pos,
            patrol_when_calm: self.patrol_when_calm,
        };
        for agent in self.agents.iter_mut().filter(|agent| agent.is_police()) {
            let from = agent.pos();
            let to = agent.next_step(&ctx, &mut self.rng);
            if to == from || !ctx.grid.is_open(to) {
                continue;
            }
            agent.set_pos(to);
            debug!("police {from:?} -> {to:?}");
            out.push(Event::PoliceMoved { from, to });
        }
    }

    fn end_aggression(&mut self, out: &mut Vec<Event>) {
        if self.aggression == Aggression::Aggressive {
            self.aggression = Aggression::Calm;
            info!("aggression ended");
            out.push(Event::AggressionEnded);
        }
    }

    fn finish(&mut self, outcome: Outcome, out: &mut Vec<Event>) {
        info!("game over: {outcome}");
        self.outcome = Some(outcome);
        out.push(Event::Finished(outcome));
    }
}
