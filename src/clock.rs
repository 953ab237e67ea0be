//! Single scheduler loop driving the four periodic triggers of a session.
//!
//! Time is virtual: callers feed elapsed durations to [`Clock::advance`] and
//! every trigger that falls due inside that window fires in timestamp order.
//! Triggers due at the same instant fire in [`TickKind::PRIORITY`] order.

use std::time::Duration;

use log::debug;

use crate::config::TimingConfig;
use crate::game::{Event, GameState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// Collisions, win/lose checks and connectivity repair.
    Main,
    Enemy,
    Police,
    /// One-shot end of an aggression period.
    AggressionTimeout,
}

impl TickKind {
    pub const PRIORITY: [TickKind; 4] = [
        TickKind::Main,
        TickKind::Enemy,
        TickKind::Police,
        TickKind::AggressionTimeout,
    ];
}

#[derive(Clone, Debug)]
pub struct Clock {
    timing: TimingConfig,
    now: Duration,
    next_main: Duration,
    next_enemy: Duration,
    next_police: Duration,
    aggression_deadline: Option<Duration>,
    aggressive: bool,
    stopped: bool,
}

impl Clock {
    pub fn new(timing: TimingConfig) -> Self {
        let mut clock = Self {
            timing,
            now: Duration::ZERO,
            next_main: Duration::ZERO,
            next_enemy: Duration::ZERO,
            next_police: Duration::ZERO,
            aggression_deadline: None,
            aggressive: false,
            stopped: false,
        };
        clock.next_main = clock.period(TickKind::Main);
        clock.next_enemy = clock.period(TickKind::Enemy);
        clock.next_police = clock.period(TickKind::Police);
        clock
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    pub fn aggression_deadline(&self) -> Option<Duration> {
        self.aggression_deadline
    }

    /// Current enemy period: the aggressive rate while aggression is armed,
    /// the base rate otherwise.
    pub fn enemy_interval(&self) -> Duration {
        self.period(TickKind::Enemy)
    }

    /// Cancels every trigger. Later calls to `advance` do nothing.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.aggression_deadline = None;
    }

    /// Arms the aggression timeout from now. Calling this while already
    /// aggressive moves the deadline instead of adding a second one.
    pub fn start_aggression(&mut self) {
        if !self.aggressive {
            self.aggressive = true;
            self.next_enemy = self.now + self.enemy_interval();
        }
        self.aggression_deadline = Some(self.now + self.period(TickKind::AggressionTimeout));
    }

    pub fn end_aggression(&mut self) {
        if self.aggressive {
            self.aggressive = false;
            self.next_enemy = self.now + self.enemy_interval();
        }
        self.aggression_deadline = None;
    }

    /// Moves virtual time forward by `dt`, dispatching every trigger that
    /// falls due to `game`. Returns how many ticks fired. A finished session
    /// stops the clock even when it ended outside this loop.
    pub fn advance(&mut self, dt: Duration, game: &mut GameState, out: &mut Vec<Event>) -> usize {
        let until = self.now + dt;
        let mut fired = 0;

        while !self.stopped {
            if game.is_finished() {
                self.stop();
                break;
            }
            let Some((at, kind)) = self.next_due(until) else {
                break;
            };
            self.now = at;
            self.reschedule(kind, at);
            debug!("tick {kind:?} at {}ms", at.as_millis());

            let first = out.len();
            game.tick(kind, out);
            fired += 1;

            for event in &out[first..] {
                match event {
                    Event::AggressionStarted => self.start_aggression(),
                    Event::AggressionEnded => self.end_aggression(),
                    Event::Finished(_) => self.stop(),
                    _ => {}
                }
            }
        }

        if !self.stopped {
            self.now = until;
        }
        fired
    }

    fn period(&self, kind: TickKind) -> Duration {
        let period = match kind {
            TickKind::Main => self.timing.main(),
            TickKind::Enemy if self.aggressive => self.timing.enemy_aggressive(),
            TickKind::Enemy => self.timing.enemy(),
            TickKind::Police => self.timing.police(),
            TickKind::AggressionTimeout => self.timing.aggression(),
        };
        period.max(Duration::from_millis(1))
    }

    fn deadline(&self, kind: TickKind) -> Option<Duration> {
        match kind {
            TickKind::Main => Some(self.next_main),
            TickKind::Enemy => Some(self.next_enemy),
            TickKind::Police => Some(self.next_police),
            TickKind::AggressionTimeout => self.aggression_deadline,
        }
    }

    fn next_due(&self, until: Duration) -> Option<(Duration, TickKind)> {
        let mut best: Option<(Duration, TickKind)> = None;
        for kind in TickKind::PRIORITY {
            let Some(at) = self.deadline(kind) else {
                continue;
            };
            if at > until {
                continue;
            }
            match best {
                Some((best_at, _)) if best_at <= at => {}
                _ => best = Some((at, kind)),
            }
        }
        best
    }

    fn reschedule(&mut self, kind: TickKind, at: Duration) {
        match kind {
            TickKind::Main => self.next_main = at + self.period(kind),
            TickKind::Enemy => self.next_enemy = at + self.period(kind),
            TickKind::Police => self.next_police = at + self.period(kind),
            TickKind::AggressionTimeout => self.aggression_deadline = None,
        }
    }
}
