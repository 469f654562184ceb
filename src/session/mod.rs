use crate::agent::{Agent, Bounds};
use crate::ai::{apply_pack_pursuit, flee_smartly, flight_speed, pursue_directly};
use crate::constants::{
    CELL_SIZE, DEFAULT_MAZE_LAYOUT, FRICTION, MIN_SPEED, TICKS_PER_FRAME, TOTAL_HUNTERS,
    TOTAL_PREYS,
};
use crate::error::MazeError;
use crate::maze::{CellId, Maze};
use crate::physics::{apply_friction, apply_intent, update_position};
use crate::rng::{RandomSource, Rng};
use crate::types::{
    DebugOverlay, DistanceView, GameEvent, GameScreen, Intent, NeighbourView, Outcome,
    RenderSnapshot, SessionSummary, TickReport,
};

mod clock;
mod spawn;

pub use self::clock::{Clock, ManualClock, SystemClock};

pub type TickObserver = Box<dyn FnMut(&TickReport) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HunterStrategy {
    Pack,
    Direct,
}

impl HunterStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pack" => Some(Self::Pack),
            "direct" => Some(Self::Direct),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub layout: String,
    pub cell_size: f32,
    pub preys: usize,
    pub hunters: usize,
    pub strategy: HunterStrategy,
    pub seed: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            layout: DEFAULT_MAZE_LAYOUT.to_string(),
            cell_size: CELL_SIZE,
            preys: TOTAL_PREYS,
            hunters: TOTAL_HUNTERS,
            strategy: HunterStrategy::Pack,
            seed: 1,
        }
    }
}

/// Handle for one scheduled frame. Only the most recently issued token can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameToken(u64);

pub struct GameSession {
    maze: Maze,
    options: SessionOptions,
    clock: Box<dyn Clock>,
    rng: Box<dyn RandomSource + Send>,
    observer: Option<TickObserver>,

    screen: GameScreen,
    debug_mode: bool,
    round: u32,
    player: Option<Agent>,
    preys: Vec<Agent>,
    hunters: Vec<Agent>,
    total_preys: usize,
    intent: Intent,
    events: Vec<GameEvent>,
    outcome: Option<Outcome>,
    last_report: TickReport,

    tick: u64,
    ticks_since_frame: u32,
    frame_index: u32,
    pending: Option<FrameToken>,
    next_token: u64,

    started_at: Option<u64>,
    paused_at: Option<u64>,
    over_at: Option<u64>,
    paused_ms: u64,
}

impl GameSession {
    pub fn new(options: SessionOptions, clock: Box<dyn Clock>) -> Result<Self, MazeError> {
        let rng = Box::new(Rng::new(options.seed));
        Self::with_rng(options, clock, rng)
    }

    pub fn with_rng(
        options: SessionOptions,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, MazeError> {
        let maze = Maze::parse(&options.layout, options.cell_size)?;
        Ok(Self {
            maze,
            options,
            clock,
            rng,
            observer: None,
            screen: GameScreen::Loading,
            debug_mode: false,
            round: 0,
            player: None,
            preys: Vec::new(),
            hunters: Vec::new(),
            total_preys: 0,
            intent: Intent::default(),
            events: Vec::new(),
            outcome: None,
            last_report: TickReport {
                captured: 0,
                total_preys: 0,
                elapsed_seconds: 0,
            },
            tick: 0,
            ticks_since_frame: 0,
            frame_index: 0,
            pending: None,
            next_token: 1,
            started_at: None,
            paused_at: None,
            over_at: None,
            paused_ms: 0,
        })
    }

    pub fn set_tick_observer(&mut self, observer: TickObserver) {
        self.observer = Some(observer);
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn screen(&self) -> GameScreen {
        self.screen
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn player(&self) -> Option<&Agent> {
        self.player.as_ref()
    }

    pub fn preys(&self) -> &[Agent] {
        &self.preys
    }

    pub fn hunters(&self) -> &[Agent] {
        &self.hunters
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn last_report(&self) -> TickReport {
        self.last_report
    }

    pub fn set_intent(&mut self, intent: Intent) {
        self.intent = intent;
    }

    /// Elapsed round time, excluding paused spans. Frozen once the round is over.
    pub fn play_time_ms(&self) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let until = self
            .over_at
            .or(self.paused_at)
            .unwrap_or_else(|| self.clock.now_ms());
        until
            .saturating_sub(started_at)
            .saturating_sub(self.paused_ms)
    }

    pub fn assets_loaded(&mut self) {
        if self.screen == GameScreen::Loading {
            self.set_screen(GameScreen::Start);
        }
    }

    pub fn next_screen(&mut self) {
        match self.screen {
            GameScreen::Start => self.set_screen(GameScreen::Tutorial),
            GameScreen::Tutorial => self.start(),
            GameScreen::GameOver | GameScreen::Victory => self.restart(),
            _ => {}
        }
    }

    pub fn restart(&mut self) {
        if !matches!(
            self.screen,
            GameScreen::InGame | GameScreen::Pause | GameScreen::GameOver | GameScreen::Victory
        ) {
            return;
        }
        self.cancel_pending();
        self.start();
    }

    pub fn toggle_pause(&mut self) {
        match self.screen {
            GameScreen::InGame => {
                self.cancel_pending();
                self.paused_at = Some(self.clock.now_ms());
                self.set_screen(GameScreen::Pause);
            }
            GameScreen::Pause => {
                self.fold_pause();
                self.set_screen(GameScreen::InGame);
                self.schedule();
            }
            _ => {}
        }
    }

    /// Debug shortcut that ends a live round as won.
    pub fn force_victory(&mut self) {
        if matches!(self.screen, GameScreen::InGame | GameScreen::Pause) {
            self.fold_pause();
            self.finish(Outcome::Victory);
        }
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
        log::info!("debug mode: {}", if enabled { "on" } else { "off" });
    }

    pub fn log_status(&self) {
        log::info!(
            "status: screen={:?} round={} tick={} preys={}/{} hunters={} elapsed={}ms debug={}",
            self.screen,
            self.round,
            self.tick,
            self.preys.len(),
            self.total_preys,
            self.hunters.len(),
            self.play_time_ms(),
            self.debug_mode
        );
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Runs the frame for `token` and returns whether a tick happened.
    /// Tokens cancelled by pause, restart or the end of a round are rejected.
    pub fn run_frame(&mut self, token: FrameToken) -> bool {
        if self.pending != Some(token) {
            log::debug!("dropping stale frame {:?}", token);
            return false;
        }
        self.pending = None;
        if self.screen != GameScreen::InGame {
            return false;
        }
        self.schedule();
        self.step();
        true
    }

    /// Runs whichever frame is pending.
    pub fn advance(&mut self) -> bool {
        match self.pending {
            Some(token) => self.run_frame(token),
            None => false,
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> RenderSnapshot {
        let maze = &self.maze;
        let view = |agent: &Agent| agent.to_view(agent.target.map(|id| maze.cell(id).coord()));
        let snapshot = RenderSnapshot {
            screen: self.screen,
            tick: self.tick,
            frame_index: self.frame_index,
            round: self.round,
            debug: self.debug_mode,
            player: self.player.as_ref().map(view),
            preys: self.preys.iter().map(view).collect(),
            hunters: self.hunters.iter().map(view).collect(),
            report: self.last_report,
            overlay: if self.debug_mode {
                self.debug_overlay()
            } else {
                None
            },
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            outcome: self.outcome,
            captured: self.total_preys - self.preys.len(),
            total_preys: self.total_preys,
            elapsed_ms: self.play_time_ms(),
            rounds_played: self.round,
            ticks: self.tick,
        }
    }

    fn debug_overlay(&self) -> Option<DebugOverlay> {
        let player = self.player.as_ref()?;
        let current = self.maze.cell_at(player.center())?;
        let cell = self.maze.cell(current);
        Some(DebugOverlay {
            player_cell: cell.coord(),
            decision_points: cell
                .decision_points()
                .iter()
                .map(|dp| self.maze.cell(dp.cell).coord())
                .collect(),
            neighbours: cell
                .neighbours()
                .map(|(dir, id)| {
                    let neighbour = self.maze.cell(id);
                    NeighbourView {
                        dir,
                        cell: neighbour.coord(),
                        wall: neighbour.is_wall(),
                    }
                })
                .collect(),
            distances: self
                .maze
                .open_cells()
                .map(|open| DistanceView {
                    cell: open.coord(),
                    distance: self.maze.maze_distance(open.id(), current),
                })
                .collect(),
        })
    }

    fn start(&mut self) {
        self.round += 1;
        self.tick = 0;
        self.ticks_since_frame = 0;
        self.frame_index = 0;
        self.outcome = None;
        self.spawn_roster();

        self.started_at = Some(self.clock.now_ms());
        self.paused_at = None;
        self.over_at = None;
        self.paused_ms = 0;
        self.last_report = TickReport {
            captured: 0,
            total_preys: self.total_preys,
            elapsed_seconds: 0,
        };

        self.set_screen(GameScreen::InGame);
        self.events.push(GameEvent::RoundStarted { round: self.round });
        log::info!(
            "round {} started: {} preys, {} hunters ({:?})",
            self.round,
            self.preys.len(),
            self.hunters.len(),
            self.options.strategy
        );
        self.schedule();
    }

    fn step(&mut self) {
        self.tick += 1;
        self.ticks_since_frame += 1;
        if self.ticks_since_frame >= TICKS_PER_FRAME {
            self.ticks_since_frame = 0;
            self.frame_index += 1;
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };
        apply_intent(player, self.intent);
        apply_friction(player, FRICTION, MIN_SPEED);

        let maze = &self.maze;
        let debug = self.debug_mode;
        if let Some(player_cell) = maze.cell_at(player.center()) {
            for prey in &mut self.preys {
                let speed = match maze.cell_at(prey.center()) {
                    Some(prey_cell) => {
                        flight_speed(prey, maze.cell(prey_cell), maze.cell(player_cell))
                    }
                    None => prey.speed,
                };
                flee_smartly(prey, player_cell, maze, speed, self.rng.as_mut(), debug);
                update_position(prey, maze);
            }

            match self.options.strategy {
                HunterStrategy::Pack => {
                    apply_pack_pursuit(&mut self.hunters, &*player, player_cell, maze, debug)
                }
                HunterStrategy::Direct => {
                    for hunter in &mut self.hunters {
                        pursue_directly(hunter, player_cell, maze);
                    }
                }
            }
        }
        for hunter in &mut self.hunters {
            update_position(hunter, maze);
        }

        update_position(player, maze);

        let (captured, free): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.preys)
            .into_iter()
            .partition(|prey| prey.collides_with(&*player));
        self.preys = free;
        for prey in captured {
            log::debug!("{} captured", prey.id);
            self.events.push(GameEvent::PreyCaptured {
                prey_id: prey.id,
                remaining: self.preys.len(),
            });
        }

        let frame_index = self.frame_index;
        for agent in std::iter::once(&mut *player)
            .chain(self.preys.iter_mut())
            .chain(self.hunters.iter_mut())
        {
            agent.remember_orientation();
            agent.advance_sprite(frame_index);
        }

        let caught = self
            .hunters
            .iter()
            .any(|hunter| hunter.collides_with(&*player));
        if self.preys.is_empty() {
            self.finish(Outcome::Victory);
        } else if caught {
            self.finish(Outcome::GameOver);
        }

        let report = TickReport {
            captured: self.total_preys - self.preys.len(),
            total_preys: self.total_preys,
            elapsed_seconds: self.play_time_ms() / 1000,
        };
        self.last_report = report;
        if let Some(observer) = self.observer.as_mut() {
            observer(&report);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.cancel_pending();
        self.over_at = Some(self.clock.now_ms());
        self.outcome = Some(outcome);
        self.set_screen(match outcome {
            Outcome::Victory => GameScreen::Victory,
            Outcome::GameOver => GameScreen::GameOver,
        });
        log::info!(
            "round {} over: {:?} after {}ms, {}/{} captured",
            self.round,
            outcome,
            self.play_time_ms(),
            self.total_preys - self.preys.len(),
            self.total_preys
        );
    }

    fn fold_pause(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_ms += self.clock.now_ms().saturating_sub(paused_at);
        }
    }

    fn set_screen(&mut self, screen: GameScreen) {
        if self.screen == screen {
            return;
        }
        log::info!("screen {:?} -> {:?}", self.screen, screen);
        self.screen = screen;
        self.events.push(GameEvent::ScreenChanged { screen });
    }

    fn schedule(&mut self) {
        self.pending = Some(FrameToken(self.next_token));
        self.next_token += 1;
    }

    fn cancel_pending(&mut self) {
        self.pending = None;
    }
}
