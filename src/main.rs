use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use maze_chase::{Aggression, Clock, Config, Dir, Event, GameError, GameState, Pos};

const CELL_W: usize = 2;
const DEFAULT_RENDER_FPS: u64 = 60;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Enemy,
    Police,
    Exit,
    Wall,
    Empty,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

/// Appends log lines to a file; the terminal itself is owned by the game.
struct FileLogger {
    file: Mutex<File>,
    started: Instant,
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{:>8.3}s {:<5} {}: {}",
                self.started.elapsed().as_secs_f64(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn init_logging() -> Result<(), GameError> {
    let Ok(path) = std::env::var("MAZE_CHASE_LOG") else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let logger = FileLogger {
        file: Mutex::new(file),
        started: Instant::now(),
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
    Ok(())
}

fn main() -> Result<(), GameError> {
    init_logging()?;
    let config = read_config()?;
    let mut game = GameState::new(&config)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &config, &mut game);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result.map_err(GameError::from)
}

fn read_config() -> Result<Config, GameError> {
    let mut config = match std::env::var("MAZE_CHASE_CONFIG") {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::default(),
    };
    if let Some(seed) = std::env::var("MAZE_CHASE_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        config.seed = Some(seed);
    }
    Ok(config)
}

fn read_render_fps() -> u64 {
    std::env::var("MAZE_CHASE_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS)
}

fn run(stdout: &mut Stdout, config: &Config, game: &mut GameState) -> io::Result<()> {
    let (rows, cols) = game.grid().dimensions();
    let mut renderer = Renderer::new(cols, rows);
    let mut clock = Clock::new(config.timing.clone());
    let mut events = Vec::new();
    let frame_time = Duration::from_micros(1_000_000 / read_render_fps());
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let TermEvent::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let dir = match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Up | KeyCode::Char('k') => Dir::Up,
                    KeyCode::Down | KeyCode::Char('j') => Dir::Down,
                    KeyCode::Left | KeyCode::Char('h') => Dir::Left,
                    KeyCode::Right | KeyCode::Char('l') => Dir::Right,
                    _ => continue,
                };
                game.on_key_move(dir);
            }
        }

        let now = Instant::now();
        events.clear();
        clock.advance(now - last_frame, game, &mut events);
        last_frame = now;
        if events
            .iter()
            .any(|event| matches!(event, Event::MazeRepaired { .. }))
        {
            renderer.needs_full = true;
        }

        render(stdout, game, &mut renderer)?;
        if let Some(outcome) = game.outcome() {
            return render_game_over(stdout, game, &outcome.to_string());
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn render(stdout: &mut Stdout, game: &GameState, renderer: &mut Renderer) -> io::Result<()> {
    let (height, width) = game.grid().dimensions();
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let mode = match game.aggression() {
        Aggression::Calm => "calm",
        Aggression::Aggressive => "AGGRESSIVE",
    };
    let hud = format!(
        "Health: {}  Enemies: {}  Mode: {}  (arrows/hjkl to move, q to quit)",
        game.health(),
        game.enemies().len(),
        mode
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let enemies = game.enemies();
    let police = game.police();
    for y in 0..height {
        for x in 0..width {
            let pos = Pos::new(x, y);
            let cell = cell_for(game, &enemies, &police, pos);
            let idx = y * width + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(game: &GameState, enemies: &[Pos], police: &[Pos], pos: Pos) -> Cell {
    if pos == game.player() {
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if police.contains(&pos) {
        return Cell {
            glyph: Glyph::Police,
            color: Color::Blue,
        };
    }
    if enemies.contains(&pos) {
        return Cell {
            glyph: Glyph::Enemy,
            color: Color::Red,
        };
    }
    if pos == game.exit() {
        return Cell {
            glyph: Glyph::Exit,
            color: Color::Green,
        };
    }
    if game.grid().is_open(pos) {
        Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        }
    } else {
        Cell {
            glyph: Glyph::Wall,
            color: Color::DarkGrey,
        }
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "🙂",
        Glyph::Enemy => "👹",
        Glyph::Police => "👮",
        Glyph::Exit => "🚪",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_game_over(stdout: &mut Stdout, game: &GameState, message: &str) -> io::Result<()> {
    let (height, width) = game.grid().dimensions();
    let (term_w, term_h) = terminal::size()?;
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(MoveTo(0, needed_h))?;
    } else {
        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        stdout.queue(MoveTo(origin_x, origin_y + height as u16))?;
    }
    stdout.queue(Print(format!("{message} (press q to quit)")))?;
    stdout.flush()?;
    loop {
        if event::poll(Duration::from_millis(50))? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}
