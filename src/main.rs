//! TETRS rules engine - headless driver
//!
//! Plays a game with a greedy placement bot at a fixed frame rate and
//! reports the result. Usage: `tetrs-rules [pieces] [seed]`.

use std::time::Duration;
use tetrs_rules::game::{Game, GameEvent, GameState};
use tetrs_rules::matrix::{Direction, Matrix};
use tetrs_rules::piece::Piece;
use tetrs_rules::remote::RemoteMirror;
use tetrs_rules::settings::Settings;
use tetrs_rules::tetromino::{Coord, PER_COL_CUBE_NUM, PER_ROW_CUBE_NUM, Rotation};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Pieces to play when no count is given
const DEFAULT_PIECES: u32 = 200;

/// Upper bound on frames, in case the bot stalls
const MAX_FRAMES: u32 = 1_000_000;

/// Get the tetrs temp directory, creating it if needed
fn tetrs_temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("tetrs-rules");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// A planned placement: target rotation and anchor column
#[derive(Debug, Clone, Copy)]
struct Plan {
    turns: usize,
    column: i32,
}

/// Drop `piece` into a copy of `matrix` and rate the result. Higher is better.
fn rate_placement(matrix: &Matrix, piece: Piece) -> Option<f64> {
    let mut trial = matrix.clone();
    if trial.is_collision(&piece.absolute_cells()) {
        return None;
    }
    trial.set_active_piece(Some(piece));
    trial.hard_drop_to_preview();
    trial.lock_piece_into_grid();

    let rows = trial.filled_rows();
    trial.clear_rows(&rows);
    trial.settle();

    let mut heights = [0i32; PER_COL_CUBE_NUM as usize];
    let mut holes = 0;
    for x in 0..PER_COL_CUBE_NUM {
        let mut seen_block = false;
        for y in 0..PER_ROW_CUBE_NUM {
            let filled = trial
                .find_cell(Coord::new(x, y))
                .is_some_and(|cell| cell.filled);
            if filled && !seen_block {
                seen_block = true;
                heights[x as usize] = PER_ROW_CUBE_NUM - y;
            } else if !filled && seen_block {
                holes += 1;
            }
        }
    }
    let aggregate: i32 = heights.iter().sum();
    let bumpiness: i32 = heights.windows(2).map(|w| (w[0] - w[1]).abs()).sum();

    Some(
        0.76 * rows.len() as f64
            - 0.51 * aggregate as f64
            - 0.36 * holes as f64
            - 0.18 * bumpiness as f64,
    )
}

/// Try every rotation and column for the active piece
fn plan_move(game: &Game) -> Option<Plan> {
    let active = *game.active_piece()?;
    let matrix = game.matrix();
    let mut best: Option<(f64, Plan)> = None;

    for (turns, rotation) in Rotation::ALL.into_iter().enumerate() {
        let turned = active.rotated_to(rotation);
        for column in -2..PER_COL_CUBE_NUM + 2 {
            let candidate = turned.translated(Coord::new(column - turned.anchor.x, 0));
            let Some(rating) = rate_placement(matrix, candidate) else {
                continue;
            };
            if best.is_none_or(|(top, _)| rating > top) {
                best = Some((rating, Plan { turns, column }));
            }
        }
    }
    best.map(|(_, plan)| plan)
}

/// Steer the active piece to the planned spot and drop it
fn execute(game: &mut Game, plan: Plan) {
    for _ in 0..plan.turns {
        game.rotate_cw();
    }
    while let Some(piece) = game.active_piece() {
        let direction = match piece.anchor.x.cmp(&plan.column) {
            std::cmp::Ordering::Less => Direction::Right,
            std::cmp::Ordering::Greater => Direction::Left,
            std::cmp::Ordering::Equal => break,
        };
        let moved = match direction {
            Direction::Right => game.move_right(),
            _ => game.move_left(),
        };
        if !moved {
            break;
        }
    }
    game.hard_drop();
}

fn main() {
    let session_id: u32 = rand::random();

    let tetrs_dir = tetrs_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&tetrs_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tetrs_rules=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "TETRS rules starting up, session={:08x}, log={}",
        session_id,
        tetrs_dir.join(&log_file).display()
    );

    let mut args = std::env::args().skip(1);
    let pieces: u32 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PIECES);

    let settings = Settings::load();
    let mut config = settings.game_config();
    if let Some(seed) = args.next().and_then(|arg| arg.parse().ok()) {
        config.seed = Some(seed);
    }
    let start_level = config.start_level;

    let mut game = Game::new(config);
    let mut mirror = RemoteMirror::new();
    game.new_game(start_level);

    let mut locked = 0;
    let mut pending_plan = true;
    for _ in 0..MAX_FRAMES {
        if game.state() == GameState::GameOver || locked >= pieces {
            break;
        }

        if pending_plan && game.active_piece().is_some() {
            pending_plan = false;
            match plan_move(&game) {
                Some(plan) => execute(&mut game, plan),
                None => {
                    game.hard_drop();
                }
            }
        }

        game.update(FRAME_DURATION);

        for event in game.drain_events() {
            match event {
                GameEvent::Spawned(_) => pending_plan = true,
                GameEvent::Locked { .. } => locked += 1,
                GameEvent::LinesCleared { result, .. } => {
                    tracing::info!("{} for {} points", result.action, result.points)
                }
                GameEvent::LevelUp(level) => tracing::info!("level {}", level),
                GameEvent::GameOver { reason } => tracing::info!("game over: {:?}", reason),
                GameEvent::TSpin { .. } => {}
            }
        }

        // Exercise the snapshot path the way an opponent view would
        match game.snapshot_json() {
            Ok(json) => {
                if let Err(e) = mirror.apply_json(&json) {
                    tracing::warn!("Could not mirror snapshot: {}", e);
                }
            }
            Err(e) => tracing::warn!("Could not build snapshot: {}", e),
        }
    }

    if let Err(e) = settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    println!("\nTETRS rules engine");
    println!("Pieces: {}", locked);
    println!("Final Score: {}", mirror.score);
    println!("Level: {} | Lines: {}", mirror.level, mirror.lines);
    if game.state() == GameState::GameOver {
        println!("Topped out");
    }
}
