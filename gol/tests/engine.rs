// engine.rs - Whole-run scenarios against real PGM files in a scratch directory

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use gol::io::{decode_pgm, encode_pgm};
use gol::{Board, Cell, Error, Event, IoConfig, Params, State, patterns};
use tokio::sync::mpsc;

fn io_config(dir: &Path) -> IoConfig {
    IoConfig { input_dir: dir.join("images"), output_dir: dir.join("out") }
}

fn write_input(config: &IoConfig, params: &Params, board: &Board) {
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let pixels: Vec<u8> = board.pixels().collect();
    let path = config.input_path(&params.image_name());
    std::fs::write(&path, encode_pgm(&path, board.width(), board.height(), &pixels).unwrap()).unwrap();
}

fn read_output(config: &IoConfig, name: &str) -> Vec<u8> {
    let path = config.output_path(name);
    let bytes = std::fs::read(&path).unwrap();
    decode_pgm(&path, &bytes).unwrap().pixels
}

fn random_board(width: usize, height: usize, seed: u64) -> Board {
    let mut board = Board::new(width, height);
    let mut seed = seed;
    for y in 0..height {
        for x in 0..width {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            board.set_initial(x, y, (seed >> 16) % 3 == 0);
        }
    }
    board
}

fn step(board: &Board) -> Board {
    let mut next = Board::new(board.width(), board.height());
    for cell in board.cells() {
        next.set_initial(cell.x, cell.y, board.next_state(cell.x, cell.y));
    }
    next
}

/// Queues `keys` up front, runs to completion, and returns every event until the stream closed.
async fn run_with_keys(params: Params, config: IoConfig, keys: &[char]) -> (gol::Result<()>, Vec<Event>) {
    let (events_tx, mut events_rx) = mpsc::channel(1024);
    let (keys_tx, keys_rx) = mpsc::channel(16);
    for &key in keys {
        keys_tx.send(key).await.unwrap();
    }

    let engine = tokio::spawn(gol::run(params, config, events_tx, keys_rx));
    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    let outcome = engine.await.unwrap();
    drop(keys_tx);
    (outcome, events)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn glider_keeps_five_cells_and_moves_diagonally() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 4, threads: 4, image_width: 8, image_height: 8 };

    let mut initial = Board::new(8, 8);
    patterns::find("glider").unwrap().stamp(&mut initial, 2, 2);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_keys(params, config.clone(), &[]).await;
    outcome.unwrap();

    let mut board = initial.clone();
    let mut counts = Vec::new();
    for event in &events {
        match event {
            Event::CellFlipped { cell, .. } => board.flip(*cell),
            Event::TurnComplete { .. } => counts.push(board.alive_count()),
            _ => {}
        }
    }
    assert_eq!(counts, vec![5, 5, 5, 5]);

    let shifted: BTreeSet<Cell> =
        initial.alive_cells().iter().map(|c| Cell { x: c.x + 1, y: c.y + 1 }).collect();
    let Some(Event::FinalTurnComplete { turn, alive }) =
        events.iter().find(|e| matches!(e, Event::FinalTurnComplete { .. }))
    else {
        panic!("no FinalTurnComplete in {events:?}");
    };
    assert_eq!(*turn, 4);
    assert_eq!(alive.iter().copied().collect::<BTreeSet<_>>(), shifted);

    let pixels = read_output(&config, "8x8x4-4");
    assert_eq!(pixels, board.pixels().collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn flips_are_exactly_each_turns_difference() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 10, threads: 3, image_width: 16, image_height: 16 };
    let initial = random_board(16, 16, 42);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_keys(params, config, &[]).await;
    outcome.unwrap();

    let mut board = initial;
    let mut turn = 0;
    let mut flips = Vec::new();
    for event in &events {
        match event {
            Event::CellFlipped { turn: t, cell } => {
                assert_eq!(*t, turn, "flip reported outside its turn");
                flips.push(*cell);
            }
            Event::TurnComplete { turn: t } => {
                assert_eq!(*t, turn);
                let next = step(&board);
                let expected: Vec<Cell> =
                    board.cells().filter(|&c| board.is_alive(c) != next.is_alive(c)).collect();
                // Row-major scan order, each coordinate once.
                assert_eq!(flips, expected, "turn {turn}");
                flips.clear();
                board = next;
                turn += 1;
            }
            _ => {}
        }
    }
    assert_eq!(turn, 10);
    assert!(flips.is_empty());
}

#[tokio::test]
async fn double_pause_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 100, threads: 2, image_width: 16, image_height: 16 };
    let initial = random_board(16, 16, 7);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_keys(params, config.clone(), &['p', 'p', 'q']).await;
    outcome.unwrap();

    assert_eq!(
        events,
        vec![
            Event::ImageInputComplete { filename: "16x16".into(), alive: initial.alive_cells() },
            Event::StateChange { turn: 0, state: State::Paused },
            Event::StateChange { turn: 0, state: State::Running },
            Event::ImageOutputComplete { filename: "16x16x2-0".into(), turn: 0 },
            Event::StateChange { turn: 0, state: State::Quitting },
        ]
    );
    assert_eq!(read_output(&config, "16x16x2-0"), initial.pixels().collect::<Vec<_>>());
}

#[tokio::test]
async fn keys_other_than_resume_are_ignored_while_paused() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 100, threads: 2, image_width: 8, image_height: 8 };
    write_input(&config, &params, &random_board(8, 8, 3));

    let (outcome, events) = run_with_keys(params, config, &['p', 's', 'x', 'q', 'p', 'q']).await;
    outcome.unwrap();

    let tail: Vec<&Event> = events.iter().skip(1).collect();
    assert!(matches!(tail[0], Event::StateChange { turn: 0, state: State::Paused }));
    assert!(matches!(tail[1], Event::StateChange { turn: 0, state: State::Running }));
    assert!(matches!(tail[2], Event::ImageOutputComplete { turn: 0, .. }));
    assert!(matches!(tail[3], Event::StateChange { turn: 0, state: State::Quitting }));
    assert_eq!(tail.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn quit_flushes_snapshot_then_closes() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 1_000, threads: 4, image_width: 16, image_height: 12 };
    let initial = random_board(16, 12, 11);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_keys(params, config.clone(), &['q']).await;
    outcome.unwrap();

    let n = events.len();
    assert_eq!(
        &events[n - 2..],
        &[
            Event::ImageOutputComplete { filename: "12x16x4-0".into(), turn: 0 },
            Event::StateChange { turn: 0, state: State::Quitting },
        ]
    );
    let pixels = read_output(&config, "12x16x4-0");
    assert_eq!(pixels.len(), 16 * 12);
    assert_eq!(pixels, initial.pixels().collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn save_keeps_running_to_the_final_turn() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 3, threads: 2, image_width: 10, image_height: 10 };
    let initial = random_board(10, 10, 5);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_keys(params, config.clone(), &['s']).await;
    outcome.unwrap();

    assert_eq!(events[1], Event::ImageOutputComplete { filename: "10x10x2-0".into(), turn: 0 });
    let turns: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::TurnComplete { turn } => Some(*turn),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![0, 1, 2]);

    let expected = step(&step(&step(&initial)));
    let n = events.len();
    assert_eq!(
        &events[n - 3..],
        &[
            Event::FinalTurnComplete { turn: 3, alive: expected.alive_cells() },
            Event::ImageOutputComplete { filename: "10x10x2-3".into(), turn: 3 },
            Event::StateChange { turn: 3, state: State::Quitting },
        ]
    );
    assert_eq!(read_output(&config, "10x10x2-0"), initial.pixels().collect::<Vec<_>>());
    assert_eq!(read_output(&config, "10x10x2-3"), expected.pixels().collect::<Vec<_>>());
}

/// Like `run_with_keys`, but the key source is closed before the engine starts.
async fn run_with_closed_keys(params: Params, config: IoConfig, keys: &[char]) -> (gol::Result<()>, Vec<Event>) {
    let (events_tx, mut events_rx) = mpsc::channel(1024);
    let (keys_tx, keys_rx) = mpsc::channel(16);
    for &key in keys {
        keys_tx.send(key).await.unwrap();
    }
    drop(keys_tx);

    let engine = tokio::spawn(gol::run(params, config, events_tx, keys_rx));
    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    (engine.await.unwrap(), events)
}

#[tokio::test]
async fn closing_keys_while_paused_quits_with_a_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 100, threads: 2, image_width: 8, image_height: 8 };
    let initial = random_board(8, 8, 9);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_closed_keys(params, config.clone(), &['p']).await;
    outcome.unwrap();

    assert_eq!(
        events,
        vec![
            Event::ImageInputComplete { filename: "8x8".into(), alive: initial.alive_cells() },
            Event::StateChange { turn: 0, state: State::Paused },
            Event::ImageOutputComplete { filename: "8x8x2-0".into(), turn: 0 },
            Event::StateChange { turn: 0, state: State::Quitting },
        ]
    );
    assert_eq!(read_output(&config, "8x8x2-0"), initial.pixels().collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn closing_keys_while_running_completes_every_turn() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 5, threads: 3, image_width: 12, image_height: 9 };
    let initial = random_board(12, 9, 21);
    write_input(&config, &params, &initial);

    let (outcome, events) = run_with_closed_keys(params, config.clone(), &[]).await;
    outcome.unwrap();

    let turns: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::TurnComplete { turn } => Some(*turn),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![0, 1, 2, 3, 4]);

    let expected = (0..5).fold(initial, |board, _| step(&board));
    let n = events.len();
    assert_eq!(
        &events[n - 3..],
        &[
            Event::FinalTurnComplete { turn: 5, alive: expected.alive_cells() },
            Event::ImageOutputComplete { filename: "9x12x3-5".into(), turn: 5 },
            Event::StateChange { turn: 5, state: State::Quitting },
        ]
    );
    assert_eq!(read_output(&config, "9x12x3-5"), expected.pixels().collect::<Vec<_>>());
}

#[tokio::test]
async fn zero_params_are_rejected_before_any_event() {
    let dir = tempfile::tempdir().unwrap();
    let params = Params { turns: 10, threads: 0, image_width: 8, image_height: 8 };

    let (outcome, events) = run_with_keys(params, io_config(dir.path()), &[]).await;
    assert!(matches!(outcome, Err(Error::InvalidParam { name: "threads" })));
    assert!(events.is_empty());
}

#[tokio::test]
async fn missing_input_reports_the_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let params = Params { turns: 10, threads: 2, image_width: 8, image_height: 8 };

    let (outcome, events) = run_with_keys(params, io_config(dir.path()), &[]).await;
    match outcome {
        Err(Error::Io { path, .. }) => assert!(path.ends_with("images/8x8.pgm")),
        other => panic!("expected an Io error, got {other:?}"),
    }
    assert!(events.is_empty());
}

#[tokio::test(start_paused = true)]
async fn alive_count_is_reported_once_the_period_elapses() {
    let dir = tempfile::tempdir().unwrap();
    let config = io_config(dir.path());
    let params = Params { turns: 100_000, threads: 2, image_width: 8, image_height: 8 };
    let mut initial = Board::new(8, 8);
    patterns::find("block").unwrap().stamp(&mut initial, 3, 3);
    write_input(&config, &params, &initial);

    let (events_tx, mut events_rx) = mpsc::channel(8);
    let (keys_tx, keys_rx) = mpsc::channel(4);
    keys_tx.send('p').await.unwrap();
    let engine = tokio::spawn(gol::run(params, config, events_tx, keys_rx));

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        match event {
            Event::StateChange { state: State::Paused, .. } => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                keys_tx.send('p').await.unwrap();
            }
            Event::AliveCellsCount { .. } => {
                let _ = keys_tx.send('q').await;
            }
            _ => {}
        }
        events.push(event);
    }
    engine.await.unwrap().unwrap();

    let resumed = events
        .iter()
        .position(|e| matches!(e, Event::StateChange { state: State::Running, .. }))
        .unwrap();
    assert_eq!(events[resumed + 1], Event::AliveCellsCount { turn: 0, count: 4 });
    assert!(matches!(events.last(), Some(Event::StateChange { state: State::Quitting, .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::FinalTurnComplete { .. })));
}
