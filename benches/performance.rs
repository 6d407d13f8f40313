use bracket_tui::{
    projection::project,
    puzzle::parse,
    render::{RenderOverlay, render_instructions},
    session::{PuzzleSession, SessionConfig},
    theme::Theme,
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for puzzle operations
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Parsing
/// - Projection to render instructions
/// - Line wrapping and hit regions
/// - A full guess/undo cycle through the session
const SMALL_PUZZLE_CLUES: usize = 10;
const MEDIUM_PUZZLE_CLUES: usize = 100;
const LARGE_PUZZLE_CLUES: usize = 1000;
const HUGE_PUZZLE_CLUES: usize = 10000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 16] = [
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
];

/// Create a puzzle with `num_clues` top-level clues, each nested `depth`
/// levels deep.
fn create_test_puzzle(num_clues: usize, depth: usize) -> String {
    let mut text = String::new();
    for i in 0..num_clues {
        let word = SAMPLE_WORDS[i % SAMPLE_WORDS.len()];
        text.push_str(word);
        text.push(' ');
        for level in 0..depth {
            text.push('[');
            text.push_str(SAMPLE_WORDS[(i + level) % SAMPLE_WORDS.len()]);
            text.push(' ');
        }
        text.push_str("clue");
        for _ in 0..depth {
            text.push(']');
        }
        text.push_str(if i % 7 == 6 { ".\n" } else { " " });
    }
    text
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn puzzle_sizes() -> Vec<(&'static str, usize, usize)> {
    vec![
        ("Small", SMALL_PUZZLE_CLUES, ITERATIONS),
        ("Medium", MEDIUM_PUZZLE_CLUES, ITERATIONS),
        ("Large", LARGE_PUZZLE_CLUES, ITERATIONS / 10),
        ("Huge", HUGE_PUZZLE_CLUES, ITERATIONS / 50),
    ]
}

#[test]
fn bench_parsing() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                 PARSING BENCHMARKS                             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, clues, iterations) in puzzle_sizes() {
        let text = create_test_puzzle(clues, 3);
        let result = benchmark(
            &format!("Parse {} puzzle ({} clues, depth 3)", label, clues),
            iterations,
            || {
                let tree = parse(&text);
                assert_eq!(tree.bracket_count(), clues * 3);
            },
        );
        result.print();
    }
}

#[test]
fn bench_projection() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                 PROJECTION BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, clues, iterations) in puzzle_sizes() {
        let mut tree = parse(&create_test_puzzle(clues, 3));
        // Guess every other innermost clue so both statuses show up.
        for id in (2..tree.bracket_count()).step_by(6) {
            tree.commit_guess(id, "guess");
        }
        let result = benchmark(
            &format!("Project {} puzzle ({} clues)", label, clues),
            iterations,
            || {
                let instructions = project(&tree);
                assert!(!instructions.is_empty());
            },
        );
        result.print();
    }
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (label, clues, iterations) in puzzle_sizes() {
        let tree = parse(&create_test_puzzle(clues, 2));
        let instructions = project(&tree);
        let result = benchmark(
            &format!("Render {} puzzle ({} clues)", label, clues),
            iterations,
            || {
                let rendered =
                    render_instructions(&instructions, 80, 0, RenderOverlay::default(), &theme);
                assert!(!rendered.regions.is_empty());
            },
        );
        result.print();
    }
}

#[test]
fn bench_wrap_width_impact() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                 WRAP WIDTH IMPACT                              ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    let tree = parse(&create_test_puzzle(MEDIUM_PUZZLE_CLUES, 2));
    let instructions = project(&tree);

    for width in [20, 40, 80, 120, 200] {
        let result = benchmark(&format!("Render at width {}", width), ITERATIONS, || {
            let rendered =
                render_instructions(&instructions, width, 0, RenderOverlay::default(), &theme);
            assert!(rendered.total_lines > 0);
        });
        result.print();
    }
}

#[test]
fn bench_guess_undo_cycle() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                 GUESS / UNDO CYCLE                             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let text = create_test_puzzle(LARGE_PUZZLE_CLUES, 3);
    let mut session = PuzzleSession::with_puzzle(SessionConfig::default(), &text);
    let window = session.config().double_click_window;
    let mut now = Instant::now();
    let mut next_id = 0;
    let bracket_count = session.tree().bracket_count();

    // Each guess clones the tree into the history, so this is the cost a
    // user pays per committed answer on a large puzzle.
    let result = benchmark("Guess + undo on 3000 brackets", ITERATIONS / 10, || {
        let id = next_id % bracket_count;
        next_id += 1;
        session.activate(id, now);
        now += window;
        session.tick(now);
        if let Some(edit) = session.editing_mut() {
            edit.set_buffer("answer");
        }
        session.commit_edit();
        session.undo();
    });
    result.print();
    assert_eq!(session.history().len(), 1);
}
