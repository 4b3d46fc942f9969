//! File finder: an inline fuzzy picker drawn below the shell prompt.
//!
//! Type to filter, Up/Down to move the selection, Enter to pick, Esc to
//! quit. Resizes are coalesced on the resize actor before relayout.
//!
//! Logging goes to stderr; run with `RUST_LOG=jumper=debug 2>finder.log`
//! to watch render passes.

use crossbeam_channel::bounded;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use jumper::{DivisionSpec, Engine, EngineConfig, OverflowY, ResizeActor, Scrollbar};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const FILES: &[&str] = &[
    "Cargo.toml",
    "README.md",
    "benches/measure_benchmark.rs",
    "benches/render_benchmark.rs",
    "demos/file_finder.rs",
    "src/engine/config.rs",
    "src/engine/injects.rs",
    "src/engine/mod.rs",
    "src/engine/orchestrator.rs",
    "src/engine/resize.rs",
    "src/engine/target.rs",
    "src/error.rs",
    "src/expr/lexer.rs",
    "src/expr/mod.rs",
    "src/expr/parser.rs",
    "src/expr/reference.rs",
    "src/expr/units.rs",
    "src/graph/mod.rs",
    "src/layout/division.rs",
    "src/layout/mod.rs",
    "src/layout/rect.rs",
    "src/layout/scrollbar.rs",
    "src/layout/spec.rs",
    "src/lib.rs",
    "src/terminal/backend.rs",
    "src/terminal/mod.rs",
    "src/terminal/output.rs",
    "src/text/ansi.rs",
    "src/text/block.rs",
    "src/text/mod.rs",
    "src/text/wrap.rs",
    "tests/proptest_invariants.rs",
    "tests/render_scenarios.rs",
];

/// Subsequence match: every query character appears in order.
fn matches(path: &str, query: &str) -> bool {
    let mut chars = path.chars().map(|c| c.to_ascii_lowercase());
    query
        .chars()
        .all(|q| chars.any(|c| c == q.to_ascii_lowercase()))
}

struct Finder {
    query: String,
    selected: usize,
}

impl Finder {
    fn results(&self) -> Vec<&'static str> {
        FILES
            .iter()
            .copied()
            .filter(|path| matches(path, &self.query))
            .collect()
    }

    fn draw(&self, engine: &mut Engine) -> jumper::Result<()> {
        let results = self.results();
        let listing = if results.is_empty() {
            "no matches".dark_grey().to_string()
        } else {
            results
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    if i == self.selected {
                        format!("> {}", path.bold().cyan())
                    } else {
                        format!("  {path}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        engine.set_block_content("prompt.query", format!("find: {}", self.query))?;
        engine.set_content("results", [listing])?;
        engine.set_block_content(
            "status.count",
            format!("{}/{}", results.len(), FILES.len()).dark_grey().to_string(),
        )?;

        // keep the selection visible, then park the cursor after the query
        engine.jump_to("results", 0, isize::try_from(self.selected).unwrap_or(0))?;
        engine.jump_to("prompt.query", -1, 0)
    }
}

fn layout() -> Vec<DivisionSpec> {
    vec![
        DivisionSpec::new("prompt").top(0).left(0).width("100% - 10"),
        DivisionSpec::new("status").top(0).right(0).width(10),
        DivisionSpec::new("results")
            .top("{prompt}")
            .left(0)
            .width("100%")
            .height(10)
            .overflow_y(OverflowY::Scroll)
            .scrollbar_y(Scrollbar::vertical()),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::default();
    let window = config.resize_debounce;
    let mut engine = Engine::with_config(layout(), config)?;
    engine.add_block("prompt", "find: ", Some("query"), None)?;
    engine.add_block("status", "", Some("count"), None)?;

    let (raw_tx, raw_rx) = bounded(16);
    let resizer = ResizeActor::spawn(raw_rx, window)?;

    let mut finder = Finder {
        query: String::new(),
        selected: 0,
    };

    terminal::enable_raw_mode()?;
    let outcome = run(&mut engine, &mut finder, &raw_tx, &resizer);
    engine.erase()?;
    terminal::disable_raw_mode()?;
    drop(raw_tx);
    resizer.join();

    if let Some(path) = outcome? {
        println!("{path}");
    }
    Ok(())
}

fn run(
    engine: &mut Engine,
    finder: &mut Finder,
    resizes: &crossbeam_channel::Sender<(u16, u16)>,
    resizer: &ResizeActor,
) -> Result<Option<&'static str>, Box<dyn std::error::Error>> {
    finder.draw(engine)?;

    loop {
        while let Ok((width, height)) = resizer.receiver().try_recv() {
            engine.resize(width, height);
            finder.draw(engine)?;
        }

        if !event::poll(Duration::from_millis(25))? {
            continue;
        }

        match event::read()? {
            Event::Resize(width, height) => {
                let _ = resizes.try_send((width, height));
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(None);
                }
                KeyCode::Enter => return Ok(finder.results().get(finder.selected).copied()),
                KeyCode::Up => {
                    finder.selected = finder.selected.saturating_sub(1);
                    finder.draw(engine)?;
                }
                KeyCode::Down => {
                    let last = finder.results().len().saturating_sub(1);
                    finder.selected = (finder.selected + 1).min(last);
                    finder.draw(engine)?;
                }
                KeyCode::Backspace => {
                    finder.query.pop();
                    finder.selected = 0;
                    finder.draw(engine)?;
                }
                KeyCode::Char(c) => {
                    finder.query.push(c);
                    finder.selected = 0;
                    finder.draw(engine)?;
                }
                _ => {}
            },
            _ => {}
        }
    }
}
