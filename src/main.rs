//! Circuitry entry point
//!
//! Native builds run a line-based text session on stdin/stdout. The wasm
//! build starts from `circuitry::web`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::{self, BufRead, Write};

    use circuitry::persistence::{FileStore, KeyValueStore};
    use circuitry::sim::{GameEvent, LevelPhase, RotateCommand};
    use circuitry::{Session, TickInput, board_to_ascii};

    const HELP: &str = "commands: r X Y (turn clockwise), c X Y (counter-clockwise), \
                        l N (load level), n (next), reset, help, q";

    /// Parse one command line into a tick input
    pub fn parse_command(line: &str) -> Option<TickInput> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let coords = |clockwise: bool| -> Option<TickInput> {
            let x = parts.get(1)?.parse().ok()?;
            let y = parts.get(2)?.parse().ok()?;
            Some(TickInput {
                rotate: Some(RotateCommand { x, y, clockwise }),
                ..Default::default()
            })
        };
        match parts.first().copied()? {
            "r" => coords(true),
            "c" => coords(false),
            "l" => Some(TickInput {
                load: Some(parts.get(1)?.parse().ok()?),
                ..Default::default()
            }),
            "n" => Some(TickInput {
                advance: true,
                ..Default::default()
            }),
            "reset" => Some(TickInput {
                reload: true,
                ..Default::default()
            }),
            _ => None,
        }
    }

    fn describe(event: &GameEvent) -> String {
        match event {
            GameEvent::LevelLoaded { index } => format!("level {index} loaded"),
            GameEvent::Rotated { pos, rotation } => format!("turned {pos} to {rotation}"),
            GameEvent::RotateRejected { pos } => format!("{pos} cannot be turned"),
            GameEvent::TargetsPowered { powered, total } => {
                format!("{powered}/{total} targets lit")
            }
            GameEvent::LevelComplete {
                moves, new_best, ..
            } => {
                if *new_best {
                    format!("solved in {moves} moves - new best!")
                } else {
                    format!("solved in {moves} moves")
                }
            }
        }
    }

    /// Header line for the current level, honouring the HUD settings
    pub fn status_line<S: KeyValueStore>(session: &Session<S>) -> String {
        let game = session.game();
        let index = game.level_index();
        let mut line = format!(
            "[{}/{}] {}",
            index + 1,
            game.level_count(),
            game.level_name(index).unwrap_or("?")
        );
        if session.settings().show_moves {
            line.push_str(&format!("  moves: {}", game.moves()));
        }
        if session.settings().show_best {
            let best = game.best_moves().best(index);
            line.push_str(&format!(
                "  best: {}",
                best.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string())
            ));
        }
        line
    }

    fn print_status<S: KeyValueStore>(
        session: &Session<S>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        writeln!(out, "\n{}", status_line(session))?;
        write!(out, "{}", board_to_ascii(session.game().board()))
    }

    fn print_events<S: KeyValueStore>(
        session: &mut Session<S>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        for event in session.take_events() {
            writeln!(out, "  {}", describe(&event))?;
            let lit = matches!(event, GameEvent::TargetsPowered { .. });
            if lit && session.connect_volume().is_some() {
                write!(out, "\x07")?;
            }
        }
        Ok(())
    }

    pub fn run() -> io::Result<()> {
        let data_dir =
            std::env::var("CIRCUITRY_DATA").unwrap_or_else(|_| ".circuitry".to_string());
        let mut session = Session::new(FileStore::new(data_dir), rand::random());

        let stdin = io::stdin();
        let mut out = io::stdout();
        writeln!(out, "{HELP}")?;
        session.take_events();
        print_status(&session, &mut out)?;

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line == "q" {
                break;
            }
            if line == "help" || line.is_empty() {
                writeln!(out, "{HELP}")?;
                continue;
            }
            let Some(input) = parse_command(line) else {
                writeln!(out, "? {line}")?;
                continue;
            };

            session.apply(&input);
            print_events(&mut session, &mut out)?;
            print_status(&session, &mut out)?;
            if session.game().phase() == LevelPhase::Complete {
                writeln!(out, "  (n for next level)")?;
            }
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Circuitry (native) starting...");
    if let Err(e) = native::run() {
        log::error!("Session ended with error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is circuitry::web::wasm_start, this is just to satisfy the compiler
}
