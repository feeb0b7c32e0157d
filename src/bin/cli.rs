use meridian::board::Piece;
use meridian::engine::Engine;
use meridian::logger::init_logging;
use meridian::search::search::{SearchLimits, is_mate_score, mate_distance};
use meridian::square::Square;
use std::io::{self, BufRead};
use std::time::Duration;

fn main() {
    init_logging("logs/meridian.log", "meridian=info");

    let mut engine = Engine::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "position" => handle_position(&mut engine, &parts),
            "go" => handle_go(&mut engine, &parts),
            "move" => {
                if parts.len() > 1 {
                    handle_move(&mut engine, parts[1]);
                }
            }
            "undo" => {
                println!("{}", if engine.undo() { "ok" } else { "nothing to undo" });
            }
            "moves" => {
                let list: Vec<String> =
                    engine.legal_moves().iter().map(|m| m.to_coord()).collect();
                println!("{}", list.join(" "));
            }
            "perft" => {
                if let Some(depth) = parts.get(1).and_then(|s| s.parse().ok()) {
                    println!("{}", engine.perft(depth));
                } else {
                    println!("usage: perft <depth>");
                }
            }
            "eval" => println!("{} cp", engine.eval()),
            "status" => println!("{:?}", engine.status()),
            "fen" | "d" | "display" => println!("{}", engine.current_fen()),
            "quit" | "exit" => break,
            other => println!("unknown command '{}'", other),
        }
    }
}

fn handle_position(engine: &mut Engine, parts: &[&str]) {
    let moves_at = parts.iter().position(|&p| p == "moves");

    let loaded = match parts.get(1) {
        Some(&"startpos") => engine
            .set_position_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .map_err(|e| e.to_string()),
        Some(&"fen") => {
            let end = moves_at.unwrap_or(parts.len());
            let fen = parts[2..end].join(" ");
            engine.set_position_fen(&fen).map_err(|e| e.to_string())
        }
        _ => Err("usage: position startpos|fen <fen> [moves ...]".to_string()),
    };

    if let Err(err) = loaded {
        println!("{}", err);
        return;
    }

    if let Some(idx) = moves_at {
        for text in &parts[idx + 1..] {
            if !apply_move_text(engine, text) {
                println!("illegal move '{}'", text);
                return;
            }
        }
    }
}

fn parse_move_text(text: &str) -> Option<(Square, Square, Option<Piece>)> {
    if text.len() < 4 {
        return None;
    }
    let from: Square = text.get(0..2)?.parse().ok()?;
    let to: Square = text.get(2..4)?.parse().ok()?;
    let promotion = match text.get(4..5) {
        None | Some("") => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return None,
    };
    Some((from, to, promotion))
}

fn apply_move_text(engine: &mut Engine, text: &str) -> bool {
    match parse_move_text(text) {
        Some((from, to, promotion)) => engine.attempt_move(from, to, promotion).accepted,
        None => false,
    }
}

fn handle_move(engine: &mut Engine, text: &str) {
    match parse_move_text(text) {
        Some((from, to, promotion)) => {
            let outcome = engine.attempt_move(from, to, promotion);
            if outcome.accepted {
                println!("ok, status {:?}", outcome.status);
            } else {
                println!("illegal move '{}'", text);
            }
        }
        None => println!("cannot parse move '{}'", text),
    }
}

fn handle_go(engine: &mut Engine, parts: &[&str]) {
    let mut limits = SearchLimits::default();

    let mut i = 1;
    while i < parts.len() {
        match (parts.get(i), parts.get(i + 1)) {
            (Some(&"depth"), Some(v)) => {
                if let Ok(d) = v.parse() {
                    limits.max_depth = d;
                    limits.max_time = None;
                }
                i += 2;
            }
            (Some(&"movetime"), Some(v)) => {
                if let Ok(ms) = v.parse() {
                    limits.max_time = Some(Duration::from_millis(ms));
                }
                i += 2;
            }
            _ => break,
        }
    }

    let report = engine.search_best_move(limits);
    let score = if is_mate_score(report.score) {
        let plies = mate_distance(report.score);
        let sign = if report.score > 0 { "" } else { "-" };
        format!("mate {}{}", sign, (plies as u32).div_ceil(2))
    } else {
        format!("cp {}", report.score)
    };

    match report.best_move {
        Some(mv) => println!(
            "bestmove {} depth {} score {} nodes {} time {}ms",
            mv.to_coord(),
            report.depth,
            score,
            report.nodes,
            report.elapsed.as_millis()
        ),
        None => println!("no move available ({:?})", engine.status()),
    }
}
