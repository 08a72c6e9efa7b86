//! hand_stage: interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use gesture_core::AppMode;
use hand_stage::app::run;
use hand_stage::detector::DetectorConfig;
use hand_stage::{AppConfig, AppError, SourceKind};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Hand Stage — gesture-driven particle scene          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = configure().and_then(|cfg| {
        println!();
        println!("  Opening preview window…");
        println!();
        run(cfg)
    }) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure() -> Result<AppConfig, AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(i) = args.iter().position(|a| a == "--config") {
        let path = args
            .get(i + 1)
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Usage("--config needs a file path".into()))?;
        println!("  Config: {}", path.display());
        return AppConfig::load(&path);
    }

    if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: simulated hand, TREE mode, default smoothing\n");
        return Ok(AppConfig::default());
    }

    Ok(configure_interactively())
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    println!("  Landmark source:");
    #[cfg(feature = "leap")]
    println!("    1.Simulator  2.Detector process  3.LeapMotion");
    #[cfg(not(feature = "leap"))]
    println!("    1.Simulator  2.Detector process");
    cfg.source = match read_line("    Choice (default 1): ").trim() {
        "2" => {
            let line = read_line("    Detector command (default: python3 detect_hands.py): ");
            let mut words = line.split_whitespace().map(str::to_string);
            let command = words.next().unwrap_or_else(|| "python3".to_string());
            let mut args: Vec<String> = words.collect();
            if line.trim().is_empty() {
                args.push("detect_hands.py".to_string());
            }
            SourceKind::Detector(DetectorConfig { command, args, min_score: 0.5 })
        }
        #[cfg(feature = "leap")]
        "3" => SourceKind::Leap,
        _ => SourceKind::Sim,
    };

    println!("  Starting mode: 1.TREE  2.TEXT  3.SCATTER  4.LOVE");
    cfg.initial_mode = match read_line("    Choice (default 1): ").trim() {
        "2" => AppMode::Text,
        "3" => AppMode::Scatter,
        "4" => AppMode::Love,
        _   => AppMode::Tree,
    };

    cfg.pipeline.cooldown_ms = read_line("  Mode cooldown ms (default 600): ")
        .trim().parse::<u64>().unwrap_or(600).min(10_000);

    cfg.particle_count = read_line("  Particles (default 1500): ")
        .trim().parse::<usize>().unwrap_or(1_500).clamp(50, 20_000);

    cfg
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
