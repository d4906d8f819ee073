//! bandit-runner: headless runner for the fraud-model bandit simulator.
//!
//! Usage:
//!   bandit-runner --seed 42 --iterations 1000 --recall-a 0.9 --recall-b 0.5
//!   bandit-runner --config sim.json --iterations 500 --json
//!   bandit-runner --seed 42 --ipc-mode

use anyhow::Result;
use bandit_core::{
    command::SimCommand,
    engine::SimEngine,
    metrics::format_recall,
    snapshot::RunSummary,
    ModelId, SimConfig,
};
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;
    let iterations = parse_arg(&args, "--iterations", 1000u64);
    let ipc_mode = has_flag(&args, "--ipc-mode");
    let json = has_flag(&args, "--json");

    let mut engine = SimEngine::configure(config)?;

    if ipc_mode {
        let stdin = io::stdin();
        return run_ipc_loop(&mut engine, stdin.lock(), io::stdout());
    }

    if !json {
        let c = engine.config();
        println!("Thompson Sampling fraud-model simulator — bandit-runner");
        println!("  seed:        {}", engine.seed());
        println!("  iterations:  {iterations}");
        println!("  recall A/B:  {} / {}", c.recall_a, c.recall_b);
        println!("  delay:       {}", c.feedback_delay);
        println!("  fraud rate:  {}", c.fraud_rate);
        println!("  decay:       {}", c.decay_rate);
        println!();
    }

    let summary = engine.run(iterations)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Defaults, then an optional --config JSON file, then individual flags.
fn build_config(args: &[String]) -> Result<SimConfig> {
    let base = match arg_value(args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let seed = parse_opt_arg::<u64>(args, "--seed").or(base.seed);

    Ok(SimConfig {
        recall_a:       parse_arg(args, "--recall-a", base.recall_a),
        recall_b:       parse_arg(args, "--recall-b", base.recall_b),
        feedback_delay: parse_arg(args, "--delay", base.feedback_delay),
        fraud_rate:     parse_arg(args, "--fraud-rate", base.fraud_rate),
        decay_rate:     parse_arg(args, "--decay", base.decay_rate),
        seed,
    })
}

/// Serve line-delimited JSON commands until `quit` or end of input.
/// Every command gets exactly one reply line: the run summary, or
/// `{"error": ...}` when the command fails to parse or to execute.
fn run_ipc_loop(engine: &mut SimEngine, mut input: impl BufRead, mut output: impl Write) -> Result<()> {
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = input.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: SimCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unparseable command: {}", buffer.trim());
                write_error(&mut output, &e.to_string())?;
                continue;
            }
        };

        let outcome = match cmd {
            SimCommand::Quit => break,
            SimCommand::Run { count } => engine.run(count).map(|_| ()),
            SimCommand::GetState => Ok(()),
            SimCommand::Reset => {
                engine.reset();
                Ok(())
            }
            SimCommand::UpdateParameters { config } => engine.patch_parameters(&config),
        };

        match outcome {
            Ok(()) => writeln!(output, "{}", serde_json::to_string(&engine.summary())?)?,
            Err(e) => write_error(&mut output, &e.to_string())?,
        }
        output.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  final iteration: {}", summary.iteration);
    match summary.last_selected {
        Some(model) => println!("  last selected:   {model}"),
        None => println!("  last selected:   (none)"),
    }
    println!("  overall TP/FN:   {} / {}", summary.overall.true_positives, summary.overall.false_negatives);
    println!("  overall recall:  {}", format_recall(summary.overall_recall));
    println!("  pending:         {}", summary.pending_feedback);

    println!();
    println!("=== MODELS ===");
    for model in ModelId::ALL {
        let m = summary.model(model);
        println!(
            "  {model} | selected {:>6} | Beta({:.2}, {:.2}) mean {:.3} | TP {} FN {} | recall {}",
            m.selection_count,
            m.alpha,
            m.beta,
            m.posterior_mean,
            m.counts.true_positives,
            m.counts.false_negatives,
            format_recall(m.observed_recall),
        );
    }

    println!();
    println!("=== RECENT PRIOR UPDATES ===");
    if summary.recent_updates.is_empty() {
        println!("  (No prior updates yet)");
    }
    for r in &summary.recent_updates {
        println!(
            "  iter {:>6} | {} {} (selected {}) | alpha {:.3} -> {:.3} | beta {:.3} -> {:.3}",
            r.iteration,
            r.model,
            r.outcome.label(),
            r.selected_at,
            r.old_alpha,
            r.new_alpha,
            r.old_beta,
            r.new_beta,
        );
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    parse_opt_arg(args, flag).unwrap_or(default)
}

/// Parsed flag value. A present but malformed value is logged and
/// treated as absent.
fn parse_opt_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let raw = arg_value(args, flag)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring malformed value {raw:?} for {flag}");
            None
        }
    }
}
