use pokemon_battle_learner::learning::{Exploration, RewardShaping, SOFTMAX_TEMPERATURE};
use pokemon_battle_learner::{run, CliOptions, LearnerKind, Mode};
use std::env;
use std::path::PathBuf;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--data DIR] [--mode battle|train] [--learner tabular|linear] \
[--episodes N] [--eval-battles N] [--seed SEED] [--turn-limit N|none] [--alpha A] [--gamma G] \
[--epsilon E] [--softmax] [--shaped-reward] [--weights-in FILE] [--weights-out FILE] [--interactive] \
[--log-level off|error|warn|info|debug|trace]"
    );
    std::process::exit(1);
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str, what: &str) -> anyhow::Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires {what}"))
}

fn parse_args() -> anyhow::Result<(CliOptions, log::LevelFilter)> {
    let mut opts = CliOptions::default();
    let mut log_level = log::LevelFilter::Info;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data" => {
                opts.data_dir = PathBuf::from(next_value(&mut args, "--data", "a directory")?);
            }
            "--mode" => {
                let val = next_value(&mut args, "--mode", "battle or train")?;
                opts.mode = match val.to_ascii_lowercase().as_str() {
                    "battle" => Mode::Battle,
                    "train" => Mode::Train,
                    other => anyhow::bail!("Unknown mode {other} (use battle or train)"),
                };
            }
            "--learner" => {
                let val = next_value(&mut args, "--learner", "tabular or linear")?;
                opts.learner = match val.to_ascii_lowercase().as_str() {
                    "tabular" => LearnerKind::Tabular,
                    "linear" | "approximate" => LearnerKind::Linear,
                    other => anyhow::bail!("Unknown learner {other} (use tabular or linear)"),
                };
            }
            "--episodes" => {
                opts.episodes = next_value(&mut args, "--episodes", "a number")?.parse()?;
            }
            "--eval-battles" => {
                opts.eval_battles = next_value(&mut args, "--eval-battles", "a number")?.parse()?;
            }
            "--seed" => {
                opts.seed = next_value(&mut args, "--seed", "a number")?.parse()?;
            }
            "--turn-limit" => {
                let val = next_value(&mut args, "--turn-limit", "a number or none")?;
                opts.turn_limit = match val.as_str() {
                    "none" => None,
                    n => Some(n.parse()?),
                };
            }
            "--alpha" => {
                opts.params.alpha = next_value(&mut args, "--alpha", "a float")?.parse()?;
            }
            "--gamma" => {
                opts.params.gamma = next_value(&mut args, "--gamma", "a float")?.parse()?;
            }
            "--epsilon" => {
                let epsilon: f64 = next_value(&mut args, "--epsilon", "a float")?.parse()?;
                if !(0.0..=1.0).contains(&epsilon) {
                    anyhow::bail!("--epsilon must be within [0, 1], got {epsilon}");
                }
                opts.params.epsilon = epsilon;
            }
            "--softmax" => {
                opts.params.exploration = Exploration::Softmax {
                    temperature: SOFTMAX_TEMPERATURE,
                };
            }
            "--shaped-reward" => opts.params.reward = RewardShaping::Shaped,
            "--weights-in" => {
                opts.weights_in = Some(PathBuf::from(next_value(&mut args, "--weights-in", "a path")?));
            }
            "--weights-out" => {
                opts.weights_out = Some(PathBuf::from(next_value(&mut args, "--weights-out", "a path")?));
            }
            "--interactive" => opts.interactive = true,
            "--log-level" => {
                let val = next_value(&mut args, "--log-level", "a level")?;
                log_level = val
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Unknown log level {val}"))?;
            }
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok((opts, log_level))
}

fn main() -> anyhow::Result<()> {
    let (opts, log_level) = parse_args()?;
    simple_logger::SimpleLogger::new()
        .with_level(log_level)
        .init()?;
    run(opts)
}
