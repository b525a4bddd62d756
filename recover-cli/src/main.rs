// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recovers Xorshift128+ state from a captured `Math.random()` sequence and
//! predicts the outcomes of a coin-flip site built on top of it.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rng_recovery::{recover_rng, Engine};
use rng_xorshift128plus::JsRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum JsEngine {
    V8,
    Spidermonkey,
}

impl From<JsEngine> for Engine {
    fn from(engine: JsEngine) -> Self {
        match engine {
            JsEngine::V8 => Engine::V8,
            JsEngine::Spidermonkey => Engine::SpiderMonkey,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Website {
    /// https://edjefferson.com/probable/ — one draw per flip.
    Probable,
    /// https://www.google.com/search?q=coin+flip — burns 4 extra draws
    /// between flips.
    Google,
}

#[derive(Parser)]
#[command(name = "recover-cli")]
#[command(about = "Recover Xorshift128+ state from Math.random() outputs and predict future calls")]
#[command(version)]
struct Cli {
    /// JavaScript engine the observations were captured from.
    #[arg(long, value_enum)]
    js_engine: JsEngine,

    /// Coin-flip site whose future results to predict.
    #[arg(long, value_enum)]
    website: Website,

    /// Number of coin flips to predict per recovered candidate.
    #[arg(long, default_value_t = 15)]
    amount: usize,

    /// Path to a JSON array of observed Math.random() outputs.
    #[arg(long, default_value = "observations.json")]
    json_path: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.json_path)
        .with_context(|| format!("reading observations from {}", cli.json_path.display()))?;
    let observations: Vec<f64> =
        serde_json::from_str(&raw).context("observations file is not a JSON array of numbers")?;

    let candidates = recover_rng(&observations, cli.js_engine.into())
        .context("recovering Xorshift128+ state")?;

    let mut found = false;
    for mut rng in candidates {
        found = true;
        let (s0, s1) = rng.state();
        println!("state[0]=0x{s0:016X} state[1]=0x{s1:016X}");
        let predictions = match cli.website {
            Website::Probable => predict_probable_coin(&mut rng, cli.amount),
            Website::Google => predict_google_coin(&mut rng, cli.amount),
        };
        for flip in predictions {
            println!("{flip}");
        }
    }
    if !found {
        println!("no candidate state reproduces the given observations");
    }

    Ok(())
}

/// https://edjefferson.com/probable/: one `Math.random()` call per flip.
fn predict_probable_coin(rng: &mut JsRng, amount: usize) -> Vec<&'static str> {
    (0..amount).map(|_| flip(rng)).collect()
}

/// https://www.google.com/search?q=coin+flip: one call decides the flip,
/// then 4 more calls are drawn and discarded before the next one.
fn predict_google_coin(rng: &mut JsRng, amount: usize) -> Vec<&'static str> {
    (0..amount)
        .map(|_| {
            let result = flip(rng);
            for _ in 0..4 {
                rng.math_random();
            }
            result
        })
        .collect()
}

fn flip(rng: &mut JsRng) -> &'static str {
    if rng.math_random() < 0.5 {
        "Heads"
    } else {
        "Tails"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probable_coin_draws_exactly_one_call_per_flip() {
        let mut a = JsRng::new_spidermonkey(1, 2);
        let mut b = JsRng::new_spidermonkey(1, 2);
        let flips = predict_probable_coin(&mut a, 5);
        assert_eq!(flips.len(), 5);
        for expected_flip in flips {
            let expected = if b.math_random() < 0.5 { "Heads" } else { "Tails" };
            assert_eq!(expected, expected_flip);
        }
    }

    #[test]
    fn google_coin_burns_four_draws_between_flips() {
        let mut a = JsRng::new_spidermonkey(7, 9);
        let mut b = JsRng::new_spidermonkey(7, 9);
        let flips = predict_google_coin(&mut a, 3);
        assert_eq!(flips.len(), 3);
        for expected_flip in flips {
            let expected = if b.math_random() < 0.5 { "Heads" } else { "Tails" };
            assert_eq!(expected, expected_flip);
            for _ in 0..4 {
                b.math_random();
            }
        }
    }
}
