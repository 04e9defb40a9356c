//! Suggest command - the action a computer player picks for the side to move

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use battalion_ai::{AiConfig, PlayerKind};
use battalion_core::Action;

use crate::match_cmd::{load_config, load_level};

#[derive(Args)]
pub struct SuggestArgs {
    /// Level JSON file (built-in skirmish when omitted)
    #[arg(long, value_name = "FILE")]
    pub level: Option<PathBuf>,

    /// Player: greedy, minimax or random
    #[arg(long, default_value = "minimax")]
    pub player: PlayerKind,

    /// Minimax search depth, in actions
    #[arg(long)]
    pub depth: Option<u32>,

    /// AI config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output the action as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SuggestArgs, seed: Option<u64>) -> Result<()> {
    let level = load_level(args.level.as_deref())?;
    let config = AiConfig {
        player: args.player,
        ..load_config(args.config.as_deref(), args.depth, seed)?
    };
    let game = level
        .to_game()
        .with_context(|| format!("Failed to set up level {}", level.name))?;

    let mut player = config.build_player().context("Failed to build player")?;
    let action = player.choose_action(&game).context("Search failed")?;

    tracing::info!("{} suggests {} for {}", args.player, describe(action.as_ref()), game.turn());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&action)?);
    } else {
        println!("{}", describe(action.as_ref()));
    }
    Ok(())
}

fn describe(action: Option<&Action>) -> String {
    match action {
        Some(action) => action.to_string(),
        None => Action::EndTurn.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battalion_core::Cell;

    #[test]
    fn test_describe() {
        assert_eq!(describe(None), "end turn");
        let action = Action::Repair { unit: Cell::new(1, 2) };
        assert_eq!(describe(Some(&action)), "repair (1, 2)");
    }
}
