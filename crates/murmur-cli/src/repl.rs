//! The interactive command loop.
//!
//! Lines starting with `@` are commands mapping straight onto graph-store
//! operations; anything else is dialogue the bot learns and answers.

use std::io::{self, BufRead};
use std::path::Path;
use tracing::warn;

use murmur_core::{Node, NodeId, NodeKind, PropagationParams};

use crate::bot::Bot;

const HELP: &str = "@help: give this help
@addnode name: add the node given
@addlink node1 node2 [label]: add a link from node1 to node2
@activate name [activation value]: activate a node from its name
@propagate [nb]: propagate the activation nb times
@shownodes: show the nodes in the concept network
@showlinks: show the links in the concept network
@showstate: show the state of the nodes
@save: save the concept network and its states
@quit: quit without saving";

/// Run the loop until `@quit` or end of input.
pub fn run(bot: &mut Bot, data_dir: &Path) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('@') {
            if !handle_command(bot, data_dir, command)? {
                break;
            }
        } else {
            if let Err(err) = bot.learn(line) {
                warn!(%err, "could not learn the entry");
                continue;
            }
            match bot.reply() {
                Ok(Some(reply)) => println!("{}> {}", bot.bot_name(), reply),
                Ok(None) => println!("{}> ...", bot.bot_name()),
                Err(err) => warn!(%err, "could not generate a reply"),
            }
        }
    }
    Ok(())
}

/// Handle one `@` command; `Ok(false)` ends the loop.
fn handle_command(bot: &mut Bot, data_dir: &Path, command: &str) -> anyhow::Result<bool> {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let params: Vec<&str> = parts.collect();

    match verb {
        "help" => println!("{HELP}"),
        "quit" => return Ok(false),
        "addnode" => match params.first() {
            Some(symbol) => {
                bot.network_mut().add_node(Node::basic(*symbol))?;
                println!("Node \"{symbol}\" added");
            }
            None => println!("usage: @addnode name"),
        },
        "addlink" => match params.len() {
            2 | 3 => {
                let Some(ids) = resolve_nodes(bot, &params) else {
                    return Ok(true);
                };
                let label = ids.get(2).copied();
                bot.network_mut().add_link(ids[0], ids[1], label)?;
                println!("Link added from \"{}\" to \"{}\"", params[0], params[1]);
            }
            _ => {
                println!("{}", murmur_core::CoreError::IncompleteLink);
                println!("usage: @addlink node1 node2 [label]");
            }
        },
        "activate" => match params.first() {
            Some(symbol) => {
                if !bot.network().contains_node(symbol, NodeKind::Basic) {
                    println!("The node \"{symbol}\" does not exist!");
                    return Ok(true);
                }
                let value: f64 = match params.get(1).map(|raw| raw.parse()) {
                    Some(Ok(value)) => value,
                    Some(Err(_)) => {
                        println!("usage: @activate name [activation value]");
                        return Ok(true);
                    }
                    None => 100.0,
                };
                bot.ensure_state()?;
                let username = bot.username().to_string();
                let key = murmur_core::NodeKey::new(symbol.to_string(), NodeKind::Basic);
                let state = bot.network_mut().state_mut(&username)?;
                if value == 100.0 {
                    state.fully_activate(&key);
                } else if let Err(err) = state.set_activation(&key, value) {
                    println!("{err}");
                }
            }
            None => println!("usage: @activate name [activation value]"),
        },
        "propagate" => {
            let steps: u32 = match params.first().map(|raw| raw.parse()) {
                Some(Ok(steps)) => steps,
                Some(Err(_)) => {
                    println!("usage: @propagate [nb]");
                    return Ok(true);
                }
                None => 1,
            };
            bot.ensure_state()?;
            let username = bot.username().to_string();
            for _ in 0..steps {
                bot.network_mut()
                    .fast_propagate_activations(&username, PropagationParams::fast())?;
            }
        }
        "shownodes" => {
            for (_, node) in bot.network().nodes() {
                println!("{node}");
            }
        }
        "showlinks" => {
            let state = bot.network().state(bot.username()).ok().cloned();
            for link in bot.network().links() {
                println!("{}", bot.network().link_summary(link, state.as_ref()));
            }
        }
        "showstate" => match bot.network().state(bot.username()) {
            Ok(state) => print!("{state}"),
            Err(_) => println!("No state yet for \"{}\"", bot.username()),
        },
        "save" => {
            bot.save(data_dir)?;
            println!("Concept network saved in \"{}\"", data_dir.display());
        }
        _ => println!("Unknown command \"@{verb}\"; try @help"),
    }
    Ok(true)
}

/// Look up every symbol as a basic node, reporting the first missing one.
fn resolve_nodes(bot: &Bot, symbols: &[&str]) -> Option<Vec<NodeId>> {
    let mut ids = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match bot.network().node_id(symbol, NodeKind::Basic) {
            Ok(id) => ids.push(id),
            Err(_) => {
                println!("The node \"{symbol}\" does not exist!");
                return None;
            }
        }
    }
    Some(ids)
}
