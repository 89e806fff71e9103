//! The murmur bot: wires entry segmentation to the concept network.
//!
//! Learning turns each sentence of an entry into graph structure — an
//! utterer node, a sentence node, token nodes with their position counters,
//! and the links between them — and fully activates everything just seen in
//! the utterer's state. Replying spreads that activation, seeds on a hot
//! token, and walks the token links both ways to assemble a sentence.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use murmur_core::{
    ConceptNetwork, CoreError, Node, NodeId, PropagationParams, State, Temperature, TokenPosition,
};
use murmur_text::{Entry, TextError, BOT_PLACEHOLDER, USER_PLACEHOLDER};

use crate::config::{Config, ReplyConfig};

/// Name of the graph snapshot inside the data directory.
const NETWORK_FILE: &str = "network.bin";

/// Errors raised by bot operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("data directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file error: {0}")]
    StateFile(#[from] bincode::Error),
}

pub type BotResult<T> = Result<T, BotError>;

/// A learning chatterbot over one concept network.
pub struct Bot {
    network: ConceptNetwork,
    bot_name: String,
    username: String,
    reply: ReplyConfig,
    rng: ChaCha8Rng,
    dialogue_opened: bool,
}

impl Bot {
    /// A bot with a fresh network and an entropy-seeded generator.
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// A bot with a deterministic generator, for reproducible runs.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: ChaCha8Rng) -> Self {
        Self {
            network: ConceptNetwork::new(),
            bot_name: config.bot_name.clone(),
            username: config.username.clone(),
            reply: config.reply.clone(),
            rng,
            dialogue_opened: false,
        }
    }

    pub fn network(&self) -> &ConceptNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut ConceptNetwork {
        &mut self.network
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Switch the current utterer; their state is created on first use.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub(crate) fn ensure_state(&mut self) -> BotResult<()> {
        if !self.network.has_state(&self.username) {
            self.network.add_state(State::new(self.username.clone()))?;
        }
        Ok(())
    }

    /// Learn one line of dialogue from the current utterer.
    pub fn learn(&mut self, line: &str) -> BotResult<()> {
        self.ensure_state()?;
        let mut entry = Entry::new(line, &self.username, &self.bot_name)?;
        let sentences: Vec<String> = entry.sentences().to_vec();

        let utterer = self.network.add_node(Node::utterer(self.username.clone()))?;
        let mut activated: Vec<NodeId> = vec![utterer];

        for sentence in &sentences {
            let tokens = Entry::tokens(sentence);
            if tokens.is_empty() {
                continue;
            }

            let opens_dialogue = !self.dialogue_opened;
            self.dialogue_opened = true;
            let sentence_id = self
                .network
                .add_node(Node::sentence(sentence.clone(), opens_dialogue))?;
            self.network
                .add_bidirectional_link(utterer, sentence_id, None)?;
            activated.push(sentence_id);

            let last = tokens.len() - 1;
            let mut previous: Option<NodeId> = None;
            for (index, token) in tokens.iter().enumerate() {
                let position = if index == 0 {
                    TokenPosition::Beginning
                } else if index == last {
                    TokenPosition::End
                } else {
                    TokenPosition::Middle
                };
                let token_id = self.network.add_node(Node::token(token.clone(), position))?;
                if let Some(previous) = previous {
                    self.network.add_link(previous, token_id, None)?;
                }
                self.network.add_link(token_id, sentence_id, None)?;
                previous = Some(token_id);
                activated.push(token_id);
            }
        }

        let keys: Vec<_> = activated
            .iter()
            .map(|&id| self.network.node(id).map(|node| node.key()))
            .collect::<Result<_, _>>()?;
        let state = self.network.state_mut(&self.username)?;
        for key in keys {
            state.fully_activate(&key);
        }

        debug!(
            utterer = %self.username,
            sentences = sentences.len(),
            nodes = self.network.node_count(),
            links = self.network.link_count(),
            "learned entry"
        );
        Ok(())
    }

    /// Generate a reply for the current utterer, or `None` when nothing in
    /// their state is activated enough to seed one.
    pub fn reply(&mut self) -> BotResult<Option<String>> {
        if !self.network.has_state(&self.username) {
            return Ok(None);
        }
        let params = PropagationParams::fast()
            .with_normal_incoming_links(self.reply.normal_incoming_links)
            .with_memory_perf(self.reply.memory_perf);
        for _ in 0..self.reply.propagation_steps {
            self.network
                .fast_propagate_activations(&self.username, params)?;
        }

        self.network.state_mut(&self.username)?.clean();

        let temperature = Temperature::new(self.reply.temperature)?;
        let state = self.network.state(&self.username)?.clone();

        // Start just under the hottest token and lower the bar stepwise
        // until some token qualifies as a seed.
        let hottest = state.maximum_activation(&[murmur_core::NodeKind::Token]);
        if hottest < 1.0 {
            return Ok(None);
        }
        let mut threshold = self.reply.seed_threshold.min(hottest - 1.0);
        let seed = loop {
            match self
                .network
                .choose_activated_token(&state, threshold, &temperature, &mut self.rng)
            {
                Ok(seed) => break seed,
                Err(CoreError::NoCandidates) => {
                    threshold -= 10.0;
                    if threshold < 0.0 {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };

        let sequence =
            self.network
                .generate_sequence(&state, seed, &temperature, &mut self.rng)?;
        let mut tokens = Vec::with_capacity(sequence.len());
        for id in sequence {
            tokens.push(self.network.node(id)?.symbol().to_string());
        }
        let text = join_tokens(&tokens)
            .replace(BOT_PLACEHOLDER, &self.bot_name)
            .replace(USER_PLACEHOLDER, &self.username);
        Ok(Some(text))
    }

    /// Persist the graph snapshot and every state to `dir`.
    pub fn save(&self, dir: &Path) -> BotResult<()> {
        fs::create_dir_all(dir)?;
        write_atomic(&dir.join(NETWORK_FILE), &self.network.dump()?)?;
        for id in self.network.state_ids() {
            let state = self.network.state(id)?;
            let bytes = bincode::serialize(state)?;
            write_atomic(&dir.join(state_file_name(id)), &bytes)?;
        }
        info!(
            dir = %dir.display(),
            nodes = self.network.node_count(),
            states = self.network.state_ids().count(),
            "saved concept network"
        );
        Ok(())
    }

    /// Restore the graph snapshot and the saved states from `dir`, if any.
    pub fn load(&mut self, dir: &Path) -> BotResult<()> {
        let network_path = dir.join(NETWORK_FILE);
        if !network_path.exists() {
            return Ok(());
        }
        self.network = ConceptNetwork::restore(&fs::read(&network_path)?)?;

        // The snapshot carries no states; they live in their own files.
        for dir_entry in fs::read_dir(dir)? {
            let path = dir_entry?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !name.starts_with("state_") || !name.ends_with(".bin") {
                continue;
            }
            let state: State = bincode::deserialize(&fs::read(&path)?)?;
            self.network.add_state(state)?;
        }
        Ok(())
    }
}

/// Write through a sibling temp file and rename, so a crash mid-write never
/// leaves a truncated snapshot behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn state_file_name(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("state_{safe}.bin")
}

/// Join tokens into a sentence, gluing pure punctuation to the word before
/// it.
fn join_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        let glue = !token.is_empty()
            && token
                .chars()
                .all(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'));
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}
