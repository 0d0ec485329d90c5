//! # Blackjack DQN
//!
//! Learns a blackjack play policy (hit / stand / double) with a deep
//! Q-network trained on simulated hands, then exports the learned value
//! function as a compact safetensors artifact for a game client.
//!
//! ## Modules
//!
//! - [`game`]: Hand simulator: shoe, hand totals, dealer policy, state encoding
//! - [`ai`]: Agent trait, DQN agent, value network, random baseline
//! - [`training`]: Training session, replay buffer, metrics, run stats
//! - [`export`]: Model export with int8 quantization and read-back
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod export;
pub mod game;
pub mod training;
