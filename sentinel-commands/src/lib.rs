pub mod config;
pub mod moderation;
pub mod utility;

use sentinel_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    config::panel::META,
    moderation::ban::META,
    utility::info::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![config::panel(), moderation::ban(), utility::info()]
}
