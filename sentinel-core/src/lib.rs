pub mod panels;

use sentinel_store::ConfigStore;

pub use panels::{PanelLease, PanelRegistry};

pub type Error = anyhow::Error;

#[derive(Clone, Debug)]
pub struct Data {
    pub store: ConfigStore,
    pub panels: PanelRegistry,
}

impl Data {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            panels: PanelRegistry::default(),
        }
    }
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
