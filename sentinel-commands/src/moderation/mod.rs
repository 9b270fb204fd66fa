pub mod ban;
pub(crate) mod embeds;
pub mod gate;

pub use ban::ban;
