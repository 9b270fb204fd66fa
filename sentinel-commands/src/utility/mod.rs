pub mod info;

pub use info::info;
