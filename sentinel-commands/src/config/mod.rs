pub mod panel;
pub mod session;
pub mod view;

pub use panel::panel;
