pub mod addon;
pub mod app;
pub mod catalog;
pub mod customization;
pub mod session;
pub mod store;

pub use app::run;
