pub mod datasets;
pub mod dispatch;
pub(crate) mod run;

pub use dispatch::dispatch;
