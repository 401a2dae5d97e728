//! CLI command implementations

pub mod convert;
pub mod inspect;
pub mod plot;
pub mod preview;

pub use convert::ConvertCommand;
pub use inspect::InspectCommand;
pub use plot::PlotCommand;
pub use preview::PreviewCommand;
