pub mod chart;
pub mod decision;
pub mod features;
pub mod memecoin;
pub mod orderbook;
pub mod signal;

pub use chart::*;
pub use decision::*;
pub use features::*;
pub use memecoin::*;
pub use orderbook::*;
pub use signal::*;
