pub mod auction;
pub mod cdp;
pub mod host;
pub mod math;
pub mod types;

pub mod testing;
