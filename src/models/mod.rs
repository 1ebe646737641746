pub mod request;
pub mod trading_result;

pub use request::*;
pub use trading_result::*;
