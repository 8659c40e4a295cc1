pub mod candles;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod trend;
pub mod analyzer;


pub use candles::*;
pub use indicators::*;
pub use levels::*;
pub use patterns::*;
pub use trend::*;
pub use analyzer::*;
