mod amount;
mod slippage;

pub use amount::*;
pub use slippage::*;
