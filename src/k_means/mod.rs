mod algorithm;
mod errors;
mod helpers;
mod hyperparams;
mod init;

pub use algorithm::*;
pub use errors::*;
pub use hyperparams::*;
pub use init::*;
