pub mod alert;
pub mod crosschain;
pub mod emergency;
pub mod report;
pub mod risk;
pub mod snapshot;

pub use alert::*;
pub use crosschain::*;
pub use emergency::*;
pub use report::*;
pub use risk::*;
pub use snapshot::*;
