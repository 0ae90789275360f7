pub mod alert;
pub mod room;
pub mod snapshot;

pub use alert::*;
pub use room::*;
pub use snapshot::*;
