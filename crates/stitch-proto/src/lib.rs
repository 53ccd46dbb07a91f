pub mod color;
pub mod order;
pub mod snapshot;

pub use color::NamedColor;
pub use order::{OrderValidationError, PendingOrder, WireOrder};
pub use snapshot::{SnapshotAck, SnapshotMeta};
