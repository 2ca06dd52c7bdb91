pub mod ingest;
pub mod manual;
pub mod simulated;
pub mod source;

pub use ingest::{IngestStatus, StreamIngest};
pub use manual::{ManualFeed, ManualSource};
pub use simulated::{FieldModel, SimulatedSource};
pub use source::{StreamSource, Subscription};
