pub mod buffer;
pub mod config;
pub mod error;
pub mod sample;
pub mod series;
pub mod settings;
pub mod surface;

pub use buffer::{SampleBuffer, SharedBuffer, Snapshot};
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use sample::{Sample, CHANNELS};
pub use series::{readout, PlotFrame};
pub use settings::MonitorSettings;
pub use surface::{DisplayMetadata, MemorySurface, RenderSurface};
