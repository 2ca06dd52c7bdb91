mod rt_thread;
pub mod analyzer;
pub mod cadence;
pub mod controller;
pub mod message;
pub mod noise;
pub mod render;
pub mod runtime;
pub mod service;
pub mod surfaces;

pub use analyzer::{AnalysisDispatch, AnalysisFn, NoiseAnalyzer};
pub use cadence::Cadence;
pub use controller::{ReconfigurationController, Reconfigured};
pub use message::{reply_channel, MonitorMessage, MonitorState, PendingReply, Reply};
pub use noise::{noise_report, ChannelNoise, NoiseReport};
pub use render::{RenderOutcome, RenderScheduler};
pub use runtime::{MonitorRuntime, StepReport};
pub use service::MonitorService;
pub use surfaces::{LogSurface, SvgSurface};
