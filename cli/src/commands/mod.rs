pub mod config;
pub mod demo;
pub mod export;
pub mod sample;
pub mod watch;

pub use config::{ConfigAction, ConfigArgs};
pub use demo::DemoArgs;
pub use export::ExportArgs;
pub use sample::SampleArgs;
pub use watch::WatchArgs;
