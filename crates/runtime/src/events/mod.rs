//! Topic-based event bus for controller events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need.

mod bus;
mod notice;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use notice::NoticeLog;
pub use types::ControllerEvent;
