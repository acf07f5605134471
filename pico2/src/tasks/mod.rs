//! Async tasks for the counter firmware.
//!
//! - `report`: Drains the discharge report queue (RTT log + debug pulse)

pub mod report;

pub use report::{REPORTS, report_task};
