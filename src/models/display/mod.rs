//! Display models for table and JSON output
//!
//! Display models turn domain values into CLI rows with stable column names.

mod channel;
mod resolution;

pub use channel::ChannelDisplay;
pub use resolution::ResolutionDisplay;
