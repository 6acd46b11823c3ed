//! Upstream line protocol.
//!
//! ```text
//!   Transport ─▶ line::LineDecoder ─▶ command::parse ─▶ handler::dispatch
//!                                                          │
//!   Transport ◀─ line::LineLink ◀──── reply::Reply ◀───────┘
//! ```

pub mod command;
pub mod handler;
pub mod line;
pub mod reply;
pub mod transport;

pub use command::{Command, ConfigToggle, Dose};
pub use handler::{Peripherals, handle_line};
pub use line::{Line, LineDecoder, LineLink};
pub use reply::Reply;
pub use transport::Transport;
