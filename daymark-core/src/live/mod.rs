//! Push channel for live ingestion progress.

mod channel;
mod message;
mod transport;

pub use channel::{ChannelState, LiveStatusChannel, RefreshTrigger};
pub use message::{ClientMessage, LiveEvent, interpret};
pub use transport::{PushConnection, PushTransport, WebSocketTransport};
