mod channel;
mod commands;

pub use channel::{CommandReceiver, SceneHandle, command_channel};
pub use commands::{HostCommand, SceneIntent};
