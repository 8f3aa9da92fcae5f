use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use log::warn;

use super::HostCommand;

/// Create the host-to-composer command channel
pub fn command_channel() -> (SceneHandle, CommandReceiver) {
    let (sender, receiver) = unbounded();
    (SceneHandle { sender }, CommandReceiver { receiver })
}

/// The host's side of the channel. Cheap to clone, so the upload and emoji
/// collaborators can each hold one.
#[derive(Debug, Clone)]
pub struct SceneHandle {
    sender: UnboundedSender<HostCommand>,
}

impl SceneHandle {
    pub fn add_image(&self, content: impl Into<String>) {
        self.send(HostCommand::AddImage(content.into()));
    }

    pub fn add_text(&self, text: Option<String>) {
        self.send(HostCommand::AddText(text));
    }

    pub fn export_png(&self) {
        self.send(HostCommand::ExportPng);
    }

    fn send(&self, command: HostCommand) {
        if let Err(err) = self.sender.unbounded_send(command) {
            warn!("Scene composer is gone, dropping command: {:?}", err.into_inner());
        }
    }
}

/// The composer's side of the channel
#[derive(Debug)]
pub struct CommandReceiver {
    receiver: UnboundedReceiver<HostCommand>,
}

impl CommandReceiver {
    /// Take every command queued since the last call, without blocking
    pub fn drain(&mut self) -> Vec<HostCommand> {
        let mut commands = Vec::new();
        while let Ok(Some(command)) = self.receiver.try_next() {
            commands.push(command);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (handle, mut receiver) = command_channel();
        handle.add_text(None);
        handle.clone().add_image("data:image/png;base64,AAAA");
        handle.export_png();

        assert_eq!(
            receiver.drain(),
            vec![
                HostCommand::AddText(None),
                HostCommand::AddImage("data:image/png;base64,AAAA".to_owned()),
                HostCommand::ExportPng,
            ]
        );
        assert!(receiver.drain().is_empty());
    }
}
