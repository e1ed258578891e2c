use smol::channel::{self, Receiver, Sender, TryRecvError};

use crate::types::ConnectionId;

use super::{MessageReceiver, MessageSender, TransportError, WireMessage};

/// In-process transport: messages sent on one half are received on the other.
/// I/O threads use it to hand inbound messages to the tick thread.
pub struct MessageChannel;

impl MessageChannel {
    pub fn unbounded() -> (Box<dyn MessageSender>, Box<dyn MessageReceiver>) {
        let (sender, receiver) = channel::unbounded();
        (
            Box::new(MessageChannelSender { sender }),
            Box::new(MessageChannelReceiver { receiver }),
        )
    }
}

#[derive(Clone)]
struct MessageChannelSender {
    sender: Sender<(ConnectionId, WireMessage)>,
}

impl MessageSender for MessageChannelSender {
    fn send(
        &mut self,
        connection: ConnectionId,
        message: WireMessage,
    ) -> Result<(), TransportError> {
        self.sender
            .try_send((connection, message))
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[derive(Clone)]
struct MessageChannelReceiver {
    receiver: Receiver<(ConnectionId, WireMessage)>,
}

impl MessageReceiver for MessageChannelReceiver {
    fn receive(&mut self) -> Result<Option<(ConnectionId, WireMessage)>, TransportError> {
        match self.receiver.try_recv() {
            Ok(received) => Ok(Some(received)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(TransportError::ChannelClosed),
        }
    }
}
