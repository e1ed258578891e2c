use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use scenesync_shared::{ConnectionId, MessageId, MessageSender, TransportError, WireMessage};

#[derive(Default)]
struct Outbox {
    sent: Vec<(ConnectionId, WireMessage)>,
    closed: BTreeSet<ConnectionId>,
}

/// A transport that keeps everything sent through it. Clones share the
/// same outbox, so one clone can be handed to a `Server` or `Client` while
/// the test inspects another.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    outbox: Rc<RefCell<Outbox>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn MessageSender> {
        Box::new(self.clone())
    }

    /// Takes every message sent so far
    pub fn take(&self) -> Vec<(ConnectionId, WireMessage)> {
        std::mem::take(&mut self.outbox.borrow_mut().sent)
    }

    /// Takes the messages sent to `connection`, leaving the rest
    pub fn take_for(&self, connection: ConnectionId) -> Vec<WireMessage> {
        let mut outbox = self.outbox.borrow_mut();
        let (taken, kept) = std::mem::take(&mut outbox.sent)
            .into_iter()
            .partition::<Vec<_>, _>(|(to, _)| *to == connection);
        outbox.sent = kept;
        taken.into_iter().map(|(_, message)| message).collect()
    }

    pub fn len(&self) -> usize {
        self.outbox.borrow().sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Later sends to `connection` fail
    pub fn close(&self, connection: ConnectionId) {
        self.outbox.borrow_mut().closed.insert(connection);
    }

    pub fn reopen(&self, connection: ConnectionId) {
        self.outbox.borrow_mut().closed.remove(&connection);
    }
}

impl MessageSender for RecordingTransport {
    fn send(
        &mut self,
        connection: ConnectionId,
        message: WireMessage,
    ) -> Result<(), TransportError> {
        let mut outbox = self.outbox.borrow_mut();
        if outbox.closed.contains(&connection) {
            return Err(TransportError::ConnectionClosed { connection });
        }
        outbox.sent.push((connection, message));
        Ok(())
    }
}

/// Ids of `messages`, unknown ids skipped
pub fn message_ids(messages: &[WireMessage]) -> Vec<MessageId> {
    messages
        .iter()
        .filter_map(|message| MessageId::from_u16(message.id))
        .collect()
}
