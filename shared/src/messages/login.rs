use scenesync_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::types::UserId;

use super::{read_blob, read_var, write_blob, write_var, MessageId, ProtocolMessage};

/// Sent by a client right after connecting. The payload is opaque to the
/// server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Login {
    pub payload: Vec<u8>,
}

impl ProtocolMessage for Login {
    const ID: MessageId = MessageId::Login;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_blob(writer, &self.payload);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            payload: read_blob(reader)?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginReply {
    pub success: bool,
    pub user_id: UserId,
    pub payload: Vec<u8>,
}

impl ProtocolMessage for LoginReply {
    const ID: MessageId = MessageId::LoginReply;

    fn ser(&self, writer: &mut dyn BitWrite) {
        u8::from(self.success).ser(writer);
        write_var(writer, self.user_id);
        write_blob(writer, &self.payload);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            success: u8::de(reader)? != 0,
            user_id: read_var(reader)?,
            payload: read_blob(reader)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientJoined {
    pub user_id: UserId,
}

impl ProtocolMessage for ClientJoined {
    const ID: MessageId = MessageId::ClientJoined;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_var(writer, self.user_id);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            user_id: read_var(reader)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientLeft {
    pub user_id: UserId,
}

impl ProtocolMessage for ClientLeft {
    const ID: MessageId = MessageId::ClientLeft;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_var(writer, self.user_id);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            user_id: read_var(reader)?,
        })
    }
}
