mod attribute_codec;
mod entity_action;
mod login;
mod message_id;
mod scene_messages;

pub use attribute_codec::{
    read_edit_blob, read_full_component_data, write_edit_blob, write_full_component,
    EditEncoding, FullComponentData,
};
pub use entity_action::{EntityAction, ObserverPosition};
pub use login::{ClientJoined, ClientLeft, Login, LoginReply};
pub use message_id::MessageId;
pub use scene_messages::{
    ComponentIdPair, CreateAttributes, CreateComponents, CreateComponentsReply, CreateEntity,
    CreateEntityReply, EditAttributes, EditedComponent, FullComponent, NewAttribute,
    RemoveAttributes, RemoveComponents, RemoveEntity,
};

use log::warn;
use scenesync_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr, VarU32};

use crate::scene::wire_id;

/// A message of the scene protocol with a fixed id.
pub trait ProtocolMessage: Sized {
    const ID: MessageId;

    fn ser(&self, writer: &mut dyn BitWrite);

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    fn to_bytes(&self) -> Box<[u8]> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes().into_boxed_slice()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        Self::de(&mut reader)
    }
}

/// Writes an entity or component id as it travels on the wire.
pub(crate) fn write_id(writer: &mut dyn BitWrite, id: u32) {
    VarU32::saturating(wire_id(id)).ser(writer);
}

pub(crate) fn write_var(writer: &mut dyn BitWrite, value: u32) {
    if value > VarU32::MAX {
        warn!("Value {} does not fit a VarU32, clamping", value);
    }
    VarU32::saturating(value).ser(writer);
}

/// Writes a length and returns how many items the caller may follow it with.
pub(crate) fn write_count(writer: &mut dyn BitWrite, count: usize) -> usize {
    let length = VarU32::from_len(count);
    if length.get() as usize != count {
        warn!("Count {} does not fit a VarU32, truncating", count);
    }
    length.ser(writer);
    length.get() as usize
}

pub(crate) fn read_var(reader: &mut BitReader) -> Result<u32, SerdeErr> {
    Ok(VarU32::de(reader)?.get())
}

pub(crate) fn write_blob(writer: &mut dyn BitWrite, blob: &[u8]) {
    let length = write_count(writer, blob.len());
    writer.write_bytes(&blob[..length]);
}

pub(crate) fn read_blob(reader: &mut BitReader) -> Result<Vec<u8>, SerdeErr> {
    let length = read_var(reader)? as usize;
    reader.read_bytes(length)
}
