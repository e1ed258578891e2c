use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use scenesync_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::scene::{EntityId, ExecutionType};

use super::{read_var, write_id, MessageId, ProtocolMessage};

/// A named action on an entity. Not part of the dirty state, it is sent
/// once and forgotten.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityAction {
    pub entity: EntityId,
    pub execution: ExecutionType,
    pub name: String,
    pub params: Vec<String>,
}

impl ProtocolMessage for EntityAction {
    const ID: MessageId = MessageId::EntityAction;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        self.execution.bits().ser(writer);
        self.name.ser(writer);
        self.params.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let bits = u8::de(reader)?;
        let execution = ExecutionType::from_bits(bits).ok_or(SerdeErr::InvalidValue {
            type_name: "ExecutionType",
            value: u32::from(bits),
        })?;
        Ok(Self {
            entity,
            execution,
            name: String::de(reader)?,
            params: Vec::<String>::de(reader)?,
        })
    }
}

/// The pose a client observes the scene from.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverPosition {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl ProtocolMessage for ObserverPosition {
    const ID: MessageId = MessageId::ObserverPosition;

    fn ser(&self, writer: &mut dyn BitWrite) {
        for value in self.position.iter() {
            value.ser(writer);
        }
        let quat = self.orientation.quaternion();
        for value in [quat.i, quat.j, quat.k, quat.w] {
            value.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let position = Vector3::new(f32::de(reader)?, f32::de(reader)?, f32::de(reader)?);
        let (x, y, z, w) = (
            f32::de(reader)?,
            f32::de(reader)?,
            f32::de(reader)?,
            f32::de(reader)?,
        );
        Ok(Self {
            position,
            orientation: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_layout() {
        let action = EntityAction {
            entity: 7,
            execution: ExecutionType::SERVER | ExecutionType::PEERS,
            name: "Go".to_string(),
            params: vec!["1".to_string()],
        };
        let bytes = action.to_bytes();
        assert_eq!(&*bytes, &[7, 6, 2, b'G', b'o', 1, 1, b'1']);
        assert_eq!(EntityAction::from_bytes(&bytes).unwrap(), action);
    }

    #[test]
    fn unknown_execution_flags_are_rejected() {
        assert!(EntityAction::from_bytes(&[7, 0x10, 0, 0]).is_err());
    }
}
