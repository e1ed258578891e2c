use scenesync_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::scene::{AttributeTypeId, AttributeValue, ComponentId, ComponentTypeId, EntityId};

use super::{
    read_blob, read_var, write_blob, write_count, write_id, write_var, MessageId,
    ProtocolMessage,
};

/// A component serialized in full. `data` holds the attribute blob written by
/// `write_full_component` and can only be decoded with the component's type
/// layout at hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullComponent {
    pub id: ComponentId,
    pub type_id: ComponentTypeId,
    pub name: String,
    pub data: Vec<u8>,
}

impl FullComponent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.id);
        write_var(writer, self.type_id);
        self.name.ser(writer);
        write_blob(writer, &self.data);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: read_var(reader)?,
            type_id: read_var(reader)?,
            name: String::de(reader)?,
            data: read_blob(reader)?,
        })
    }
}

/// An entity the peer does not know yet, with all of its replicated
/// components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateEntity {
    pub entity: EntityId,
    pub temporary: bool,
    pub components: Vec<FullComponent>,
}

impl ProtocolMessage for CreateEntity {
    const ID: MessageId = MessageId::CreateEntity;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        // a whole byte keeps the component data byte aligned
        u8::from(self.temporary).ser(writer);
        let count = write_count(writer, self.components.len());
        for component in self.components.iter().take(count) {
            component.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let temporary = u8::de(reader)? != 0;
        let count = read_var(reader)?;
        let mut components = Vec::new();
        for _ in 0..count {
            components.push(FullComponent::de(reader)?);
        }
        Ok(Self {
            entity,
            temporary,
            components,
        })
    }
}

/// Components added to an entity the peer already knows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateComponents {
    pub entity: EntityId,
    pub components: Vec<FullComponent>,
}

impl ProtocolMessage for CreateComponents {
    const ID: MessageId = MessageId::CreateComponents;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        for component in &self.components {
            component.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let mut components = Vec::new();
        while reader.bits_left() > 16 {
            components.push(FullComponent::de(reader)?);
        }
        Ok(Self { entity, components })
    }
}

/// A dynamic attribute announced with its type and name.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAttribute {
    pub component: ComponentId,
    pub index: u8,
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateAttributes {
    pub entity: EntityId,
    pub attributes: Vec<NewAttribute>,
}

impl ProtocolMessage for CreateAttributes {
    const ID: MessageId = MessageId::CreateAttributes;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        for attribute in &self.attributes {
            write_id(writer, attribute.component);
            attribute.index.ser(writer);
            (attribute.value.type_id() as u8).ser(writer);
            attribute.name.ser(writer);
            attribute.value.write(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let mut attributes = Vec::new();
        while reader.bits_left() >= 24 {
            let component = read_var(reader)?;
            let index = u8::de(reader)?;
            let type_id = read_type_id(reader)?;
            let name = String::de(reader)?;
            let value = AttributeValue::read(type_id, reader)?;
            attributes.push(NewAttribute {
                component,
                index,
                name,
                value,
            });
        }
        Ok(Self { entity, attributes })
    }
}

pub(crate) fn read_type_id(reader: &mut BitReader) -> Result<AttributeTypeId, SerdeErr> {
    let value = u8::de(reader)?;
    AttributeTypeId::from_u8(value).ok_or(SerdeErr::InvalidValue {
        type_name: "AttributeTypeId",
        value: u32::from(value),
    })
}

/// The changed attributes of one component. `data` is an edit blob, see
/// `write_edit_blob`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditedComponent {
    pub component: ComponentId,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditAttributes {
    pub entity: EntityId,
    pub components: Vec<EditedComponent>,
}

impl ProtocolMessage for EditAttributes {
    const ID: MessageId = MessageId::EditAttributes;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        for edited in &self.components {
            write_id(writer, edited.component);
            write_blob(writer, &edited.data);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let mut components = Vec::new();
        while reader.bits_left() >= 8 {
            components.push(EditedComponent {
                component: read_var(reader)?,
                data: read_blob(reader)?,
            });
        }
        Ok(Self { entity, components })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveAttributes {
    pub entity: EntityId,
    /// (component, attribute index)
    pub attributes: Vec<(ComponentId, u8)>,
}

impl ProtocolMessage for RemoveAttributes {
    const ID: MessageId = MessageId::RemoveAttributes;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        for (component, index) in &self.attributes {
            write_id(writer, *component);
            index.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let mut attributes = Vec::new();
        while reader.bits_left() >= 8 {
            attributes.push((read_var(reader)?, u8::de(reader)?));
        }
        Ok(Self { entity, attributes })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveComponents {
    pub entity: EntityId,
    pub components: Vec<ComponentId>,
}

impl ProtocolMessage for RemoveComponents {
    const ID: MessageId = MessageId::RemoveComponents;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        for component in &self.components {
            write_id(writer, *component);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let entity = read_var(reader)?;
        let mut components = Vec::new();
        while reader.bits_left() >= 8 {
            components.push(read_var(reader)?);
        }
        Ok(Self { entity, components })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveEntity {
    pub entity: EntityId,
}

impl ProtocolMessage for RemoveEntity {
    const ID: MessageId = MessageId::RemoveEntity;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            entity: read_var(reader)?,
        })
    }
}

/// A component id as sent by the client, and the id the server assigned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentIdPair {
    pub sender_id: ComponentId,
    pub new_id: ComponentId,
}

fn write_id_pairs(writer: &mut dyn BitWrite, pairs: &[ComponentIdPair]) {
    let count = write_count(writer, pairs.len());
    for pair in pairs.iter().take(count) {
        write_id(writer, pair.sender_id);
        write_id(writer, pair.new_id);
    }
}

fn read_id_pairs(reader: &mut BitReader) -> Result<Vec<ComponentIdPair>, SerdeErr> {
    let count = read_var(reader)?;
    let mut pairs = Vec::new();
    for _ in 0..count {
        pairs.push(ComponentIdPair {
            sender_id: read_var(reader)?,
            new_id: read_var(reader)?,
        });
    }
    Ok(pairs)
}

/// Answer to a client's `CreateEntity`: the ids the server assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateEntityReply {
    pub sender_entity: EntityId,
    pub new_entity: EntityId,
    pub components: Vec<ComponentIdPair>,
}

impl ProtocolMessage for CreateEntityReply {
    const ID: MessageId = MessageId::CreateEntityReply;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.sender_entity);
        write_id(writer, self.new_entity);
        write_id_pairs(writer, &self.components);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sender_entity: read_var(reader)?,
            new_entity: read_var(reader)?,
            components: read_id_pairs(reader)?,
        })
    }
}

/// Answer to a client's `CreateComponents`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateComponentsReply {
    pub entity: EntityId,
    pub components: Vec<ComponentIdPair>,
}

impl ProtocolMessage for CreateComponentsReply {
    const ID: MessageId = MessageId::CreateComponentsReply;

    fn ser(&self, writer: &mut dyn BitWrite) {
        write_id(writer, self.entity);
        write_id_pairs(writer, &self.components);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            entity: read_var(reader)?,
            components: read_id_pairs(reader)?,
        })
    }
}
