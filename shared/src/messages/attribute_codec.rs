//! Attribute blobs nested inside component messages.
//!
//! A full blob holds every static value in declaration order followed by the
//! dynamic attributes, each announced with index, type and name. The reader
//! stops at the end of the blob, so no dynamic count is sent.
//!
//! An edit blob starts with a one bit flag. `0` is followed by a u8 count and
//! `(u8 index, value)` pairs. `1` is followed by one presence bit per
//! attribute slot, each set bit followed by the value.

use scenesync_serde::{BitReader, BitWrite, BitWriter, Serde};

use crate::{
    scene::{AttributeValue, Component, ComponentKind, EntityId},
    sync::SyncError,
};

use super::scene_messages::{read_type_id, FullComponent, NewAttribute};

/// How the changed attributes of one component are listed in an edit blob
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditEncoding {
    /// Count, then index and value per change. Costs `8 + 8 * changed` bits
    /// before values.
    Indices,
    /// One presence bit per attribute slot
    Bitmask,
}

impl EditEncoding {
    pub fn choose(changed: usize, total_slots: usize) -> Self {
        if 8 + 8 * changed <= total_slots {
            EditEncoding::Indices
        } else {
            EditEncoding::Bitmask
        }
    }
}

/// Serializes a component with all of its attributes.
pub fn write_full_component(component: &Component) -> FullComponent {
    let mut writer = BitWriter::new();
    for attribute in component
        .attribute_slots()
        .iter()
        .take(component.num_static_attributes())
        .flatten()
    {
        attribute.value().write(&mut writer);
    }
    for attribute in component.dynamic_attributes() {
        attribute.index().ser(&mut writer);
        (attribute.type_id() as u8).ser(&mut writer);
        attribute.name().to_string().ser(&mut writer);
        attribute.value().write(&mut writer);
    }
    FullComponent {
        id: component.id(),
        type_id: component.type_id(),
        name: component.name().to_string(),
        data: writer.to_bytes(),
    }
}

/// Decoded attribute blob of a full component.
#[derive(Clone, Debug, PartialEq)]
pub struct FullComponentData {
    pub static_values: Vec<AttributeValue>,
    pub dynamic_attributes: Vec<NewAttribute>,
}

/// Reads the blob of a full component of the given kind.
pub fn read_full_component_data(
    kind: &ComponentKind,
    component_id: u32,
    data: &[u8],
) -> Result<FullComponentData, SyncError> {
    let mut reader = BitReader::new(data);
    let mut static_values = Vec::with_capacity(kind.static_attributes().len());
    for descriptor in kind.static_attributes() {
        static_values.push(AttributeValue::read(descriptor.type_id, &mut reader)?);
    }
    let mut dynamic_attributes = Vec::new();
    while reader.bits_left() > 16 {
        let index = u8::de(&mut reader)?;
        let type_id = read_type_id(&mut reader)?;
        let name = String::de(&mut reader)?;
        let value = AttributeValue::read(type_id, &mut reader)?;
        dynamic_attributes.push(NewAttribute {
            component: component_id,
            index,
            name,
            value,
        });
    }
    Ok(FullComponentData {
        static_values,
        dynamic_attributes,
    })
}

/// Serializes the values of `changed` attributes, which must exist on the
/// component and be in ascending order.
pub fn write_edit_blob(component: &Component, changed: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    let slots = component.attribute_slots();
    match EditEncoding::choose(changed.len(), slots.len()) {
        EditEncoding::Indices => {
            writer.write_bit(false);
            (changed.len() as u8).ser(&mut writer);
            for index in changed {
                index.ser(&mut writer);
                if let Some(attribute) = component.attribute(*index) {
                    attribute.value().write(&mut writer);
                }
            }
        }
        EditEncoding::Bitmask => {
            writer.write_bit(true);
            for (slot, attribute) in slots.iter().enumerate() {
                let dirty = changed.iter().any(|index| usize::from(*index) == slot);
                match attribute {
                    Some(attribute) if dirty => {
                        writer.write_bit(true);
                        attribute.value().write(&mut writer);
                    }
                    _ => writer.write_bit(false),
                }
            }
        }
    }
    writer.to_bytes()
}

/// Reads an edit blob against the receiver's copy of the component.
pub fn read_edit_blob(
    entity: EntityId,
    component: &Component,
    data: &[u8],
) -> Result<Vec<(u8, AttributeValue)>, SyncError> {
    let mut reader = BitReader::new(data);
    let out_of_range = |index: u8| SyncError::AttributeIndexOutOfRange {
        entity_id: entity,
        component_id: component.id(),
        index,
    };

    let mut changes = Vec::new();
    if !reader.read_bit()? {
        let count = u8::de(&mut reader)?;
        for _ in 0..count {
            let index = u8::de(&mut reader)?;
            let attribute = component.attribute(index).ok_or_else(|| out_of_range(index))?;
            let value = AttributeValue::read(attribute.type_id(), &mut reader)?;
            changes.push((index, value));
        }
    } else {
        for (slot, attribute) in component.attribute_slots().iter().enumerate() {
            if !reader.read_bit()? {
                continue;
            }
            let index = slot as u8;
            let attribute = attribute.as_ref().ok_or_else(|| out_of_range(index))?;
            let value = AttributeValue::read(attribute.type_id(), &mut reader)?;
            changes.push((index, value));
        }
    }
    Ok(changes)
}
