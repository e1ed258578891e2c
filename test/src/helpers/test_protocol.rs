use scenesync_shared::{AttributeDescriptor, AttributeTypeId, ComponentKind, ComponentKinds};

/// Transform, read by interest management and interpolated on clients
pub const PLACEABLE: u32 = 20;
/// Dynamic attributes only
pub const DYNAMIC: u32 = 25;
pub const NAME: u32 = 26;
/// Two static attributes
pub const STATS: u32 = 30;

/// Component types known to both ends of every test
pub fn component_kinds() -> ComponentKinds {
    let mut kinds = ComponentKinds::new();
    kinds
        .add_kind(ComponentKind::new(PLACEABLE, "Placeable").with_attribute(
            AttributeDescriptor::new("transform", AttributeTypeId::Transform).interpolated(),
        ))
        .add_kind(ComponentKind::new(DYNAMIC, "DynamicComponent").with_dynamic_attributes())
        .add_kind(
            ComponentKind::new(NAME, "Name")
                .with_attribute(AttributeDescriptor::new("name", AttributeTypeId::String))
                .with_attribute(AttributeDescriptor::new("description", AttributeTypeId::String)),
        )
        .add_kind(
            ComponentKind::new(STATS, "Stats")
                .with_attribute(AttributeDescriptor::new("hp", AttributeTypeId::Int))
                .with_attribute(AttributeDescriptor::new("speed", AttributeTypeId::Real)),
        );
    kinds
}
