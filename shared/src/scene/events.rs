use super::{action::ExecutionType, ComponentId, EntityId};

/// Scope of a scene mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AttributeChange {
    /// Resolves to `Replicate`
    #[default]
    Default,
    /// Apply silently, no change event
    Disconnected,
    /// Emit a change event but do not replicate
    LocalOnly,
    Replicate,
}

impl AttributeChange {
    pub fn resolve(self) -> Self {
        match self {
            AttributeChange::Default => AttributeChange::Replicate,
            other => other,
        }
    }

    pub fn is_replicate(self) -> bool {
        self.resolve() == AttributeChange::Replicate
    }
}

/// Change notification queued by the scene. `replicated` is captured when the
/// event is emitted so handlers never have to look at a possibly removed
/// object.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    EntityCreated {
        entity: EntityId,
        change: AttributeChange,
        replicated: bool,
    },
    EntityRemoved {
        entity: EntityId,
        change: AttributeChange,
        replicated: bool,
    },
    ComponentAdded {
        entity: EntityId,
        component: ComponentId,
        change: AttributeChange,
        replicated: bool,
    },
    ComponentRemoved {
        entity: EntityId,
        component: ComponentId,
        change: AttributeChange,
        replicated: bool,
    },
    AttributeChanged {
        entity: EntityId,
        component: ComponentId,
        index: u8,
        change: AttributeChange,
        replicated: bool,
        interpolates: bool,
    },
    AttributeAdded {
        entity: EntityId,
        component: ComponentId,
        index: u8,
        change: AttributeChange,
        replicated: bool,
    },
    AttributeRemoved {
        entity: EntityId,
        component: ComponentId,
        index: u8,
        change: AttributeChange,
        replicated: bool,
    },
    ActionTriggered {
        entity: EntityId,
        name: String,
        params: Vec<String>,
        execution: ExecutionType,
    },
}

impl SceneEvent {
    pub fn entity(&self) -> EntityId {
        match self {
            SceneEvent::EntityCreated { entity, .. }
            | SceneEvent::EntityRemoved { entity, .. }
            | SceneEvent::ComponentAdded { entity, .. }
            | SceneEvent::ComponentRemoved { entity, .. }
            | SceneEvent::AttributeChanged { entity, .. }
            | SceneEvent::AttributeAdded { entity, .. }
            | SceneEvent::AttributeRemoved { entity, .. }
            | SceneEvent::ActionTriggered { entity, .. } => *entity,
        }
    }
}
