/// Ids of the messages exchanged by the scene protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageId {
    Login = 100,
    LoginReply = 101,
    ClientJoined = 102,
    ClientLeft = 103,
    CreateEntity = 110,
    CreateComponents = 111,
    CreateAttributes = 112,
    EditAttributes = 113,
    RemoveAttributes = 114,
    RemoveComponents = 115,
    RemoveEntity = 116,
    CreateEntityReply = 117,
    CreateComponentsReply = 118,
    EntityAction = 120,
    ObserverPosition = 122,
}

impl MessageId {
    pub fn from_u16(value: u16) -> Option<Self> {
        let id = match value {
            100 => MessageId::Login,
            101 => MessageId::LoginReply,
            102 => MessageId::ClientJoined,
            103 => MessageId::ClientLeft,
            110 => MessageId::CreateEntity,
            111 => MessageId::CreateComponents,
            112 => MessageId::CreateAttributes,
            113 => MessageId::EditAttributes,
            114 => MessageId::RemoveAttributes,
            115 => MessageId::RemoveComponents,
            116 => MessageId::RemoveEntity,
            117 => MessageId::CreateEntityReply,
            118 => MessageId::CreateComponentsReply,
            120 => MessageId::EntityAction,
            122 => MessageId::ObserverPosition,
            _ => return None,
        };
        Some(id)
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Messages handled by the `SyncManager`, as opposed to the login flow
    pub fn is_scene_message(self) -> bool {
        !matches!(
            self,
            MessageId::Login | MessageId::LoginReply | MessageId::ClientJoined | MessageId::ClientLeft
        )
    }
}
