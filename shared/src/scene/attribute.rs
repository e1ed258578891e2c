use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3, Vector4};

use scenesync_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// Wire type ids of attribute values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeTypeId {
    String = 1,
    Int = 2,
    Real = 3,
    Color = 4,
    Float2 = 5,
    Float3 = 6,
    Float4 = 7,
    Bool = 8,
    UInt = 9,
    Quat = 10,
    AssetReference = 11,
    AssetReferenceList = 12,
    EntityReference = 13,
    StringList = 15,
    Transform = 16,
    Point = 17,
}

impl AttributeTypeId {
    pub fn from_u8(value: u8) -> Option<Self> {
        let type_id = match value {
            1 => Self::String,
            2 => Self::Int,
            3 => Self::Real,
            4 => Self::Color,
            5 => Self::Float2,
            6 => Self::Float3,
            7 => Self::Float4,
            8 => Self::Bool,
            9 => Self::UInt,
            10 => Self::Quat,
            11 => Self::AssetReference,
            12 => Self::AssetReferenceList,
            13 => Self::EntityReference,
            15 => Self::StringList,
            16 => Self::Transform,
            17 => Self::Point,
            _ => return None,
        };
        Some(type_id)
    }

    pub fn is_interpolable(self) -> bool {
        matches!(
            self,
            Self::Real
                | Self::Color
                | Self::Float2
                | Self::Float3
                | Self::Float4
                | Self::Quat
                | Self::Transform
        )
    }
}

impl Serde for AttributeTypeId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_byte(*self as u8);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = reader.read_byte()?;
        Self::from_u8(value).ok_or(SerdeErr::InvalidValue {
            type_name: "AttributeTypeId",
            value: u32::from(value),
        })
    }

    fn bit_length(&self) -> u32 {
        8
    }
}

/// Position, euler rotation in degrees and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn orientation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        let rotation = self.orientation().slerp(&other.orientation(), t);
        let (roll, pitch, yaw) = rotation.euler_angles();
        Self {
            position: self.position.lerp(&other.position, t),
            rotation: Vector3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

/// A typed attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Real(f32),
    /// RGBA
    Color(Vector4<f32>),
    Float2(Vector2<f32>),
    Float3(Vector3<f32>),
    Float4(Vector4<f32>),
    Bool(bool),
    UInt(u32),
    Quat(UnitQuaternion<f32>),
    AssetReference(String),
    AssetReferenceList(Vec<String>),
    EntityReference(String),
    StringList(Vec<String>),
    Transform(Transform),
    Point(Vector2<i32>),
}

impl AttributeValue {
    pub fn default_for(type_id: AttributeTypeId) -> Self {
        match type_id {
            AttributeTypeId::String => Self::String(String::new()),
            AttributeTypeId::Int => Self::Int(0),
            AttributeTypeId::Real => Self::Real(0.0),
            AttributeTypeId::Color => Self::Color(Vector4::new(0.0, 0.0, 0.0, 1.0)),
            AttributeTypeId::Float2 => Self::Float2(Vector2::zeros()),
            AttributeTypeId::Float3 => Self::Float3(Vector3::zeros()),
            AttributeTypeId::Float4 => Self::Float4(Vector4::zeros()),
            AttributeTypeId::Bool => Self::Bool(false),
            AttributeTypeId::UInt => Self::UInt(0),
            AttributeTypeId::Quat => Self::Quat(UnitQuaternion::identity()),
            AttributeTypeId::AssetReference => Self::AssetReference(String::new()),
            AttributeTypeId::AssetReferenceList => Self::AssetReferenceList(Vec::new()),
            AttributeTypeId::EntityReference => Self::EntityReference(String::new()),
            AttributeTypeId::StringList => Self::StringList(Vec::new()),
            AttributeTypeId::Transform => Self::Transform(Transform::default()),
            AttributeTypeId::Point => Self::Point(Vector2::zeros()),
        }
    }

    pub fn type_id(&self) -> AttributeTypeId {
        match self {
            Self::String(_) => AttributeTypeId::String,
            Self::Int(_) => AttributeTypeId::Int,
            Self::Real(_) => AttributeTypeId::Real,
            Self::Color(_) => AttributeTypeId::Color,
            Self::Float2(_) => AttributeTypeId::Float2,
            Self::Float3(_) => AttributeTypeId::Float3,
            Self::Float4(_) => AttributeTypeId::Float4,
            Self::Bool(_) => AttributeTypeId::Bool,
            Self::UInt(_) => AttributeTypeId::UInt,
            Self::Quat(_) => AttributeTypeId::Quat,
            Self::AssetReference(_) => AttributeTypeId::AssetReference,
            Self::AssetReferenceList(_) => AttributeTypeId::AssetReferenceList,
            Self::EntityReference(_) => AttributeTypeId::EntityReference,
            Self::StringList(_) => AttributeTypeId::StringList,
            Self::Transform(_) => AttributeTypeId::Transform,
            Self::Point(_) => AttributeTypeId::Point,
        }
    }

    /// Writes the value without any type information. All encodings are
    /// whole bytes.
    pub fn write(&self, writer: &mut dyn BitWrite) {
        match self {
            Self::String(value) | Self::AssetReference(value) | Self::EntityReference(value) => {
                value.ser(writer)
            }
            Self::Int(value) => value.ser(writer),
            Self::Real(value) => value.ser(writer),
            Self::Color(value) | Self::Float4(value) => write_floats(writer, value.as_slice()),
            Self::Float2(value) => write_floats(writer, value.as_slice()),
            Self::Float3(value) => write_floats(writer, value.as_slice()),
            Self::Bool(value) => u8::from(*value).ser(writer),
            Self::UInt(value) => value.ser(writer),
            Self::Quat(value) => {
                let quat = value.quaternion();
                write_floats(writer, &[quat.i, quat.j, quat.k, quat.w]);
            }
            Self::AssetReferenceList(value) | Self::StringList(value) => value.ser(writer),
            Self::Transform(value) => {
                write_floats(writer, value.position.as_slice());
                write_floats(writer, value.rotation.as_slice());
                write_floats(writer, value.scale.as_slice());
            }
            Self::Point(value) => {
                value.x.ser(writer);
                value.y.ser(writer);
            }
        }
    }

    pub fn read(type_id: AttributeTypeId, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = match type_id {
            AttributeTypeId::String => Self::String(String::de(reader)?),
            AttributeTypeId::Int => Self::Int(i32::de(reader)?),
            AttributeTypeId::Real => Self::Real(f32::de(reader)?),
            AttributeTypeId::Color => Self::Color(Vector4::from(read_floats::<4>(reader)?)),
            AttributeTypeId::Float2 => Self::Float2(Vector2::from(read_floats::<2>(reader)?)),
            AttributeTypeId::Float3 => Self::Float3(Vector3::from(read_floats::<3>(reader)?)),
            AttributeTypeId::Float4 => Self::Float4(Vector4::from(read_floats::<4>(reader)?)),
            AttributeTypeId::Bool => Self::Bool(u8::de(reader)? != 0),
            AttributeTypeId::UInt => Self::UInt(u32::de(reader)?),
            AttributeTypeId::Quat => {
                let [x, y, z, w] = read_floats::<4>(reader)?;
                Self::Quat(UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z)))
            }
            AttributeTypeId::AssetReference => Self::AssetReference(String::de(reader)?),
            AttributeTypeId::AssetReferenceList => {
                Self::AssetReferenceList(Vec::<String>::de(reader)?)
            }
            AttributeTypeId::EntityReference => Self::EntityReference(String::de(reader)?),
            AttributeTypeId::StringList => Self::StringList(Vec::<String>::de(reader)?),
            AttributeTypeId::Transform => Self::Transform(Transform {
                position: Vector3::from(read_floats::<3>(reader)?),
                rotation: Vector3::from(read_floats::<3>(reader)?),
                scale: Vector3::from(read_floats::<3>(reader)?),
            }),
            AttributeTypeId::Point => Self::Point(Vector2::new(i32::de(reader)?, i32::de(reader)?)),
        };
        Ok(value)
    }

    /// Blends towards `target`. Returns `None` for value types that cannot
    /// be blended or when the two values differ in type.
    pub fn interpolate(&self, target: &Self, t: f32) -> Option<Self> {
        let t = t.clamp(0.0, 1.0);
        let value = match (self, target) {
            (Self::Real(a), Self::Real(b)) => Self::Real(a + (b - a) * t),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(b, t)),
            (Self::Float2(a), Self::Float2(b)) => Self::Float2(a.lerp(b, t)),
            (Self::Float3(a), Self::Float3(b)) => Self::Float3(a.lerp(b, t)),
            (Self::Float4(a), Self::Float4(b)) => Self::Float4(a.lerp(b, t)),
            (Self::Quat(a), Self::Quat(b)) => Self::Quat(a.nlerp(b, t)),
            (Self::Transform(a), Self::Transform(b)) => Self::Transform(a.lerp(b, t)),
            _ => return None,
        };
        Some(value)
    }
}

fn write_floats(writer: &mut dyn BitWrite, values: &[f32]) {
    for value in values {
        value.ser(writer);
    }
}

fn read_floats<const N: usize>(reader: &mut BitReader) -> Result<[f32; N], SerdeErr> {
    let mut output = [0.0; N];
    for value in output.iter_mut() {
        *value = f32::de(reader)?;
    }
    Ok(output)
}

/// A typed value slot of a component, with a stable index.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    index: u8,
    name: String,
    value: AttributeValue,
    dynamic: bool,
    interpolate: bool,
}

impl Attribute {
    pub(crate) fn new_static(index: u8, descriptor: &AttributeDescriptor) -> Self {
        Self {
            index,
            name: descriptor.name.clone(),
            value: AttributeValue::default_for(descriptor.type_id),
            dynamic: false,
            interpolate: descriptor.interpolate && descriptor.type_id.is_interpolable(),
        }
    }

    pub(crate) fn new_dynamic(index: u8, name: &str, value: AttributeValue) -> Self {
        Self {
            index,
            name: name.to_string(),
            value,
            dynamic: true,
            interpolate: false,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn type_id(&self) -> AttributeTypeId {
        self.value.type_id()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Whether received changes should be blended in rather than snapped.
    pub fn interpolates(&self) -> bool {
        self.interpolate
    }

    pub(crate) fn set_value(&mut self, value: AttributeValue) {
        self.value = value;
    }
}

/// Static attribute declaration of a component type
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub type_id: AttributeTypeId,
    pub interpolate: bool,
}

impl AttributeDescriptor {
    pub fn new(name: &str, type_id: AttributeTypeId) -> Self {
        Self {
            name: name.to_string(),
            type_id,
            interpolate: false,
        }
    }

    pub fn interpolated(mut self) -> Self {
        self.interpolate = true;
        self
    }
}
