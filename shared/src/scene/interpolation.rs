use super::{attribute::AttributeValue, ComponentId, EntityId};

/// Identifies one attribute slot in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    pub entity: EntityId,
    pub component: ComponentId,
    pub index: u8,
}

impl AttributeKey {
    pub fn new(entity: EntityId, component: ComponentId, index: u8) -> Self {
        Self {
            entity,
            component,
            index,
        }
    }
}

/// A running blend of one attribute from `start` to `end` over `length` seconds.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AttributeInterpolation {
    pub key: AttributeKey,
    pub start: AttributeValue,
    pub end: AttributeValue,
    pub time: f32,
    pub length: f32,
}

impl AttributeInterpolation {
    /// Advances the clock and returns the value for the new time, plus
    /// whether the blend has finished.
    pub fn advance(&mut self, dt: f32) -> (AttributeValue, bool) {
        self.time += dt;
        if self.time >= self.length {
            return (self.end.clone(), true);
        }
        let t = self.time / self.length;
        match self.start.interpolate(&self.end, t) {
            Some(value) => (value, false),
            None => (self.end.clone(), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_reaches_the_end_value() {
        let mut interpolation = AttributeInterpolation {
            key: AttributeKey::new(1, 1, 0),
            start: AttributeValue::Real(0.0),
            end: AttributeValue::Real(1.0),
            time: 0.0,
            length: 1.0,
        };
        assert_eq!(interpolation.advance(0.25), (AttributeValue::Real(0.25), false));
        assert_eq!(interpolation.advance(0.25), (AttributeValue::Real(0.5), false));
        assert_eq!(interpolation.advance(0.75), (AttributeValue::Real(1.0), true));
    }
}
