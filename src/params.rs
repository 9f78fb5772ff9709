// named, typed, range-bounded tunables read by the effects every frame
use std::collections::BTreeMap;

use bevy::log::debug;
use bevy::prelude::Resource;

use crate::error::{FxError, FxResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float { value: f32, min: f32, max: f32 },
    Color([f32; 4]),
    Toggle(bool),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Float { .. } => "float",
            ParamValue::Color(_) => "color",
            ParamValue::Toggle(_) => "toggle",
        }
    }
}

/// Explicit replacement for a global debug panel: whoever needs a tunable gets the
/// registry handed in.
#[derive(Resource, Default, Debug, Clone)]
pub struct ParamRegistry {
    params: BTreeMap<String, ParamValue>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a float slider. Re-registering an existing name keeps the current
    /// value (clamped into the new range) so plugins can register idempotently.
    pub fn register_float(&mut self, name: &str, default: f32, min: f32, max: f32) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let value = match self.params.get(name) {
            Some(ParamValue::Float { value, .. }) => *value,
            _ => default,
        };
        let value = if value.is_finite() { value.clamp(min, max) } else { min };
        self.params
            .insert(name.to_owned(), ParamValue::Float { value, min, max });
    }

    pub fn register_color(&mut self, name: &str, rgba: [f32; 4]) {
        self.params
            .entry(name.to_owned())
            .or_insert(ParamValue::Color(rgba.map(|c| c.clamp(0.0, 1.0))));
    }

    pub fn register_toggle(&mut self, name: &str, on: bool) {
        self.params
            .entry(name.to_owned())
            .or_insert(ParamValue::Toggle(on));
    }

    /// Sets a float, clamping it into its range. Returns the value actually stored.
    pub fn set_float(&mut self, name: &str, new_value: f32) -> FxResult<f32> {
        let entry = self
            .params
            .get_mut(name)
            .ok_or_else(|| FxError::UnknownParam(name.to_owned()))?;
        let found = entry.kind();
        let ParamValue::Float { value, min, max } = entry else {
            return Err(FxError::ParamType {
                name: name.to_owned(),
                expected: "float",
                found,
            });
        };
        if new_value.is_nan() {
            debug!("ignoring NaN for parameter {name}");
            return Ok(*value);
        }
        let clamped = new_value.clamp(*min, *max);
        if clamped != new_value {
            debug!("parameter {name} clamped from {new_value} to {clamped}");
        }
        *value = clamped;
        Ok(clamped)
    }

    pub fn set_color(&mut self, name: &str, rgba: [f32; 4]) -> FxResult<()> {
        match self.params.get_mut(name) {
            Some(ParamValue::Color(c)) => {
                *c = rgba.map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
                Ok(())
            }
            Some(other) => Err(FxError::ParamType {
                name: name.to_owned(),
                expected: "color",
                found: other.kind(),
            }),
            None => Err(FxError::UnknownParam(name.to_owned())),
        }
    }

    pub fn set_toggle(&mut self, name: &str, on: bool) -> FxResult<()> {
        match self.params.get_mut(name) {
            Some(ParamValue::Toggle(t)) => {
                *t = on;
                Ok(())
            }
            Some(other) => Err(FxError::ParamType {
                name: name.to_owned(),
                expected: "toggle",
                found: other.kind(),
            }),
            None => Err(FxError::UnknownParam(name.to_owned())),
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.params.get(name)? {
            ParamValue::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn float_or(&self, name: &str, fallback: f32) -> f32 {
        self.float(name).unwrap_or(fallback)
    }

    pub fn color(&self, name: &str) -> Option<[f32; 4]> {
        match self.params.get(name)? {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn toggle(&self, name: &str) -> Option<bool> {
        match self.params.get(name)? {
            ParamValue::Toggle(t) => Some(*t),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    // name order, for whatever panel displays them
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
