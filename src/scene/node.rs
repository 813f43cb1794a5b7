use crate::core;
use crate::scene::SceneError;

use serde_json::Value;

/// Typed accessors over one JSON object in the scene document. Every getter
/// reports failures with the full property path (e.g. "geometry.[2]bunny.
/// radius") so errors point at the offending line of the document.
pub struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    pub fn new(value: &'a Value, path: String) -> Node<'a> {
        Node {value, path}
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn child_path(&self, key: &str) -> String {
        format!("{}.{}", self.path, key)
    }

    fn parse_error(&self, key: &str, detail: &str) -> SceneError {
        SceneError::Parse {
            path: self.child_path(key),
            detail: String::from(detail),
        }
    }

    fn get(&self, key: &str) -> Result<&'a Value, SceneError> {
        self.value.get(key).ok_or_else(|| SceneError::Parse {
            path: self.child_path(key),
            detail: String::from("missing required property"),
        })
    }

    pub fn get_string(&self, key: &str) -> Result<&'a str, SceneError> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| self.parse_error(key, "expected a string"))
    }

    /// A string that may be absent; used for the nullable material and
    /// light references on geometry. An empty string also counts as absent.
    pub fn get_string_opt(&self, key: &str)
        -> Result<Option<&'a str>, SceneError>
    {
        match self.value.get(key) {
            None => Ok(None),
            Some(v) => match v.as_str() {
                Some("") => Ok(None),
                Some(s) => Ok(Some(s)),
                None => Err(self.parse_error(key, "expected a string")),
            },
        }
    }

    pub fn get_float(&self, key: &str) -> Result<f32, SceneError> {
        self.get(key)?
            .as_f64()
            .map(|x| x as f32)
            .ok_or_else(|| self.parse_error(key, "expected a number"))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, SceneError> {
        self.get(key)?
            .as_i64()
            .ok_or_else(|| self.parse_error(key, "expected an integer"))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize, SceneError> {
        let value = self.get_int(key)?;
        if value < 0 {
            return Err(self.parse_error(key, "expected a non-negative integer"));
        }
        Ok(value as usize)
    }

    /// A vector is a three-element sequence of numbers.
    pub fn get_vec(&self, key: &str) -> Result<core::Vec, SceneError> {
        let items = self.get(key)?
            .as_array()
            .ok_or_else(|| self.parse_error(key, "expected a 3-element vector"))?;
        if items.len() != 3 {
            return Err(self.parse_error(key, "expected a 3-element vector"));
        }

        let mut components = [0.0f32; 3];
        for (slot, item) in components.iter_mut().zip(items.iter()) {
            *slot = item.as_f64().ok_or_else(|| {
                self.parse_error(key, "expected a 3-element vector of numbers")
            })? as f32;
        }
        Ok(core::Vec::new(components[0], components[1], components[2]))
    }

    pub fn get_vec_or(&self, key: &str, default: core::Vec)
        -> Result<core::Vec, SceneError>
    {
        if self.value.get(key).is_none() {
            return Ok(default);
        }
        self.get_vec(key)
    }

    /// Reads a transform of the form
    /// `{ translate: [x, y, z], rotate: { angle, axis: [x, y, z] } }`,
    /// either part optional, composed so the rotation applies to camera
    /// space first and the translation then places the result in the world.
    pub fn get_transform(&self, key: &str) -> Result<core::Mat, SceneError> {
        let node = Node::new(self.get(key)?, self.child_path(key));
        if !node.value.is_object() {
            return Err(self.parse_error(key, "expected a transform object"));
        }

        let translate = node.get_vec_or("translate", core::Vec::zero())?;
        let rotate = match node.value.get("rotate") {
            None => core::Quat::identity(),
            Some(v) => {
                let rotate_node = Node::new(v, node.child_path("rotate"));
                let angle = rotate_node.get_float("angle")?;
                let axis = rotate_node.get_vec("axis")?;
                if axis.is_nearly_zero() {
                    return Err(rotate_node.parse_error(
                        "axis", "rotation axis must be non-zero"));
                }
                core::Quat::from_axis_angle(&axis, angle)
            }
        };

        // Row-vector matrices: R * T applies the rotation first.
        Ok(core::Mat::rotation(&rotate) * core::Mat::translation(&translate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arity_is_checked() {
        let value: Value =
            serde_json::from_str(r#"{"color": [1.0, 2.0]}"#).unwrap();
        let node = Node::new(&value, String::from("lights.[0]sun"));
        match node.get_vec("color") {
            Err(SceneError::Parse {path, ..}) => {
                assert_eq!(path, "lights.[0]sun.color");
            }
            other => panic!("expected a parse error, got {:?}", other.err()),
        }
    }

    #[test]
    fn missing_keys_report_their_path() {
        let value: Value = serde_json::from_str(r#"{}"#).unwrap();
        let node = Node::new(&value, String::from("materials.[1]glass"));
        match node.get_float("ior") {
            Err(SceneError::Parse {path, detail}) => {
                assert_eq!(path, "materials.[1]glass.ior");
                assert!(detail.contains("missing"));
            }
            other => panic!("expected a parse error, got {:?}", other.err()),
        }
    }

    #[test]
    fn empty_reference_reads_as_absent() {
        let value: Value =
            serde_json::from_str(r#"{"mat": "", "light": "lamp"}"#).unwrap();
        let node = Node::new(&value, String::from("geometry.[0]ball"));
        assert_eq!(node.get_string_opt("mat").unwrap(), None);
        assert_eq!(node.get_string_opt("light").unwrap(), Some("lamp"));
        assert_eq!(node.get_string_opt("absent").unwrap(), None);
    }

    #[test]
    fn transform_composes_rotation_before_translation() {
        let value: Value = serde_json::from_str(
            r#"{"transform": {
                "translate": [0.0, 0.0, 10.0],
                "rotate": {"angle": 3.14159265, "axis": [0.0, 1.0, 0.0]}
            }}"#).unwrap();
        let node = Node::new(&value, String::from("cameras.[0]default"));
        let mat = node.get_transform("transform").unwrap();

        // A camera-space point at -z lands beyond the eye along +z after
        // the half-turn about y, then the translation.
        let p = mat.transform(&core::Vec::new(0.0, 0.0, -1.0));
        assert!((p - core::Vec::new(0.0, 0.0, 11.0)).magnitude() < 1.0e-4);
    }
}
