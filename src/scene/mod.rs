mod node;
pub use self::node::Node;

use crate::core;
use crate::geom::{Disc, Geom, Inverted, Mesh, MeshError, Sphere};
use crate::light::AreaLight;
use crate::material::{Bsdf, Dielectric, Lambert, Phong};
use crate::render::Camera;

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde_json::Value;

/// Everything that can go wrong turning a scene document into a scene. The
/// failing property's path through the document is carried wherever one
/// exists; underlying causes are chained through Error::source.
#[derive(Debug)]
pub enum SceneError {
    /// The document is not valid JSON at all.
    Json(serde_json::Error),
    /// The document is valid JSON but malformed as a scene: a missing key,
    /// a wrong type, a bad vector arity, an unknown type tag.
    Parse {path: String, detail: String},
    /// A reference names a light, material, or geometry that was never
    /// defined.
    Resolution {path: String, name: String},
    /// A mesh file could not be imported.
    Import {path: String, source: MeshError},
    /// Reading the scene document itself failed.
    Io(io::Error),
}

impl Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SceneError::Json(err) => {
                write!(f, "scene document is not valid JSON: {}", err)
            }
            SceneError::Parse {path, detail} => {
                write!(f, "cannot parse scene property '{}': {}", path, detail)
            }
            SceneError::Resolution {path, name} => {
                write!(f, "cannot resolve reference '{}' in property '{}'",
                    name, path)
            }
            SceneError::Import {path, ..} => {
                write!(f, "cannot import mesh in property '{}'", path)
            }
            SceneError::Io(err) => {
                write!(f, "cannot read scene document: {}", err)
            }
        }
    }
}

impl error::Error for SceneError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SceneError::Json(err) => Some(err),
            SceneError::Import {source, ..} => Some(source),
            SceneError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// A scene read from a JSON document of four ordered sections: lights,
/// materials, geometry, and cameras. Each section maps unique names to
/// objects, and later sections may refer to entries of earlier ones by
/// name (geometry may also refer to earlier geometry, for wrappers).
///
/// The scene owns every object; geometry shares the referenced materials
/// and lights, and rendering borrows all of it immutably.
pub struct Scene {
    pub lights: HashMap<String, Arc<AreaLight>>,
    pub materials: HashMap<String, Arc<dyn Bsdf>>,
    pub geometry: HashMap<String, Arc<dyn Geom>>,
    pub cameras: HashMap<String, Camera>,
}

impl Scene {
    /// Reads a scene from a JSON file. Mesh file references inside the
    /// document resolve relative to the document's directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
        let contents = fs::read_to_string(&path).map_err(SceneError::Io)?;
        let base_dir = path.as_ref().parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_json(&contents, &base_dir)
    }

    /// Parses a scene from JSON text. The sections are read in document
    /// order, which is what allows an entry to reference anything defined
    /// before it.
    pub fn from_json(data: &str, base_dir: &Path) -> Result<Scene, SceneError> {
        let root: Value = serde_json::from_str(data).map_err(SceneError::Json)?;

        let mut scene = Scene {
            lights: HashMap::new(),
            materials: HashMap::new(),
            geometry: HashMap::new(),
            cameras: HashMap::new(),
        };
        scene.read_lights(&root)?;
        scene.read_materials(&root)?;
        scene.read_geometry(&root, base_dir)?;
        scene.read_cameras(&root)?;
        Ok(scene)
    }

    /// Builds the acceleration structure over all of the scene's geometry.
    pub fn build_kdtree(&self) -> crate::geom::KdTree {
        crate::geom::KdTree::build(self.geometry.values().cloned().collect())
    }

    /// Removes and returns the camera to render with.
    pub fn take_camera(&mut self, name: &str) -> Result<Camera, SceneError> {
        self.cameras.remove(name).ok_or_else(|| SceneError::Resolution {
            path: String::from("cameras"),
            name: String::from(name),
        })
    }

    fn read_lights(&mut self, root: &Value) -> Result<(), SceneError> {
        each_entry(root, "lights", |node| {
            let light = match node.get_string("type")? {
                "area" => AreaLight::new(node.get_vec("color")?),
                other => return Err(unknown_type(node, other)),
            };
            Ok(Arc::new(light))
        }, &mut self.lights)
    }

    fn read_materials(&mut self, root: &Value) -> Result<(), SceneError> {
        each_entry(root, "materials", |node| {
            let material: Arc<dyn Bsdf> = match node.get_string("type")? {
                "lambert" => Arc::new(Lambert::new(node.get_vec("color")?)),
                "phong" => Arc::new(Phong::new(
                    node.get_float("exponent")?,
                    node.get_vec("color")?)),
                "dielectric" => Arc::new(Dielectric::new(
                    node.get_float("ior")?,
                    node.get_vec_or("color", core::Vec::one())?)),
                other => return Err(unknown_type(node, other)),
            };
            Ok(material)
        }, &mut self.materials)
    }

    fn read_geometry(&mut self, root: &Value, base_dir: &Path)
        -> Result<(), SceneError>
    {
        // Geometry entries resolve references against the sections already
        // parsed, plus the geometry parsed so far (for wrappers), so the
        // loop is written out rather than going through each_entry.
        let entries = match section(root, "geometry")? {
            Some(entries) => entries,
            None => return Ok(()),
        };

        for (count, (name, value)) in entries.iter().enumerate() {
            let path = format!("geometry.[{}]{}", count, name);
            if self.geometry.contains_key(name) {
                return Err(SceneError::Parse {
                    path,
                    detail: String::from("name was already used in this section"),
                });
            }

            let node = Node::new(value, path);

            let geom: Arc<dyn Geom> = match node.get_string("type")? {
                "sphere" => Arc::new(Sphere::new(
                    self.resolve_material(&node, "mat")?,
                    self.resolve_light(&node, "light")?,
                    node.get_vec("origin")?,
                    node.get_float("radius")?)),
                "disc" => Arc::new(Disc::new(
                    self.resolve_material(&node, "mat")?,
                    self.resolve_light(&node, "light")?,
                    node.get_vec("origin")?,
                    node.get_vec("normal")?,
                    node.get_float("radius")?)),
                "mesh" => {
                    let file = node.get_string("file")?;
                    let mesh = Mesh::from_obj(
                        self.resolve_material(&node, "mat")?,
                        self.resolve_light(&node, "light")?,
                        node.get_vec("origin")?,
                        base_dir.join(file));
                    Arc::new(mesh.map_err(|source| SceneError::Import {
                        path: format!("{}.file", node.path()),
                        source,
                    })?)
                }
                // A wrapper takes its material and light from the wrapped
                // geometry; only "original" is read here.
                "inverted" => {
                    let original = node.get_string("original")?;
                    let inner = self.geometry.get(original).ok_or_else(|| {
                        SceneError::Resolution {
                            path: format!("{}.original", node.path()),
                            name: String::from(original),
                        }
                    })?;
                    Arc::new(Inverted::new(inner.clone()))
                }
                other => return Err(unknown_type(&node, other)),
            };

            self.geometry.insert(name.clone(), geom);
        }
        Ok(())
    }

    fn read_cameras(&mut self, root: &Value) -> Result<(), SceneError> {
        each_entry(root, "cameras", |node| {
            let camera = match node.get_string("type")? {
                "persp" => Camera::new(
                    node.get_transform("transform")?,
                    node.get_usize("width")?,
                    node.get_usize("height")?,
                    node.get_float("fov")?,
                    node.get_float("focalLength")?,
                    node.get_float("fStop")?),
                other => return Err(unknown_type(node, other)),
            };
            Ok(camera)
        }, &mut self.cameras)
    }

    fn resolve_material(&self, node: &Node, key: &str)
        -> Result<Option<Arc<dyn Bsdf>>, SceneError>
    {
        match node.get_string_opt(key)? {
            None => Ok(None),
            Some(name) => match self.materials.get(name) {
                Some(material) => Ok(Some(material.clone())),
                None => Err(SceneError::Resolution {
                    path: format!("{}.{}", node.path(), key),
                    name: String::from(name),
                }),
            },
        }
    }

    fn resolve_light(&self, node: &Node, key: &str)
        -> Result<Option<Arc<AreaLight>>, SceneError>
    {
        match node.get_string_opt(key)? {
            None => Ok(None),
            Some(name) => match self.lights.get(name) {
                Some(light) => Ok(Some(light.clone())),
                None => Err(SceneError::Resolution {
                    path: format!("{}.{}", node.path(), key),
                    name: String::from(name),
                }),
            },
        }
    }
}

/// Looks up a section object by name. Sections are optional; an absent
/// section just reads as empty.
fn section<'a>(root: &'a Value, name: &str)
    -> Result<Option<&'a serde_json::Map<String, Value>>, SceneError>
{
    match root.get(name) {
        None => Ok(None),
        Some(value) => value.as_object().map(Some).ok_or_else(|| {
            SceneError::Parse {
                path: String::from(name),
                detail: String::from("expected a name -> object table"),
            }
        }),
    }
}

/// Reads every entry of a section through the given constructor, enforcing
/// unique names and decorating errors with the entry's document position.
fn each_entry<T, F>(
    root: &Value,
    section_name: &str,
    mut read_one: F,
    storage: &mut HashMap<String, T>) -> Result<(), SceneError>
where
    F: FnMut(&Node) -> Result<T, SceneError>,
{
    let entries = match section(root, section_name)? {
        Some(entries) => entries,
        None => return Ok(()),
    };

    for (count, (name, value)) in entries.iter().enumerate() {
        let path = format!("{}.[{}]{}", section_name, count, name);
        if storage.contains_key(name) {
            return Err(SceneError::Parse {
                path,
                detail: String::from("name was already used in this section"),
            });
        }
        let node = Node::new(value, path);
        let item = read_one(&node)?;
        storage.insert(name.clone(), item);
    }
    Ok(())
}

fn unknown_type(node: &Node, type_name: &str) -> SceneError {
    SceneError::Parse {
        path: format!("{}.type", node.path()),
        detail: format!("'{}' is not a recognized type", type_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_document() -> &'static str {
        r#"{
            "lights": {
                "lamp": {"type": "area", "color": [4.0, 4.0, 4.0]}
            },
            "materials": {
                "white": {"type": "lambert", "color": [1.0, 1.0, 1.0]},
                "shiny": {"type": "phong", "exponent": 100.0,
                          "color": [1.0, 0.9, 0.8]},
                "glass": {"type": "dielectric", "ior": 1.5}
            },
            "geometry": {
                "ball": {"type": "sphere", "origin": [0.0, 0.0, -10.0],
                         "radius": 2.0, "mat": "white"},
                "floor": {"type": "disc", "origin": [0.0, -2.0, -10.0],
                          "normal": [0.0, 1.0, 0.0], "radius": 50.0,
                          "mat": "shiny"},
                "bulb": {"type": "sphere", "origin": [0.0, 10.0, -10.0],
                         "radius": 3.0, "light": "lamp"},
                "shell": {"type": "inverted", "original": "bulb"}
            },
            "cameras": {
                "default": {
                    "type": "persp",
                    "transform": {"translate": [0.0, 0.0, 5.0]},
                    "fov": 0.7853981,
                    "focalLength": 50.0,
                    "fStop": 16.0,
                    "width": 64,
                    "height": 48
                }
            }
        }"#
    }

    #[test]
    fn example_document_parses_and_resolves() {
        let mut scene =
            Scene::from_json(example_document(), Path::new(".")).unwrap();
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.materials.len(), 3);
        assert_eq!(scene.geometry.len(), 4);

        // The referenced material and light actually land on the geometry.
        assert!(scene.geometry["ball"].material().is_some());
        assert!(scene.geometry["ball"].light().is_none());
        assert!(scene.geometry["bulb"].light().is_some());
        assert!(scene.geometry["shell"].light().is_some());

        let kdt = scene.build_kdtree();
        assert_eq!(kdt.objects().len(), 4);
        assert_eq!(kdt.lights().len(), 2);

        let camera = scene.take_camera("default").unwrap();
        assert_eq!((camera.width(), camera.height()), (64, 48));
        assert!(scene.take_camera("default").is_err());
    }

    #[test]
    fn undefined_reference_is_a_resolution_error() {
        let doc = r#"{
            "geometry": {
                "ball": {"type": "sphere", "origin": [0.0, 0.0, 0.0],
                         "radius": 1.0, "mat": "nonexistent"}
            }
        }"#;
        match Scene::from_json(doc, Path::new(".")) {
            Err(SceneError::Resolution {path, name}) => {
                assert_eq!(path, "geometry.[0]ball.mat");
                assert_eq!(name, "nonexistent");
            }
            other => panic!("expected a resolution error, got {:?}",
                other.err().map(|e| e.to_string())),
        }
    }

    #[test]
    fn missing_required_key_is_a_parse_error_with_path() {
        let doc = r#"{
            "materials": {
                "glass": {"type": "dielectric"}
            }
        }"#;
        match Scene::from_json(doc, Path::new(".")) {
            Err(SceneError::Parse {path, ..}) => {
                assert_eq!(path, "materials.[0]glass.ior");
            }
            other => panic!("expected a parse error, got {:?}",
                other.err().map(|e| e.to_string())),
        }
    }

    #[test]
    fn inverted_ignores_material_and_light_fields() {
        // A wrapper inherits mat/light from the wrapped geometry; stray
        // fields on the inverted entry must not be resolved.
        let doc = r#"{
            "geometry": {
                "wall": {"type": "disc", "origin": [0.0, 0.0, -10.0],
                         "normal": [0.0, 0.0, 1.0], "radius": 5.0},
                "shell": {"type": "inverted", "original": "wall",
                          "mat": "undefined", "light": "also-undefined"}
            }
        }"#;
        let scene = Scene::from_json(doc, Path::new(".")).unwrap();
        assert_eq!(scene.geometry.len(), 2);
        assert!(scene.geometry["shell"].material().is_none());
        assert!(scene.geometry["shell"].light().is_none());
    }

    #[test]
    fn invalid_json_reports_a_chained_cause() {
        use std::error::Error;
        let err = match Scene::from_json("{ not json", Path::new(".")) {
            Err(err) => err,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let doc = r#"{
            "lights": {
                "sun": {"type": "directional", "color": [1.0, 1.0, 1.0]}
            }
        }"#;
        match Scene::from_json(doc, Path::new(".")) {
            Err(SceneError::Parse {path, detail}) => {
                assert_eq!(path, "lights.[0]sun.type");
                assert!(detail.contains("directional"));
            }
            other => panic!("expected a parse error, got {:?}",
                other.err().map(|e| e.to_string())),
        }
    }
}
