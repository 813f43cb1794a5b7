use crate::core;
use crate::geom::geom;
use crate::geom::geom::Geom;
use crate::geom::poly;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::error;
use std::fmt;
use std::fmt::Display;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use rand::rngs::StdRng;
use wavefront_obj::obj;

/// The ways reading a mesh from disk can fail.
#[derive(Debug)]
pub enum MeshError {
    Io(io::Error),
    Parse(wavefront_obj::ParseError),
    /// The file parsed but is unusable, e.g. it contains no vertices.
    Malformed(String),
}

impl Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeshError::Io(err) => write!(f, "cannot read mesh file: {}", err),
            MeshError::Parse(err) => write!(
                f, "OBJ parse error at line {}: {}", err.line_number, err.message),
            MeshError::Malformed(detail) => write!(f, "unusable mesh: {}", detail),
        }
    }
}

impl error::Error for MeshError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MeshError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MeshError {
    fn from(err: io::Error) -> MeshError {
        MeshError::Io(err)
    }
}

impl From<wavefront_obj::ParseError> for MeshError {
    fn from(err: wavefront_obj::ParseError) -> MeshError {
        MeshError::Parse(err)
    }
}

/// A collection of triangles read from a Wavefront OBJ file. A mesh is
/// composite geometry: it cannot be intersected directly and must instead be
/// refined into its triangles, which share the mesh's point table.
pub struct Mesh {
    mat: Option<Arc<dyn Bsdf>>,
    light: Option<Arc<AreaLight>>,
    pub origin: core::Vec,
    points: Arc<Vec<poly::PolyPoint>>,
    faces: Vec<(usize, usize, usize)>,
}

impl Mesh {
    /// Reads a mesh from an OBJ file, offsetting every vertex by the given
    /// origin. Only triangle primitives are kept (the importer contract is a
    /// triangulated mesh). Vertex normals are taken from the file when
    /// present and non-degenerate; otherwise the face's geometric normal is
    /// substituted so that every vertex carries a usable shading normal.
    pub fn from_obj<P: AsRef<Path>>(
        mat: Option<Arc<dyn Bsdf>>,
        light: Option<Arc<AreaLight>>,
        origin: core::Vec,
        path: P) -> Result<Mesh, MeshError>
    {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let obj_set = obj::parse(contents)?;

        let mut points = Vec::new();
        let mut faces = Vec::new();
        for object in &obj_set.objects {
            let vertex_offset = points.len();
            for v in &object.vertices {
                points.push(poly::PolyPoint {
                    position: core::Vec::new(v.x as f32, v.y as f32, v.z as f32)
                        + origin,
                    normal: core::Vec::zero(),
                });
            }

            let file_normals: Vec<core::Vec> = object.normals.iter()
                .map(|n| core::Vec::new(n.x as f32, n.y as f32, n.z as f32))
                .collect();

            for geometry in &object.geometry {
                for shape in &geometry.shapes {
                    if let obj::Primitive::Triangle(a, b, c) = &shape.primitive {
                        let (av, bv, cv) = (
                            vertex_offset + a.0,
                            vertex_offset + b.0,
                            vertex_offset + c.0);

                        let geom_normal =
                            (points[bv].position - points[av].position)
                            .cross(&(points[cv].position - points[av].position));

                        for (&vert, &index) in
                            [av, bv, cv].iter().zip([a.2, b.2, c.2].iter())
                        {
                            let from_file = index
                                .map(|i| file_normals[i])
                                .filter(|n| !n.is_nearly_zero());
                            points[vert].normal = match from_file {
                                Some(n) => n.normalized(),
                                None => geom_normal.normalized(),
                            };
                        }

                        faces.push((av, bv, cv));
                    }
                }
            }
        }

        if points.is_empty() || faces.is_empty() {
            return Err(MeshError::Malformed(String::from(
                "no triangles with vertex positions")));
        }

        Ok(Mesh {
            mat,
            light,
            origin,
            points: Arc::new(points),
            faces,
        })
    }

    /// Builds a mesh directly from vertex data, for hand-constructed scenes
    /// and tests.
    pub fn from_points(
        mat: Option<Arc<dyn Bsdf>>,
        light: Option<Arc<AreaLight>>,
        points: Vec<poly::PolyPoint>,
        faces: Vec<(usize, usize, usize)>) -> Mesh
    {
        Mesh {
            mat,
            light,
            origin: core::Vec::zero(),
            points: Arc::new(points),
            faces,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
}

impl geom::Geom for Mesh {
    /// Unsupported: meshes must be refined before intersection.
    fn intersect(&self, _: &core::Ray) -> Option<geom::Intersection> {
        unreachable!("unrefined mesh cannot be intersected");
    }

    /// Unsupported: meshes must be refined before intersection.
    fn intersect_shadow(&self, _: &core::Ray, _: f32) -> bool {
        unreachable!("unrefined mesh cannot be intersected");
    }

    fn bounds(&self) -> core::BBox {
        let mut bounds = core::BBox::empty();
        for pt in self.points.iter() {
            bounds = bounds.expand_point(&pt.position);
        }
        bounds
    }

    /// Unsupported: sample the refined triangles instead.
    fn sample_point(&self, _: &mut StdRng) -> core::Vec {
        unreachable!("unrefined mesh cannot be sampled");
    }

    fn area(&self) -> f32 {
        self.refine().iter().map(|p| p.area()).sum()
    }

    fn material(&self) -> Option<&dyn Bsdf> {
        self.mat.as_deref()
    }

    fn light(&self) -> Option<&AreaLight> {
        self.light.as_deref()
    }

    fn refine(&self) -> Vec<Arc<dyn Geom>> {
        self.faces.iter().map(|&(a, b, c)| {
            Arc::new(poly::Poly::new(
                self.mat.clone(),
                self.light.clone(),
                a, b, c,
                self.points.clone())) as Arc<dyn Geom>
        }).collect()
    }
}
