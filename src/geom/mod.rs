mod disc;
pub use self::disc::Disc;

mod geom;
pub use self::geom::{Geom, Intersection};

mod inverted;
pub use self::inverted::Inverted;

mod kdtree;
pub use self::kdtree::KdTree;

mod mesh;
pub use self::mesh::{Mesh, MeshError};

mod poly;
pub use self::poly::{Poly, PolyPoint};

mod sphere;
pub use self::sphere::Sphere;
