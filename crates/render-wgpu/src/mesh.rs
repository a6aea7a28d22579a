use bytemuck::{Pod, Zeroable};
use sceneview_render::MeshKind;
use std::ops::Range;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

const fn v(position: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex { position, normal }
}

const P: f32 = 0.5;

/// One quad per entry: four corners counter-clockwise seen from outside,
/// and the face normal.
#[rustfmt::skip]
const CUBE_FACES: [([[f32; 3]; 4], [f32; 3]); 6] = [
    ([[-P, -P,  P], [ P, -P,  P], [ P,  P,  P], [-P,  P,  P]], [ 0.0,  0.0,  1.0]),
    ([[ P, -P, -P], [-P, -P, -P], [-P,  P, -P], [ P,  P, -P]], [ 0.0,  0.0, -1.0]),
    ([[ P, -P,  P], [ P, -P, -P], [ P,  P, -P], [ P,  P,  P]], [ 1.0,  0.0,  0.0]),
    ([[-P, -P, -P], [-P, -P,  P], [-P,  P,  P], [-P,  P, -P]], [-1.0,  0.0,  0.0]),
    ([[-P,  P,  P], [ P,  P,  P], [ P,  P, -P], [-P,  P, -P]], [ 0.0,  1.0,  0.0]),
    ([[-P, -P, -P], [ P, -P, -P], [ P, -P,  P], [-P, -P,  P]], [ 0.0, -1.0,  0.0]),
];

#[rustfmt::skip]
const PLANE_FACE: ([[f32; 3]; 4], [f32; 3]) =
    ([[-P, 0.0,  P], [ P, 0.0,  P], [ P, 0.0, -P], [-P, 0.0, -P]], [0.0, 1.0, 0.0]);

/// Every mesh kind packed into one vertex and one index buffer.
pub(crate) struct MeshAtlas {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    cube: MeshRange,
    plane: MeshRange,
}

/// Where one mesh lives inside the atlas buffers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeshRange {
    pub indices: Range<u32>,
    pub base_vertex: i32,
}

impl MeshAtlas {
    pub fn build() -> Self {
        let mut atlas = Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            cube: MeshRange {
                indices: 0..0,
                base_vertex: 0,
            },
            plane: MeshRange {
                indices: 0..0,
                base_vertex: 0,
            },
        };
        atlas.cube = atlas.push_quads(&CUBE_FACES);
        atlas.plane = atlas.push_quads(&[PLANE_FACE]);
        atlas
    }

    pub fn range(&self, mesh: MeshKind) -> &MeshRange {
        match mesh {
            MeshKind::Cube => &self.cube,
            MeshKind::Plane => &self.plane,
        }
    }

    fn push_quads(&mut self, quads: &[([[f32; 3]; 4], [f32; 3])]) -> MeshRange {
        let base_vertex = self.vertices.len() as i32;
        let first_index = self.indices.len() as u32;
        for (i, (corners, normal)) in quads.iter().enumerate() {
            let base = (i * 4) as u16;
            self.vertices.extend(corners.iter().map(|c| v(*c, *normal)));
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        MeshRange {
            indices: first_index..self.indices.len() as u32,
            base_vertex,
        }
    }
}
