use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use terrain_engine::TerrainSurface;

/// 法线贴图在地形上的平铺次数
pub const NORMAL_MAP_TILES: f32 = 10.0;

#[derive(Component)]
pub struct TerrainMesh {
    pub generation: u64,
}

/// 色带颜色为 sRGB, 顶点颜色按线性空间读取
fn vertex_colors(surface: &TerrainSurface) -> Vec<[f32; 4]> {
    surface
        .tints()
        .iter()
        .map(|&[r, g, b]| Color::rgb(r, g, b).as_linear_rgba_f32())
        .collect()
}

/// 把地形表面转换为网格; 平直着色时拆分顶点, 每个三角形使用自己的面法线
pub fn build_terrain_mesh(surface: &TerrainSurface) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.world_positions());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normals().to_vec());
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, surface.uvs(NORMAL_MAP_TILES));
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, vertex_colors(surface));
    mesh.set_indices(Some(Indices::U32(surface.triangle_indices())));

    if surface.flat_shading() {
        mesh.duplicate_vertices();
        mesh.compute_flat_normals();
    } else if let Err(e) = mesh.generate_tangents() {
        warn!("Terrain tangents unavailable, normal map disabled: {e}");
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;
    use terrain_engine::{ColorBandList, TerrainBuilder, TerrainParameters};

    fn surface(flat_shading: bool) -> TerrainSurface {
        let params = TerrainParameters { seed: 4, flat_shading, ..Default::default() };
        let bands = ColorBandList::default();
        TerrainBuilder::new(&params, &bands).build(400.0, 400.0, 4, 4).unwrap()
    }

    #[test]
    fn smooth_mesh_shares_vertices() {
        let s = surface(false);
        let mesh = build_terrain_mesh(&s);
        assert_eq!(mesh.count_vertices(), 25);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(4 * 4 * 6));
        assert!(mesh.attribute(Mesh::ATTRIBUTE_TANGENT).is_some());

        let Some(VertexAttributeValues::Float32x4(colors)) = mesh.attribute(Mesh::ATTRIBUTE_COLOR) else {
            panic!("terrain mesh has no vertex colours");
        };
        for (color, tint) in colors.iter().zip(s.tints()) {
            let expected = Color::rgb(tint[0], tint[1], tint[2]).as_linear_rgba_f32();
            assert_eq!(*color, expected);
        }
    }

    #[test]
    fn flat_mesh_has_one_vertex_per_corner() {
        let mesh = build_terrain_mesh(&surface(true));
        assert_eq!(mesh.count_vertices(), 4 * 4 * 6);
        assert!(mesh.indices().is_none());

        let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL) else {
            panic!("terrain mesh has no normals");
        };
        for tri in normals.chunks(3) {
            assert_eq!(tri[0], tri[1]);
            assert_eq!(tri[1], tri[2]);
            assert!(tri[0][1] > 0.0, "face normal points down: {:?}", tri[0]);
        }
    }
}
