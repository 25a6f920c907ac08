use foundation::math::{GeoPoint, SphericalProjector};
use layers::{LineLayer, Starfield};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
}

/// Unit sphere in the globe's local frame with equirectangular UVs, so
/// texel `(u, v)` lands on the same lon/lat the map texture painted there.
pub fn generate_sphere_mesh(lat_segments: u32, lon_segments: u32) -> (Vec<GlobeVertex>, Vec<u16>) {
    let lat_segments = lat_segments.max(3);
    let lon_segments = lon_segments.max(3);
    let projector = SphericalProjector::default();

    let mut vertices = Vec::with_capacity(((lat_segments + 1) * (lon_segments + 1)) as usize);
    for lat in 0..=lat_segments {
        let v = lat as f64 / lat_segments as f64;
        let lat_deg = 90.0 - v * 180.0;
        for lon in 0..=lon_segments {
            let u = lon as f64 / lon_segments as f64;
            let lon_deg = u * 360.0 - 180.0;
            let p = projector.to_point(GeoPoint::new(lon_deg, lat_deg), 1.0);
            vertices.push(GlobeVertex {
                position: p.as_f32(),
                uv: [u as f32, v as f32],
            });
        }
    }

    let stride = lon_segments + 1;
    let mut indices = Vec::with_capacity((lat_segments * lon_segments * 6) as usize);
    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let i0 = lat * stride + lon;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;

            indices.push(i0 as u16);
            indices.push(i2 as u16);
            indices.push(i1 as u16);
            indices.push(i1 as u16);
            indices.push(i2 as u16);
            indices.push(i3 as u16);
        }
    }

    (vertices, indices)
}

/// Line-list vertices for a layer; empty when the layer is hidden.
pub fn line_vertices(layer: &LineLayer) -> Vec<LineVertex> {
    if !layer.style.visible {
        return Vec::new();
    }
    let color = layer.style.color;
    layer
        .segment_list()
        .into_iter()
        .map(|p| LineVertex {
            position: p.as_f32(),
            color,
        })
        .collect()
}

pub fn star_vertices(stars: &Starfield) -> Vec<StarVertex> {
    stars
        .points
        .iter()
        .map(|p| StarVertex {
            position: p.as_f32(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use layers::{BORDER_LAYER, LayerStyle};
    use foundation::math::Vec3;

    #[test]
    fn sphere_uvs_match_equirectangular_texture() {
        let (verts, indices) = generate_sphere_mesh(64, 64);
        assert_eq!(verts.len(), 65 * 65);
        assert_eq!(indices.len(), 64 * 64 * 6);

        // v = 0 is the north pole, u = 0.5 is the prime meridian
        let north = verts[0];
        assert!((north.position[1] - 1.0).abs() < 1e-6);
        let centre = verts[32 * 65 + 32];
        assert_eq!(centre.uv, [0.5, 0.5]);
        assert!((centre.position[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hidden_layers_emit_nothing() {
        let mut layer = LineLayer::new(BORDER_LAYER, LayerStyle::default());
        layer.strips.push(vec![Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(line_vertices(&layer).len(), 4);

        layer.style.visible = false;
        assert!(line_vertices(&layer).is_empty());
    }
}
