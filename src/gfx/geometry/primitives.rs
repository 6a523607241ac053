use super::GeometryData;

/// Generate a horizontal plane in the XZ plane (Y-up coordinate system)
///
/// # Arguments
/// * `width` - Extent of the plane along X
/// * `depth` - Extent of the plane along Z
/// * `width_segments` - Number of subdivisions along X
/// * `depth_segments` - Number of subdivisions along Z
///
/// Returns a plane centered at the origin with its normal pointing up (+Y).
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
        }
    }

    // Counter-clockwise when viewed from above
    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, next_row, i + 1]);
            data.indices.extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
    }

    #[test]
    fn test_plane_is_horizontal_and_faces_up() {
        let plane = generate_plane(10.0, 10.0, 1, 1);
        assert!(plane.vertices.iter().all(|v| v[1] == 0.0));
        assert!(plane.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));

        let min_x = plane.vertices.iter().map(|v| v[0]).fold(f32::MAX, f32::min);
        let max_z = plane.vertices.iter().map(|v| v[2]).fold(f32::MIN, f32::max);
        assert_eq!(min_x, -5.0);
        assert_eq!(max_z, 5.0);

        // Winding of the first triangle produces a +Y face normal
        let [a, b, c] = [0, 1, 2].map(|k| plane.vertices[plane.indices[k] as usize]);
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let normal_y = e1[2] * e2[0] - e1[0] * e2[2];
        assert!(normal_y > 0.0);
    }
}
