use crate::error::RenderError;
use crate::hittable::{Mesh, Triangle, Vertex};
use crate::material::MaterialRef;
use crate::math::{Point3, Quaternion, Vec3};

/// Raw parsed OBJ data before the right-handed-to-left-handed conversion
/// and recentering `Mesh::from_obj` applies.
#[derive(Default)]
pub struct ObjData {
    pub positions: Vec<Point3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<(f64, f64)>,
    pub faces: Vec<[(usize, Option<usize>, Option<usize>); 3]>,
}

/// Parses `v`/`vn`/`vt`/`f` lines, triangulating polygonal faces by
/// fanning from the first vertex. Indices in `f` are OBJ's 1-based,
/// converted to 0-based here; negative (relative) indices are not
/// supported.
pub fn parse(source: &str) -> Result<ObjData, RenderError> {
    let mut data = ObjData::default();

    for (line_no, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or("");
        let rest: Vec<&str> = tokens.collect();

        match tag {
            "v" => data.positions.push(parse_vec3(&rest, line_no)?),
            "vn" => data.normals.push(parse_vec3(&rest, line_no)?),
            "vt" => {
                let u = parse_f64(rest.first(), line_no)?;
                let v = rest.get(1).map(|_| parse_f64(rest.get(1), line_no)).transpose()?.unwrap_or(0.0);
                data.uvs.push((u, v));
            }
            "f" => {
                let verts: Result<Vec<_>, RenderError> = rest.iter().map(|token| parse_face_vertex(token, line_no)).collect();
                let verts = verts?;
                if verts.len() < 3 {
                    return Err(RenderError::ObjParse(format!("line {line_no}: face needs at least 3 vertices")));
                }
                for i in 1..verts.len() - 1 {
                    data.faces.push([verts[0], verts[i], verts[i + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(data)
}

fn parse_f64(token: Option<&&str>, line_no: usize) -> Result<f64, RenderError> {
    token
        .ok_or_else(|| RenderError::ObjParse(format!("line {line_no}: missing component")))?
        .parse::<f64>()
        .map_err(|e| RenderError::ObjParse(format!("line {line_no}: {e}")))
}

fn parse_vec3(rest: &[&str], line_no: usize) -> Result<Vec3, RenderError> {
    Ok(Vec3::new(parse_f64(rest.first(), line_no)?, parse_f64(rest.get(1), line_no)?, parse_f64(rest.get(2), line_no)?))
}

fn parse_face_vertex(token: &str, line_no: usize) -> Result<(usize, Option<usize>, Option<usize>), RenderError> {
    let mut parts = token.split('/');
    let parse_index = |s: &str| -> Result<usize, RenderError> {
        s.parse::<usize>()
            .map(|i| i - 1)
            .map_err(|e| RenderError::ObjParse(format!("line {line_no}: {e}")))
    };
    let pos = parse_index(parts.next().unwrap_or(""))?;
    let uv = match parts.next() {
        Some("") | None => None,
        Some(s) => Some(parse_index(s)?),
    };
    let normal = match parts.next() {
        Some("") | None => None,
        Some(s) => Some(parse_index(s)?),
    };
    Ok((pos, uv, normal))
}

/// Builds a `Mesh` from parsed OBJ data under a rigid transform and
/// uniform scale. The file is right-handed and counter-clockwise winding;
/// the renderer is left-handed, so positions/normals get their Z negated
/// and each triangle's last two vertices swap to flip the winding back to
/// front-facing, matching `Mesh::Mesh(..., filename, ...)`. Vertices are
/// recentered at the mesh's centroid before the caller's transform is
/// applied.
pub fn build_mesh(
    data: &ObjData,
    position: Point3,
    rotation: Quaternion,
    scale: f64,
    material: MaterialRef,
    interpolate_normal: bool,
) -> Mesh {
    let converted: Vec<Point3> = data.positions.iter().map(|p| Vec3::new(p.x, p.y, -p.z)).collect();

    let centroid = if converted.is_empty() {
        Point3::zero()
    } else {
        converted.iter().fold(Point3::zero(), |acc, p| acc + *p) / converted.len() as f64
    };

    let place = |p: Point3| -> Point3 { position + rotation.rotate((p - centroid) * scale) };
    let rotate_normal = |n: Vec3| -> Vec3 { rotation.rotate(n) };

    let mut triangles = Vec::with_capacity(data.faces.len());
    for face in &data.faces {
        // Swap the last two corners: CCW (file) -> CW (engine) winding.
        let corners = [face[0], face[2], face[1]];
        let vertices: Vec<Vertex> = corners
            .iter()
            .map(|&(pi, uvi, ni)| {
                let position = place(converted[pi]);
                let normal = ni
                    .map(|i| rotate_normal(Vec3::new(data.normals[i].x, data.normals[i].y, -data.normals[i].z)))
                    .unwrap_or(Vec3::unit_y());
                let uv = uvi.map(|i| data.uvs[i]).unwrap_or((0.0, 0.0));
                Vertex::new(position, normal, uv)
            })
            .collect();
        triangles.push(Triangle::new(vertices[0].clone(), vertices[1].clone(), vertices[2].clone(), material.clone(), interpolate_normal));
    }

    Mesh::new(triangles)
}

/// Parses and builds in one step; parse failure yields an empty mesh (no
/// triangles) rather than aborting the render, per the loader's
/// `if (!loadout) return;` fallback.
pub fn load_mesh(
    source: &str,
    position: Point3,
    rotation: Quaternion,
    scale: f64,
    material: MaterialRef,
    interpolate_normal: bool,
) -> Mesh {
    match parse(source) {
        Ok(data) => build_mesh(&data, position, rotation, scale, material, interpolate_normal),
        Err(err) => {
            eprintln!("warning: {err}, mesh will be empty");
            Mesh::new(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::math::Color;
    use std::sync::Arc;

    const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";

    #[test]
    fn parses_a_single_triangle() {
        let data = parse(TRIANGLE_OBJ).unwrap();
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.faces.len(), 1);
    }

    #[test]
    fn triangulates_a_quad_face_by_fan() {
        let quad = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let data = parse(quad).unwrap();
        assert_eq!(data.faces.len(), 2);
    }

    #[test]
    fn build_mesh_produces_a_hittable_triangle() {
        let data = parse(TRIANGLE_OBJ).unwrap();
        let material: MaterialRef = Arc::new(Lambertian::new(Color::splat(0.5)));
        let mesh = build_mesh(&data, Point3::zero(), Quaternion::identity(), 1.0, material, false);
        use crate::hittable::Hittable;
        let bbox = mesh.bounding_box();
        assert!(bbox.min.x.is_finite());
    }

    #[test]
    fn malformed_face_index_reports_obj_parse_error() {
        let bad = "v 0 0 0\nf a b c\n";
        assert!(matches!(parse(bad), Err(RenderError::ObjParse(_))));
    }
}
