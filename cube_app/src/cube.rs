//! Cube mesh data
//!
//! A unit cube centered at the origin, 36 vertices, one flat color per face.
//! Non-indexed so each face owns its vertices and color outright.

use daisy_engine::render::vulkan::Vertex;

const WHITE: [f32; 3] = [0.9, 0.9, 0.9];
const YELLOW: [f32; 3] = [0.8, 0.8, 0.1];
const ORANGE: [f32; 3] = [0.9, 0.6, 0.1];
const RED: [f32; 3] = [0.8, 0.1, 0.1];
const BLUE: [f32; 3] = [0.1, 0.1, 0.8];
const GREEN: [f32; 3] = [0.1, 0.8, 0.1];

fn vertex(position: [f32; 3], color: [f32; 3]) -> Vertex {
    Vertex { position, color }
}

/// Vertex list for the demo cube.
///
/// Y points down in the rendering coordinate convention, so the "top" face
/// sits at negative Y.
pub fn cube_vertices() -> Vec<Vertex> {
    vec![
        // left face (white)
        vertex([-0.5, -0.5, -0.5], WHITE),
        vertex([-0.5, 0.5, 0.5], WHITE),
        vertex([-0.5, -0.5, 0.5], WHITE),
        vertex([-0.5, -0.5, -0.5], WHITE),
        vertex([-0.5, 0.5, -0.5], WHITE),
        vertex([-0.5, 0.5, 0.5], WHITE),
        // right face (yellow)
        vertex([0.5, -0.5, -0.5], YELLOW),
        vertex([0.5, 0.5, 0.5], YELLOW),
        vertex([0.5, -0.5, 0.5], YELLOW),
        vertex([0.5, -0.5, -0.5], YELLOW),
        vertex([0.5, 0.5, -0.5], YELLOW),
        vertex([0.5, 0.5, 0.5], YELLOW),
        // top face (orange)
        vertex([-0.5, -0.5, -0.5], ORANGE),
        vertex([0.5, -0.5, 0.5], ORANGE),
        vertex([-0.5, -0.5, 0.5], ORANGE),
        vertex([-0.5, -0.5, -0.5], ORANGE),
        vertex([0.5, -0.5, -0.5], ORANGE),
        vertex([0.5, -0.5, 0.5], ORANGE),
        // bottom face (red)
        vertex([-0.5, 0.5, -0.5], RED),
        vertex([0.5, 0.5, 0.5], RED),
        vertex([-0.5, 0.5, 0.5], RED),
        vertex([-0.5, 0.5, -0.5], RED),
        vertex([0.5, 0.5, -0.5], RED),
        vertex([0.5, 0.5, 0.5], RED),
        // front face (blue)
        vertex([-0.5, -0.5, 0.5], BLUE),
        vertex([0.5, 0.5, 0.5], BLUE),
        vertex([-0.5, 0.5, 0.5], BLUE),
        vertex([-0.5, -0.5, 0.5], BLUE),
        vertex([0.5, -0.5, 0.5], BLUE),
        vertex([0.5, 0.5, 0.5], BLUE),
        // back face (green)
        vertex([-0.5, -0.5, -0.5], GREEN),
        vertex([0.5, 0.5, -0.5], GREEN),
        vertex([-0.5, 0.5, -0.5], GREEN),
        vertex([-0.5, -0.5, -0.5], GREEN),
        vertex([0.5, -0.5, -0.5], GREEN),
        vertex([0.5, 0.5, -0.5], GREEN),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cube_has_two_triangles_per_face() {
        assert_eq!(cube_vertices().len(), 36);
    }

    #[test]
    fn cube_spans_unit_extent() {
        for v in cube_vertices() {
            for coordinate in v.position {
                assert!(coordinate == 0.5 || coordinate == -0.5);
            }
        }
    }

    #[test]
    fn cube_uses_six_face_colors() {
        let colors: HashSet<[u32; 3]> = cube_vertices()
            .iter()
            .map(|v| v.color.map(f32::to_bits))
            .collect();
        assert_eq!(colors.len(), 6);
    }
}
