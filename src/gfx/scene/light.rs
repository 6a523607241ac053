//! The showroom spotlight

use cgmath::{perspective, InnerSpace, Matrix4, Point3, Rad, Vector3};

use crate::config::{ShadowConfig, SpotLightConfig};
use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::color::srgb_hex_to_linear;

/// Cone light above the model, the only shadow caster in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Linear RGB colour
    pub color: [f32; 3],
    pub intensity: f32,
    /// Half-angle of the cone in radians
    pub angle: f32,
    /// Fraction of the cone over which light fades to zero
    pub penumbra: f32,
    pub shadow: ShadowConfig,
}

impl SpotLight {
    pub fn from_config(config: &SpotLightConfig, intensity: f32) -> Self {
        Self {
            position: Point3::from(config.position),
            target: Point3::from(config.target),
            color: srgb_hex_to_linear(config.color),
            intensity,
            angle: config.angle,
            penumbra: config.penumbra,
            shadow: config.shadow,
        }
    }

    pub fn direction(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Cosine of the outer cone edge, where light reaches zero
    pub fn cos_outer(&self) -> f32 {
        self.angle.cos()
    }

    /// Cosine of the inner cone edge, where falloff starts
    pub fn cos_inner(&self) -> f32 {
        (self.angle * (1.0 - self.penumbra)).cos()
    }

    /// View-projection of the shadow camera
    ///
    /// The frustum covers the cone scaled by the shadow focus, with the
    /// configured near and far planes.
    pub fn view_projection(&self) -> Matrix4<f32> {
        let direction = self.direction();
        // look_at degenerates when the up vector is parallel to the view
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };

        let view = Matrix4::look_at_rh(self.position, self.target, up);
        let fov = Rad(2.0 * self.angle * self.shadow.focus);
        let proj = perspective(fov, 1.0, self.shadow.near, self.shadow.far);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }

    /// Radius, in texels, of the PCF kernel used to soften the shadow edge
    pub fn pcf_radius(&self) -> f32 {
        (self.shadow.blur_samples as f32 / 4.0).clamp(0.0, 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Transform, Vector4};

    fn light() -> SpotLight {
        SpotLight::from_config(&SpotLightConfig::default(), 50.0)
    }

    #[test]
    fn cone_cosines_follow_angle_and_penumbra() {
        let light = light();
        assert!((light.cos_outer() - 0.5f32.cos()).abs() < 1e-6);
        assert!((light.cos_inner() - 0.45f32.cos()).abs() < 1e-6);
        assert!(light.cos_inner() > light.cos_outer());
    }

    #[test]
    fn shadow_camera_sees_the_origin() {
        let light = light();
        let clip = light.view_projection() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        // Something just outside the far plane is clipped
        let beyond = light
            .view_projection()
            .transform_point(Point3::new(0.0, 8.0 - 21.0, 0.0));
        assert!(beyond.z > 1.0);
    }
}
