use glam::Vec3;
use tandem_engine::paint::Color;

/// Everything the cube demo sets up at startup.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,

    pub background: Color,
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub light_color: Color,
    pub light_intensity: f32,
    pub light_position: Vec3,
    pub fog_color: Color,
    pub fog_near: f32,
    pub fog_far: f32,

    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    /// Edge length of the cube.
    pub cube_size: f32,
    /// Brick texture repeats per face, `[u, v]`.
    pub brick_repeat: [f32; 2],

    /// Elements in the shared vertex buffer. Must match the cube's vertex count.
    pub element_count: u32,
    /// Workgroup size of the injected program; it runs as a single workgroup.
    pub workgroup_size: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            fov_y: 80.0,
            near: 0.1,
            far: 100.0,
            camera_position: Vec3::new(3.0, 1.0, 3.0),

            background: Color::from_hex(0x0f0f0f),
            ambient_color: Color::WHITE,
            ambient_intensity: 0.2,
            light_color: Color::from_hex(0xff9900),
            light_intensity: 1.0,
            light_position: Vec3::new(20.0, 2.0, 5.0),
            fog_color: Color::from_hex(0x0f0f0f),
            fog_near: 1.0,
            fog_far: 10.0,

            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 10.0,

            cube_size: 1.0,
            brick_repeat: [2.0, 2.0],

            element_count: 24,
            workgroup_size: 24,
        }
    }
}
