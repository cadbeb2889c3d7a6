use drowsiness_core::{LandmarkFrame, Point};

pub const MESH_POINTS: usize = 468;
pub const FRAME_SIZE: u32 = 1000;
pub const FPS: f64 = 30.0;

/// Synthetic face with directly controllable signals.
///
/// In a 1000x1000 frame: EAR = 10 * eye_open, MAR = 5 * mouth_open,
/// tilt = (nose_y - 0.4) / 0.5.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub eye_open: f64,
    pub mouth_open: f64,
    pub nose_y: f64,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            eye_open: 0.03,
            mouth_open: 0.02,
            nose_y: 0.6,
        }
    }
}

impl Face {
    pub fn eyes_closed() -> Self {
        Self {
            eye_open: 0.005,
            ..Self::default()
        }
    }

    pub fn yawning() -> Self {
        Self {
            mouth_open: 0.18,
            ..Self::default()
        }
    }

    pub fn with_nose(nose_y: f64) -> Self {
        Self {
            nose_y,
            ..Self::default()
        }
    }

    pub fn frame(&self) -> LandmarkFrame {
        let mut points = vec![Point::new(0.5, 0.5); MESH_POINTS];
        let eye_y = 0.40;
        let half_eye = self.eye_open / 2.0;
        points[33] = Point::new(0.30, eye_y);
        points[133] = Point::new(0.40, eye_y);
        points[160] = Point::new(0.33, eye_y - half_eye);
        points[144] = Point::new(0.33, eye_y + half_eye);
        points[158] = Point::new(0.37, eye_y - half_eye);
        points[153] = Point::new(0.37, eye_y + half_eye);
        points[263] = Point::new(0.70, eye_y);

        let mouth_y = 0.75;
        let half_mouth = self.mouth_open / 2.0;
        points[61] = Point::new(0.40, mouth_y);
        points[291] = Point::new(0.60, mouth_y);
        points[13] = Point::new(0.50, mouth_y - half_mouth);
        points[14] = Point::new(0.50, mouth_y + half_mouth);
        points[78] = Point::new(0.48, mouth_y - half_mouth);
        points[308] = Point::new(0.48, mouth_y + half_mouth);

        points[1] = Point::new(0.50, self.nose_y);
        points[152] = Point::new(0.50, 0.90);

        LandmarkFrame::new(points, FRAME_SIZE, FRAME_SIZE)
    }
}

pub fn timestamp(frame_index: usize) -> f64 {
    frame_index as f64 / FPS
}
