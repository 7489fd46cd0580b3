/// Maximum number of projection faces (cubemap)
pub const FACE_NUMBER: usize = 6;

/// Padding scanned around each face during geometry mapping
pub const PAD_MAX: i32 = 16;

/// Tolerance for degenerate vectors and determinants
pub const EPS: f64 = 1.0e-6;

/// Largest face grid a packed frame may carry (rows and columns)
pub const MAX_LAYOUT_DIM: usize = 6;

/// ERP horizontal span in degrees, starting at -180
pub const ERP_HORZ_ANGLE: f32 = 360.0;
pub const ERP_HORZ_START: f32 = -180.0;

/// ERP vertical span in degrees, starting at +90 (top row)
pub const ERP_VERT_ANGLE: f32 = 180.0;
pub const ERP_VERT_START: f32 = 90.0;

/// Content coverage fixed-point scale (1/65536 degree)
pub const Q16: f64 = 65536.0;
