//! Head pose estimation from six facial correspondence points.
//!
//! Solves the perspective-n-point problem for a fixed six-point 3D face
//! model against the detected nose/chin/eye-corner/mouth-corner image
//! points, then extracts yaw/pitch/roll from the recovered rotation.
//!
//! The camera is modeled as an ideal pinhole: focal length = image width,
//! principal point = image center, zero lens distortion. The 3D model is a
//! fixed constant in millimetres with the nose tip at the origin; it is not
//! calibrated to any real device.

use crate::landmarks::{
    FaceLandmarks, CHIN, LEFT_EYE_OUTER, LEFT_MOUTH_CORNER, NOSE_TIP, RIGHT_EYE_OUTER,
    RIGHT_MOUTH_CORNER,
};
use crate::Point;

/// Canonical 3D face model: nose tip, chin, left eye outer corner, right eye
/// outer corner, left mouth corner, right mouth corner.
pub const MODEL_POINTS: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [0.0, -330.0, -65.0],
    [-225.0, 170.0, -135.0],
    [225.0, 170.0, -135.0],
    [-150.0, -150.0, -125.0],
    [150.0, -150.0, -125.0],
];

const GAUSS_NEWTON_ITERS: usize = 20;
const CONVERGENCE_EPS: f64 = 1e-8;
/// Residual ceiling (pixels, RMS) above which the solve is rejected.
const MAX_RMS_RESIDUAL: f64 = 12.0;

/// Recovered head orientation in degrees.
///
/// `known = false` means the solver produced no valid pose this frame; the
/// zero angles then mean "unknown", never "looking perfectly forward".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub known: bool,
}

impl HeadPose {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn head_tilt(&self) -> f64 {
        self.roll.abs()
    }
}

/// Estimate head pose from a face landmark set.
///
/// Returns an unknown pose when the correspondence points are missing or the
/// solver fails to converge.
pub fn estimate(face: &FaceLandmarks, width: u32, height: u32) -> HeadPose {
    let indices = [
        NOSE_TIP,
        CHIN,
        LEFT_EYE_OUTER,
        RIGHT_EYE_OUTER,
        LEFT_MOUTH_CORNER,
        RIGHT_MOUTH_CORNER,
    ];
    let Some(image_points) = face.select(indices) else {
        return HeadPose::unknown();
    };
    solve(&image_points, width, height).unwrap_or_else(HeadPose::unknown)
}

/// Solve PnP for the six correspondence points and extract Euler angles.
pub fn solve(image_points: &[Point; 6], width: u32, height: u32) -> Option<HeadPose> {
    // A collapsed observation set (coincident landmarks) carries no pose
    // information; the optimizer would otherwise chase it to infinity.
    let spread = image_points
        .iter()
        .flat_map(|a| image_points.iter().map(move |b| a.distance(b)))
        .fold(0.0f64, f64::max);
    if spread < 1.0 {
        return None;
    }

    let camera = Intrinsics::for_frame(width, height);

    // Start facing the camera at roughly arm's length.
    let mut params = [0.0, 0.0, 0.0, 0.0, 0.0, 1000.0];

    for _ in 0..GAUSS_NEWTON_ITERS {
        let residual = residuals(&params, image_points, &camera)?;
        let jacobian = numeric_jacobian(&params, image_points, &camera)?;

        // Normal equations: (JᵀJ) Δ = Jᵀ r
        let mut jtj = [[0.0f64; 6]; 6];
        let mut jtr = [0.0f64; 6];
        for row in 0..12 {
            for a in 0..6 {
                jtr[a] += jacobian[row][a] * residual[row];
                for b in 0..6 {
                    jtj[a][b] += jacobian[row][a] * jacobian[row][b];
                }
            }
        }

        let delta = solve_linear_6(jtj, jtr)?;
        let mut step = 0.0;
        for i in 0..6 {
            params[i] -= delta[i];
            step += delta[i] * delta[i];
        }
        if step < CONVERGENCE_EPS {
            break;
        }
    }

    // Reject solves that never explained the observations (degenerate or
    // inconsistent point sets drive the residual up instead of crashing).
    let residual = residuals(&params, image_points, &camera)?;
    let rms = (residual.iter().map(|r| r * r).sum::<f64>() / residual.len() as f64).sqrt();
    if !rms.is_finite() || rms > MAX_RMS_RESIDUAL {
        return None;
    }

    let rotation = rodrigues([params[0], params[1], params[2]]);
    let (pitch, yaw, roll) = euler_angles(&rotation);
    Some(HeadPose {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
        known: true,
    })
}

/// Pinhole camera intrinsics.
struct Intrinsics {
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Intrinsics {
    fn for_frame(width: u32, height: u32) -> Self {
        Self {
            focal: width as f64,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }
}

/// Reprojection residuals for the current (rvec, tvec) estimate, 2 per point.
fn residuals(params: &[f64; 6], image_points: &[Point; 6], camera: &Intrinsics) -> Option<[f64; 12]> {
    let rotation = rodrigues([params[0], params[1], params[2]]);
    let translation = [params[3], params[4], params[5]];
    let mut out = [0.0f64; 12];
    for (i, model) in MODEL_POINTS.iter().enumerate() {
        let (u, v) = project(&rotation, &translation, model, camera)?;
        out[2 * i] = u - image_points[i].x;
        out[2 * i + 1] = v - image_points[i].y;
    }
    Some(out)
}

/// Central-difference Jacobian of the residual vector, 12x6.
fn numeric_jacobian(
    params: &[f64; 6],
    image_points: &[Point; 6],
    camera: &Intrinsics,
) -> Option<[[f64; 6]; 12]> {
    let mut jacobian = [[0.0f64; 6]; 12];
    for col in 0..6 {
        let h = 1e-6 * params[col].abs().max(1.0);
        let mut plus = *params;
        let mut minus = *params;
        plus[col] += h;
        minus[col] -= h;
        let r_plus = residuals(&plus, image_points, camera)?;
        let r_minus = residuals(&minus, image_points, camera)?;
        for row in 0..12 {
            jacobian[row][col] = (r_plus[row] - r_minus[row]) / (2.0 * h);
        }
    }
    Some(jacobian)
}

/// Project a 3D model point through rotation, translation and the pinhole
/// camera. None when the point lands on or behind the image plane.
fn project(
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    model: &[f64; 3],
    camera: &Intrinsics,
) -> Option<(f64, f64)> {
    let mut cam = [0.0f64; 3];
    for (i, slot) in cam.iter_mut().enumerate() {
        *slot = rotation[i][0] * model[0]
            + rotation[i][1] * model[1]
            + rotation[i][2] * model[2]
            + translation[i];
    }
    if cam[2] <= 1e-6 {
        return None;
    }
    Some((
        camera.focal * cam[0] / cam[2] + camera.cx,
        camera.focal * cam[1] / cam[2] + camera.cy,
    ))
}

/// Rodrigues rotation-vector to rotation-matrix conversion.
pub(crate) fn rodrigues(rvec: [f64; 3]) -> [[f64; 3]; 3] {
    let theta = (rvec[0] * rvec[0] + rvec[1] * rvec[1] + rvec[2] * rvec[2]).sqrt();
    if theta < 1e-12 {
        return identity();
    }
    let (kx, ky, kz) = (rvec[0] / theta, rvec[1] / theta, rvec[2] / theta);
    let (s, c) = theta.sin_cos();
    let v = 1.0 - c;
    [
        [
            c + kx * kx * v,
            kx * ky * v - kz * s,
            kx * kz * v + ky * s,
        ],
        [
            ky * kx * v + kz * s,
            c + ky * ky * v,
            ky * kz * v - kx * s,
        ],
        [
            kz * kx * v - ky * s,
            kz * ky * v + kx * s,
            c + kz * kz * v,
        ],
    ]
}

fn identity() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

/// Euler angles (pitch, yaw, roll) in radians from a rotation matrix, with
/// the gimbal-lock branch when the decomposition is singular.
pub(crate) fn euler_angles(r: &[[f64; 3]; 3]) -> (f64, f64, f64) {
    let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();
    if sy >= 1e-6 {
        (
            r[2][1].atan2(r[2][2]),
            (-r[2][0]).atan2(sy),
            r[1][0].atan2(r[0][0]),
        )
    } else {
        ((-r[1][2]).atan2(r[1][1]), (-r[2][0]).atan2(sy), 0.0)
    }
}

/// Rotation matrix for Euler angles in degrees, composed in the same ZYX
/// order the extraction above decomposes. Used by the synthetic provider and
/// tests to generate image points with a known ground-truth pose.
pub(crate) fn rotation_from_euler_deg(pitch: f64, yaw: f64, roll: f64) -> [[f64; 3]; 3] {
    let (sp, cp) = pitch.to_radians().sin_cos();
    let (sy, cy) = yaw.to_radians().sin_cos();
    let (sr, cr) = roll.to_radians().sin_cos();
    let rx = [[1.0, 0.0, 0.0], [0.0, cp, -sp], [0.0, sp, cp]];
    let ry = [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
    let rz = [[cr, -sr, 0.0], [sr, cr, 0.0], [0.0, 0.0, 1.0]];
    mat_mul(&mat_mul(&rz, &ry), &rx)
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0f64; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Project the canonical model with a known pose; ground truth generator for
/// the synthetic provider.
pub(crate) fn project_model(
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    width: u32,
    height: u32,
) -> Option<[Point; 6]> {
    let camera = Intrinsics::for_frame(width, height);
    let mut out = [Point::default(); 6];
    for (slot, model) in out.iter_mut().zip(MODEL_POINTS.iter()) {
        let (u, v) = project(rotation, translation, model, &camera)?;
        *slot = Point::new(u, v);
    }
    Some(out)
}

/// Gaussian elimination with partial pivoting for the 6x6 normal equations.
fn solve_linear_6(mut a: [[f64; 6]; 6], mut b: [f64; 6]) -> Option<[f64; 6]> {
    for col in 0..6 {
        let mut pivot = col;
        for row in (col + 1)..6 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..6 {
            let factor = a[row][col] / a[col][col];
            for k in col..6 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 6];
    for col in (0..6).rev() {
        let mut sum = b[col];
        for k in (col + 1)..6 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn recovers_identity_pose() {
        let rotation = rotation_from_euler_deg(0.0, 0.0, 0.0);
        let points = project_model(&rotation, &[0.0, 0.0, 1000.0], 640, 480).unwrap();
        let pose = solve(&points, 640, 480).unwrap();
        assert!(pose.known);
        assert_close(pose.yaw, 0.0, 0.5);
        assert_close(pose.pitch, 0.0, 0.5);
        assert_close(pose.roll, 0.0, 0.5);
    }

    #[test]
    fn recovers_turned_head() {
        let rotation = rotation_from_euler_deg(10.0, -20.0, 5.0);
        let points = project_model(&rotation, &[30.0, -20.0, 900.0], 640, 480).unwrap();
        let pose = solve(&points, 640, 480).unwrap();
        assert!(pose.known);
        assert_close(pose.pitch, 10.0, 1.0);
        assert_close(pose.yaw, -20.0, 1.0);
        assert_close(pose.roll, 5.0, 1.0);
    }

    #[test]
    fn degenerate_points_yield_unknown() {
        // All six observations collapsed onto one pixel.
        let points = [Point::new(320.0, 240.0); 6];
        assert!(solve(&points, 640, 480).is_none());
    }

    #[test]
    fn euler_roundtrip_through_rotation() {
        let rotation = rotation_from_euler_deg(12.0, -25.0, 8.0);
        let (pitch, yaw, roll) = euler_angles(&rotation);
        assert_close(pitch.to_degrees(), 12.0, 1e-6);
        assert_close(yaw.to_degrees(), -25.0, 1e-6);
        assert_close(roll.to_degrees(), 8.0, 1e-6);
    }

    #[test]
    fn short_landmark_list_is_unknown() {
        let face = crate::landmarks::FaceLandmarks::new(vec![Point::new(0.0, 0.0); 10]);
        let pose = estimate(&face, 640, 480);
        assert!(!pose.known);
        assert_eq!(pose.yaw, 0.0);
    }
}
