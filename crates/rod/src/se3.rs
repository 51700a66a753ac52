//! Rigid-displacement utilities on SE(3) and its Lie algebra.
//!
//! Twists are ordered angular part first: `ξ = (ω, v)`. Rigid displacements
//! are 4×4 homogeneous matrices.

use nalgebra::{Matrix3, Matrix4, Matrix6, Rotation3, Vector3, Vector6};

/// Angle below which series expansions replace the closed-form coefficients.
const SMALL_ANGLE: f64 = 1e-6;

/// A body twist `(ω, v)`.
pub type Twist = Vector6<f64>;

/// Returns the 4×4 matrix representation `ξ̂` of a twist.
#[must_use]
pub fn hat(xi: &Twist) -> Matrix4<f64> {
    let mut m = Matrix4::zeros();
    m.fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&angular(xi).cross_matrix());
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&linear(xi));
    m
}

/// Returns the twist represented by the upper 3×4 block of `m`.
#[must_use]
pub fn vee(m: &Matrix4<f64>) -> Twist {
    Twist::new(
        m[(2, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(0, 3)],
        m[(1, 3)],
        m[(2, 3)],
    )
}

/// Returns the adjoint operator `ad_ξ = [[ω×, 0], [v×, ω×]]`.
///
/// `ad(ξ) * η` is the Lie bracket `[ξ, η]`.
#[must_use]
pub fn ad(xi: &Twist) -> Matrix6<f64> {
    let omega = angular(xi).cross_matrix();
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&omega);
    m.fixed_view_mut::<3, 3>(3, 0)
        .copy_from(&linear(xi).cross_matrix());
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(&omega);
    m
}

/// Returns the inverse of a rigid displacement.
#[must_use]
pub fn inverse(t: &Matrix4<f64>) -> Matrix4<f64> {
    let rt = rotation(t).transpose();
    let p = translation(t);

    let mut inv = Matrix4::identity();
    inv.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
    inv.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-(rt * p)));
    inv
}

/// Exponential map from a twist to a rigid displacement.
#[must_use]
pub fn exp6(xi: &Twist) -> Matrix4<f64> {
    let omega = angular(xi);
    let theta = omega.norm();
    let w = omega.cross_matrix();
    let w2 = w * w;

    let (a, b) = if theta < SMALL_ANGLE {
        (0.5 - theta * theta / 24.0, 1.0 / 6.0 - theta * theta / 120.0)
    } else {
        let t2 = theta * theta;
        ((1.0 - theta.cos()) / t2, (theta - theta.sin()) / (t2 * theta))
    };
    let v = Matrix3::identity() + w * a + w2 * b;

    let mut t = Matrix4::identity();
    t.fixed_view_mut::<3, 3>(0, 0)
        .copy_from(Rotation3::new(omega).matrix());
    t.fixed_view_mut::<3, 1>(0, 3).copy_from(&(v * linear(xi)));
    t
}

/// Logarithm map from a rigid displacement to its minimal twist.
///
/// The rotation part of `t` must be orthonormal.
#[must_use]
pub fn log6(t: &Matrix4<f64>) -> Twist {
    let omega = log3(&rotation(t));
    let theta = omega.norm();
    let w = omega.cross_matrix();

    let c = if theta < SMALL_ANGLE {
        1.0 / 12.0 + theta * theta / 720.0
    } else {
        let half = 0.5 * theta;
        (1.0 - half / half.tan()) / (theta * theta)
    };
    let v_inv = Matrix3::identity() - w * 0.5 + w * w * c;
    let v = v_inv * translation(t);

    Twist::new(omega.x, omega.y, omega.z, v.x, v.y, v.z)
}

/// Logarithm map on SO(3), returning the rotation vector.
fn log3(r: &Matrix3<f64>) -> Vector3<f64> {
    let w = 0.5 * Vector3::new(r[(2, 1)] - r[(1, 2)], r[(0, 2)] - r[(2, 0)], r[(1, 0)] - r[(0, 1)]);
    let sin = w.norm();
    let cos = 0.5 * (r.trace() - 1.0);
    let theta = sin.atan2(cos);

    if theta < SMALL_ANGLE {
        return w * (1.0 + theta * theta / 6.0);
    }

    if sin < SMALL_ANGLE {
        // Near a half turn the skew part vanishes; recover the axis from R + I.
        let sym = r + Matrix3::identity();
        let k = (0..3)
            .max_by(|&i, &j| sym[(i, i)].total_cmp(&sym[(j, j)]))
            .unwrap_or(0);
        let mut axis = sym.column(k) / (2.0 * sym[(k, k)]).sqrt();
        if axis.dot(&w) < 0.0 {
            axis = -axis;
        }
        return axis * theta;
    }

    w * (theta / sin)
}

fn angular(xi: &Twist) -> Vector3<f64> {
    xi.fixed_rows::<3>(0).into_owned()
}

fn linear(xi: &Twist) -> Vector3<f64> {
    xi.fixed_rows::<3>(3).into_owned()
}

fn rotation(t: &Matrix4<f64>) -> Matrix3<f64> {
    t.fixed_view::<3, 3>(0, 0).into_owned()
}

fn translation(t: &Matrix4<f64>) -> Vector3<f64> {
    t.fixed_view::<3, 1>(0, 3).into_owned()
}
