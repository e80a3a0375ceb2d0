/// Standard normal cumulative distribution function.
///
/// Hastings approximation (Abramowitz & Stegun 26.2.17), absolute error below
/// 7.5e-8. `Φ(-z) = 1 - Φ(z)` handles the negative half.
pub fn standard_normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == 0.0 {
        return 0.5;
    }
    if z >= 8.0 {
        return 1.0;
    }
    if z <= -8.0 {
        return 0.0;
    }

    let (z_abs, negate) = if z < 0.0 { (-z, true) } else { (z, false) };

    const P: f64 = 0.2316419;
    const B1: f64 = 0.319381530;
    const B2: f64 = -0.356563782;
    const B3: f64 = 1.781477937;
    const B4: f64 = -1.821255978;
    const B5: f64 = 1.330274429;

    let t = 1.0 / (1.0 + P * z_abs);
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let pdf = (-0.5 * z_abs * z_abs).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let upper = 1.0 - pdf * poly;

    if negate { 1.0 - upper } else { upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_matches_reference_points() {
        assert_eq!(standard_normal_cdf(0.0), 0.5);
        assert!((standard_normal_cdf(1.0) - 0.841_344_7).abs() < 1e-6);
        assert!((standard_normal_cdf(-1.0) - 0.158_655_3).abs() < 1e-6);
        assert!((standard_normal_cdf(1.96) - 0.975_002_1).abs() < 1e-6);
        assert_eq!(standard_normal_cdf(9.0), 1.0);
        assert_eq!(standard_normal_cdf(-9.0), 0.0);
    }

    #[test]
    fn cdf_is_increasing() {
        let mut previous = 0.0;
        for step in -30..=30 {
            let value = standard_normal_cdf(step as f64 * 0.2);
            assert!(value > previous, "cdf not increasing at step {step}");
            previous = value;
        }
    }
}
