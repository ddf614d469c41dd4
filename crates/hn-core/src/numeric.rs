/// Floating point type used throughout the network.
pub type Real = f64;

/// Relative difference `|a-b| / max(|a|,|b|)`, zero when both are ~0.
pub fn relative_difference(a: Real, b: Real) -> Real {
    let scale = a.abs().max(b.abs());
    if scale < 1e-12 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_difference_handles_zero() {
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert!((relative_difference(1.0, 2.0) - 0.5).abs() < 1e-15);
        assert_eq!(relative_difference(-1.0, 1.0), 2.0);
    }
}
