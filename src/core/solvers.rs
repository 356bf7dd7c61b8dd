use roots::{find_root_brent, SimpleConvergency};

/// Find a root of `func` inside the bracket `[lower, upper]` using Brent's method.
///
/// The function must change sign across the bracket.
pub(crate) fn root_in_bracket(
    func: impl Fn(f64) -> f64,
    lower: f64,
    upper: f64,
    tol: Option<f64>,
) -> anyhow::Result<f64> {
    let mut convergency = SimpleConvergency {
        eps: tol.unwrap_or(1e-8),
        max_iter: 100,
    };

    find_root_brent::<f64, _>(lower, upper, func, &mut convergency)
        .map_err(|e| anyhow::anyhow!("root finding failed in [{lower}, {upper}]: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn should_find_root_of_quadratic() {
        let root = root_in_bracket(|x| x * x - 2., 0., 2., None).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), max_relative = 1e-7);
    }

    #[rstest]
    fn should_fail_without_sign_change() {
        assert!(root_in_bracket(|x| x * x + 1., -1., 1., None).is_err());
    }
}
