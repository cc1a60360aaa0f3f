use crate::session::Package;

/// One simulated print run of the whole photo set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintAction {
    /// 1-based copy number within the package.
    pub copy: u32,
    /// Number of photos covered by this print.
    pub photo_count: usize,
}

/// Simulate printing: one action per package copy, each logging the current
/// photo count. There is no retry; printing is a log-only affair.
pub fn print_actions(package: Package, photo_count: usize) -> Vec<PrintAction> {
    (1..=package.multiplier())
        .map(|copy| {
            log::info!(
                "Printing {} photos ({}, copy {} of {})",
                photo_count,
                package.label(),
                copy,
                package.multiplier()
            );
            PrintAction { copy, photo_count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_prints_once() {
        let actions = print_actions(Package::Single, 6);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0], PrintAction { copy: 1, photo_count: 6 });
    }

    #[test]
    fn test_double_prints_twice_with_same_count() {
        let actions = print_actions(Package::Double, 6);
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.photo_count == 6));
        assert_eq!(actions[0].copy, 1);
        assert_eq!(actions[1].copy, 2);
    }
}
