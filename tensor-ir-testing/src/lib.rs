//! Testing utilities shared by the tensor-ir crates.

use std::fmt::Debug;
use std::panic::{catch_unwind, RefUnwindSafe, UnwindSafe};

/// Table-driven tests.
///
/// Shape inference rules have many edge cases, which are most readably
/// expressed as a table of inputs and expected outputs. To write such a test:
///
/// 1. Import the `TestCases` trait.
/// 2. Define a `#[derive(Debug)] struct Case` holding the inputs and
///    expected result for one case.
/// 3. Build a collection of cases, conventionally named `cases`.
/// 4. Call `cases.test_each` with the check to run for each case.
///
/// Every case is run even if an earlier one fails. If any case panics, the
/// test then fails with the number of failing cases and their debug
/// representations, so that a single run reports every broken case.
///
/// ```
/// use tensor_ir_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     size: u64,
///     step: u64,
///     expected: u64,
/// }
///
/// let cases = [
///     Case { size: 6, step: 2, expected: 3 },
///     Case { size: 7, step: 2, expected: 4 },
/// ];
///
/// cases.test_each(|case| {
///     assert_eq!(case.size.div_ceil(case.step), case.expected);
/// });
/// ```
///
/// Panics are caught with [`catch_unwind`], so cases and anything captured
/// by the check must be unwind safe. Values with interior mutability, such as
/// a shared label table, should be created inside the check instead.
pub trait TestCases {
    type Case;

    /// Run `test` with a reference to each case.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Run `test` with a clone of each case.
    ///
    /// This is convenient where the check consumes parts of the case.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;

    /// Run `test` with each case by value.
    ///
    /// Each case is formatted before it is run, so that it can be reported
    /// if the check fails.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

/// Panic if any cases failed.
fn report_failures<T: Debug>(failures: &[T]) {
    assert!(
        failures.is_empty(),
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + Clone + UnwindSafe,
    {
        let test = &test;
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| {
                let case = case.clone();
                catch_unwind(move || test(case)).is_err()
            })
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + UnwindSafe,
    {
        let test = &test;
        let failures: Vec<String> = self
            .into_iter()
            .filter_map(|case| {
                let description = format!("{:?}", case);
                catch_unwind(move || test(case)).err().map(|_| description)
            })
            .collect();
        report_failures(&failures);
    }
}
