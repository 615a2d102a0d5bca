//! Python-style slice ranges and their effect on dimension sizes.

use crate::dimension::Dimension;

/// A range for slicing one axis of a tensor.
///
/// This follows NumPy slicing: the step can be negative, in which case the
/// axis is traversed in reverse, and `start` and `end` can be negative, in
/// which case they count backwards from the end of the axis. Out of range
/// endpoints are clamped.
///
/// A `start` or `end` of `None` means the range begins or ends at the first
/// element in the direction of traversal (or the position just past the
/// last element).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceRange {
    pub start: Option<i64>,
    pub end: Option<i64>,

    /// Private so that the range can enforce that the step is non-zero.
    step: i64,
}

/// Which end of an axis a range endpoint is positioned relative to.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Anchor {
    Front,
    Back,
}

fn clamp_size(size: u64) -> i64 {
    size.min(i64::MAX as u64) as i64
}

/// Resolve an index which may be negative against an axis of length `len`.
fn offset_from_start(index: i64, len: i64) -> i64 {
    if index >= 0 {
        index
    } else {
        index.saturating_add(len)
    }
}

impl SliceRange {
    /// Create a range from `start` to `end` (exclusive) with the given step.
    ///
    /// Panics if `step` is 0.
    pub fn new(start: Option<i64>, end: Option<i64>, step: i64) -> SliceRange {
        assert!(step != 0, "Slice step cannot be 0");
        SliceRange { start, end, step }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Resolve the endpoints to positions in an axis of size `dim_size`,
    /// clamped to the valid range for the direction of traversal.
    ///
    /// When traversing forwards valid positions are `[0, len]`, and when
    /// traversing backwards they are `[-1, len - 1]`.
    fn clamped_endpoints(&self, dim_size: u64) -> (i64, i64) {
        let len = clamp_size(dim_size);
        if self.step > 0 {
            let start = self
                .start
                .map(|s| offset_from_start(s, len).clamp(0, len))
                .unwrap_or(0);
            let end = self
                .end
                .map(|e| offset_from_start(e, len).clamp(0, len))
                .unwrap_or(len);
            (start, end)
        } else {
            let start = self
                .start
                .map(|s| offset_from_start(s, len).clamp(-1, len - 1))
                .unwrap_or(len - 1);
            let end = self
                .end
                .map(|e| offset_from_start(e, len).clamp(-1, len - 1))
                .unwrap_or(-1);
            (start, end)
        }
    }

    /// Return the number of elements selected by this range from an axis of
    /// size `dim_size`.
    pub fn steps(&self, dim_size: u64) -> u64 {
        let (start, end) = self.clamped_endpoints(dim_size);
        let distance = if self.step > 0 {
            end - start
        } else {
            start - end
        };
        if distance <= 0 {
            return 0;
        }
        (distance as u64).div_ceil(self.step.unsigned_abs())
    }

    /// Return the positions selected by this range from an axis of size
    /// `dim_size`, in traversal order.
    pub fn indices(&self, dim_size: u64) -> impl Iterator<Item = u64> {
        let (start, _) = self.clamped_endpoints(dim_size);
        let step = self.step;
        (0..self.steps(dim_size)).map(move |i| (start + i as i64 * step) as u64)
    }

    fn start_anchor(&self) -> Anchor {
        match self.start {
            Some(s) if s >= 0 => Anchor::Front,
            Some(_) => Anchor::Back,
            None if self.step > 0 => Anchor::Front,
            None => Anchor::Back,
        }
    }

    fn end_anchor(&self) -> Anchor {
        match self.end {
            Some(e) if e >= 0 => Anchor::Front,
            Some(_) => Anchor::Back,
            None if self.step > 0 => Anchor::Back,
            None => Anchor::Front,
        }
    }

    /// Return true if the number of selected elements never decreases as the
    /// axis grows.
    ///
    /// This fails only when the traversal starts at a position relative to
    /// one end of the axis and stops at a position relative to the other end
    /// which it approaches, eg. `[-3:3]`.
    fn is_monotonic(&self) -> bool {
        let start = self.start_anchor();
        let end = self.end_anchor();
        if self.step > 0 {
            !(start == Anchor::Back && end == Anchor::Front)
        } else {
            !(start == Anchor::Front && end == Anchor::Back)
        }
    }

    /// Return true if slicing any axis with a size in `dim` selects the
    /// whole axis in order.
    pub fn is_full_range(&self, dim: &Dimension) -> bool {
        if self.step != 1 {
            return false;
        }
        let start_covers = match self.start {
            None | Some(0) => true,
            Some(s) if s < 0 => dim.max().is_some_and(|max| s.unsigned_abs() >= max),
            Some(_) => false,
        };
        let end_covers = match self.end {
            None | Some(i64::MAX) => true,
            Some(e) if e >= 0 => dim.max().is_some_and(|max| e as u64 >= max),
            Some(_) => false,
        };
        start_covers && end_covers
    }

    /// Return the bounds on the number of selected elements for an axis
    /// whose size is somewhere in `dim`.
    ///
    /// The result never has a label.
    pub fn size_bounds(&self, dim: &Dimension) -> Dimension {
        if let Some(size) = dim.size() {
            return Dimension::fixed(self.steps(size));
        }

        let (min, max) = if self.is_monotonic() {
            let max = match dim.max() {
                Some(max) => Some(self.steps(max)),
                None => self.saturated_steps(dim.min()),
            };
            (self.steps(dim.min()), max)
        } else {
            let limit = self.distance_limit();
            (0, Some(dim.max().map_or(limit, |max| max.min(limit))))
        };

        let min = max.map_or(min, |max| min.min(max));
        Dimension::from_bounds(min, max).unwrap_or_default()
    }

    /// For a monotonic range, return the number of elements selected from an
    /// arbitrarily large axis, or `None` if the count grows without bound.
    fn saturated_steps(&self, min_size: u64) -> Option<u64> {
        if self.start_anchor() != self.end_anchor() {
            return None;
        }
        let largest_index = self
            .start
            .map(|s| s.unsigned_abs())
            .max(self.end.map(|e| e.unsigned_abs()))
            .unwrap_or(0);
        let saturation_size = largest_index.checked_add(1)?;
        if saturation_size >= i64::MAX as u64 {
            return None;
        }
        Some(self.steps(saturation_size.max(min_size)))
    }

    /// For a non-monotonic range, return the largest number of elements it
    /// can select from an axis of any size.
    fn distance_limit(&self) -> u64 {
        let step = self.step.unsigned_abs();
        let (start, end) = (self.start.unwrap_or(0), self.end.unwrap_or(0));
        let limit = if self.step > 0 {
            // Starts `|start|` before the end, stops `end` after the start.
            start.unsigned_abs().min(end.unsigned_abs())
        } else {
            // Starts at `start` from the front, stops `|end| - 1` before the
            // end.
            (start.unsigned_abs().saturating_add(1)).min(end.unsigned_abs().saturating_sub(1))
        };
        limit.div_ceil(step)
    }
}

/// Start or end position for one slicing axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SliceBound {
    /// The position is ignored and the range extends to the start or end of
    /// the axis in the direction of traversal.
    Masked,
    /// A known index, which may be negative.
    Index(i64),
    /// The position is not known at compile time.
    Unknown,
}

impl SliceBound {
    fn resolve(self) -> Option<Option<i64>> {
        match self {
            SliceBound::Masked => Some(None),
            SliceBound::Index(idx) => Some(Some(idx)),
            SliceBound::Unknown => None,
        }
    }
}

/// Slice parameters for one axis, each of which may be unknown.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisSlice {
    pub start: SliceBound,
    pub end: SliceBound,

    /// Step size, or `None` if unknown.
    pub step: Option<i64>,
}

impl AxisSlice {
    /// Slice which selects the whole axis.
    pub fn full() -> AxisSlice {
        AxisSlice {
            start: SliceBound::Masked,
            end: SliceBound::Masked,
            step: Some(1),
        }
    }

    /// Slice whose parameters are all unknown.
    pub fn unknown() -> AxisSlice {
        AxisSlice {
            start: SliceBound::Unknown,
            end: SliceBound::Unknown,
            step: None,
        }
    }

    /// Return the range if all parameters are known and valid.
    pub fn to_range(&self) -> Option<SliceRange> {
        let step = self.step.filter(|&s| s != 0)?;
        Some(SliceRange::new(
            self.start.resolve()?,
            self.end.resolve()?,
            step,
        ))
    }
}

/// Compute the size of an axis of size `dim` after applying `slice`.
///
/// If the slice parameters are all known, the result is exact for a static
/// dimension and bounded as tightly as possible for a dynamic one. Otherwise
/// the result is `[0, dim.max()]`.
///
/// The input's label is kept only if the slice selects the whole axis with a
/// step of 1, which is the only case where the output axis is provably the
/// same size as the input axis.
pub fn slice_dimension(dim: &Dimension, slice: &AxisSlice) -> Dimension {
    let Some(range) = slice.to_range() else {
        return match dim.max() {
            Some(max) => Dimension::new(0, max),
            None => Dimension::dynamic(),
        };
    };
    if range.is_full_range(dim) {
        return dim.clone();
    }
    range.size_bounds(dim)
}
