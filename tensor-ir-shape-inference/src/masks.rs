//! Strided slice mask attributes and the axis plan derived from them.

use smallvec::SmallVec;

use crate::error::{MaskKind, ShapeInferenceError};

/// The five mask attributes of a strided slice.
///
/// Each mask is indexed by _slicing axis_, the index into the begin, end and
/// stride inputs. Entries are stored as the raw integers found in a graph so
/// that out-of-domain values can be reported, rather than rejected at
/// construction time.
///
/// - `begin_mask[i] == 1` ignores `begin[i]` and starts from the first
///   element in the direction of traversal.
/// - `end_mask[i] == 1` ignores `end[i]` and stops after the last element.
/// - `new_axis_mask[i] == 1` inserts a size-1 axis into the output.
/// - `shrink_axis_mask[i] == 1` selects the single element at `begin[i]` and
///   removes the axis from the output.
/// - `ellipsis_mask[i] == 1` stands in for all data axes not otherwise
///   mentioned, each taken in full.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MaskSet {
    pub begin_mask: Vec<i64>,
    pub end_mask: Vec<i64>,
    pub new_axis_mask: Vec<i64>,
    pub shrink_axis_mask: Vec<i64>,
    pub ellipsis_mask: Vec<i64>,
}

impl MaskSet {
    /// Create a mask set with the given begin and end masks. The other masks
    /// are zero-filled to the length of `begin_mask`.
    pub fn new(begin_mask: Vec<i64>, end_mask: Vec<i64>) -> Self {
        let len = begin_mask.len();
        MaskSet {
            begin_mask,
            end_mask,
            new_axis_mask: vec![0; len],
            shrink_axis_mask: vec![0; len],
            ellipsis_mask: vec![0; len],
        }
    }

    /// Create a mask set with all masks zero for `len` slicing axes.
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0; len], vec![0; len])
    }

    pub fn with_new_axis_mask(mut self, mask: Vec<i64>) -> Self {
        self.new_axis_mask = mask;
        self
    }

    pub fn with_shrink_axis_mask(mut self, mask: Vec<i64>) -> Self {
        self.shrink_axis_mask = mask;
        self
    }

    pub fn with_ellipsis_mask(mut self, mask: Vec<i64>) -> Self {
        self.ellipsis_mask = mask;
        self
    }

    /// Return the mask of the given kind.
    pub fn get(&self, kind: MaskKind) -> &[i64] {
        match kind {
            MaskKind::Begin => &self.begin_mask,
            MaskKind::End => &self.end_mask,
            MaskKind::NewAxis => &self.new_axis_mask,
            MaskKind::ShrinkAxis => &self.shrink_axis_mask,
            MaskKind::Ellipsis => &self.ellipsis_mask,
        }
    }

    /// Return the number of slicing axes described by the masks, which is
    /// the length of the longest mask.
    pub fn num_axes(&self) -> usize {
        MaskKind::ALL
            .iter()
            .map(|&kind| self.get(kind).len())
            .max()
            .unwrap_or(0)
    }

    /// Return true if the mask of the given kind is set for `axis`.
    ///
    /// Entries past the end of a mask are treated as 0, and any non-zero
    /// entry is treated as set.
    pub fn is_set(&self, kind: MaskKind, axis: usize) -> bool {
        self.get(kind).get(axis).is_some_and(|&bit| bit != 0)
    }

    /// Return the slicing axis of the first ellipsis, ignoring entries where
    /// `new_axis_mask` is also set.
    pub fn ellipsis_axis(&self) -> Option<usize> {
        (0..self.num_axes())
            .find(|&i| self.is_set(MaskKind::Ellipsis, i) && !self.is_set(MaskKind::NewAxis, i))
    }

    /// Return the number of set entries in a mask.
    pub fn count(&self, kind: MaskKind) -> usize {
        self.get(kind).iter().filter(|&&bit| bit != 0).count()
    }

    /// Check that all masks have the same length as `begin_mask`.
    pub fn check_lengths(&self) -> Result<(), ShapeInferenceError> {
        let expected = self.begin_mask.len();
        for kind in MaskKind::ALL {
            let actual = self.get(kind).len();
            if actual != expected {
                return Err(ShapeInferenceError::MaskLengthMismatch {
                    mask: kind,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Check that every mask entry is 0 or 1.
    pub fn check_values(&self) -> Result<(), ShapeInferenceError> {
        for kind in MaskKind::ALL {
            if let Some((index, &value)) = self
                .get(kind)
                .iter()
                .enumerate()
                .find(|(_, &v)| v != 0 && v != 1)
            {
                return Err(ShapeInferenceError::MaskValueInvalid {
                    mask: kind,
                    index,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Check that at most one ellipsis is present.
    pub fn check_ellipsis(&self) -> Result<(), ShapeInferenceError> {
        match self.count(MaskKind::Ellipsis) {
            0 | 1 => Ok(()),
            count => Err(ShapeInferenceError::MultipleEllipsis { count }),
        }
    }
}

/// How one output axis of a strided slice is produced.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AxisPlan {
    /// Data axis `data_axis` is sliced using the parameters at
    /// `slicing_axis`.
    Forward {
        data_axis: usize,
        slicing_axis: usize,
    },
    /// A size-1 axis is inserted.
    NewAxis,
    /// Data axis `data_axis` is reduced to the single element at the begin
    /// index of `slicing_axis`, and removed from the output.
    Shrink {
        data_axis: usize,
        slicing_axis: usize,
    },
    /// Data axis `data_axis` is taken in full, either because it is covered
    /// by an ellipsis or because no slicing axis refers to it.
    EllipsisForward { data_axis: usize },
}

impl AxisPlan {
    /// Return true if this entry contributes an axis to the output.
    pub fn is_output_axis(&self) -> bool {
        !matches!(self, AxisPlan::Shrink { .. })
    }
}

pub type AxisPlans = SmallVec<[AxisPlan; 8]>;

/// Resolve the masks against `num_axes` slicing axes and a data tensor of
/// rank `rank`.
///
/// Returns one entry per slicing axis, with an ellipsis replaced by a run of
/// `EllipsisForward` entries, followed by an `EllipsisForward` entry for each
/// trailing data axis that no slicing axis refers to. `Shrink` entries are
/// included so that callers can locate the sliced element, even though they
/// do not produce an output axis.
///
/// Where more than one mask is set for a slicing axis, `new_axis_mask` takes
/// precedence over `ellipsis_mask`, which takes precedence over
/// `shrink_axis_mask`.
pub fn plan_axes(
    masks: &MaskSet,
    num_axes: usize,
    rank: usize,
) -> Result<AxisPlans, ShapeInferenceError> {
    let is_new_axis = |i| masks.is_set(MaskKind::NewAxis, i);
    let is_ellipsis = |i| !is_new_axis(i) && masks.is_set(MaskKind::Ellipsis, i);

    let ellipsis_count = (0..num_axes).filter(|&i| is_ellipsis(i)).count();
    if ellipsis_count > 1 {
        return Err(ShapeInferenceError::MultipleEllipsis {
            count: ellipsis_count,
        });
    }

    // Data axes consumed by slicing axes other than the ellipsis.
    let consumed = (0..num_axes)
        .filter(|&i| !is_new_axis(i) && !is_ellipsis(i))
        .count();
    let ellipsis_len = if ellipsis_count > 0 {
        rank.checked_sub(consumed)
            .ok_or(ShapeInferenceError::TooManySlicingAxes {
                required: consumed,
                rank,
            })?
    } else {
        0
    };

    let mut plan = AxisPlans::new();
    let mut data_axis = 0;
    for slicing_axis in 0..num_axes {
        if is_new_axis(slicing_axis) {
            plan.push(AxisPlan::NewAxis);
        } else if is_ellipsis(slicing_axis) {
            plan.extend((data_axis..data_axis + ellipsis_len).map(|data_axis| {
                AxisPlan::EllipsisForward { data_axis }
            }));
            data_axis += ellipsis_len;
        } else if masks.is_set(MaskKind::ShrinkAxis, slicing_axis) {
            plan.push(AxisPlan::Shrink {
                data_axis,
                slicing_axis,
            });
            data_axis += 1;
        } else {
            plan.push(AxisPlan::Forward {
                data_axis,
                slicing_axis,
            });
            data_axis += 1;
        }
    }

    if data_axis > rank {
        return Err(ShapeInferenceError::TooManySlicingAxes {
            required: data_axis,
            rank,
        });
    }
    plan.extend((data_axis..rank).map(|data_axis| AxisPlan::EllipsisForward { data_axis }));

    Ok(plan)
}
