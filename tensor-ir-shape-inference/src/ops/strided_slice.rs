use crate::dimension::Dimension;
use crate::element_type::ElementType;
use crate::error::{MaskKind, Operand, ShapeInferenceError};
use crate::infer_shapes::{check_input_count, check_integral, check_rank, InferShapes};
use crate::input_desc::InputDescriptor;
use crate::label::LabelTable;
use crate::masks::{plan_axes, AxisPlan, MaskSet};
use crate::partial_shape::PartialShape;
use crate::slice_range::{slice_dimension, AxisSlice, SliceBound};

/// Strided slice operator.
///
/// Takes inputs `data, begin, end[, stride]`. `begin`, `end` and `stride`
/// are 1D integer tensors indexed by slicing axis, which are mapped to data
/// axes according to `masks`. If `stride` is omitted it defaults to all
/// ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StridedSlice {
    pub masks: MaskSet,
}

impl StridedSlice {
    pub fn new(masks: MaskSet) -> Self {
        StridedSlice { masks }
    }

    /// Validate the inputs and infer the output shape and element type.
    pub fn infer(
        &self,
        data: &InputDescriptor,
        begin: &InputDescriptor,
        end: &InputDescriptor,
        stride: Option<&InputDescriptor>,
    ) -> Result<(PartialShape, ElementType), ShapeInferenceError> {
        let output = self.infer_value(data, begin, end, stride)?;
        Ok((output.shape, output.element_type))
    }

    /// Validate the inputs and infer the output, including its value if the
    /// data is a 1D value with known elements.
    pub fn infer_value(
        &self,
        data: &InputDescriptor,
        begin: &InputDescriptor,
        end: &InputDescriptor,
        stride: Option<&InputDescriptor>,
    ) -> Result<InputDescriptor, ShapeInferenceError> {
        self.validate(begin, end, stride)?;
        self.shape_infer(data, begin, end, stride)
    }

    /// Check structural constraints on the slice parameters and masks.
    ///
    /// Checks run in a fixed order so that the first violated constraint is
    /// the one reported.
    fn validate(
        &self,
        begin: &InputDescriptor,
        end: &InputDescriptor,
        stride: Option<&InputDescriptor>,
    ) -> Result<(), ShapeInferenceError> {
        check_integral(begin, Operand::Begin)?;
        check_integral(end, Operand::End)?;
        if let Some(stride) = stride {
            check_integral(stride, Operand::Stride)?;
        }

        self.masks.check_lengths()?;
        self.masks.check_values()?;

        check_rank(begin, Operand::Begin, 1)?;
        check_rank(end, Operand::End, 1)?;
        if let Some(stride) = stride {
            check_rank(stride, Operand::Stride, 1)?;
        }

        self.masks.check_ellipsis()?;

        // Every parameter whose length is known must agree with the first
        // such parameter.
        let lengths = [
            (Operand::Begin, Some(begin)),
            (Operand::End, Some(end)),
            (Operand::Stride, stride),
        ]
        .into_iter()
        .filter_map(|(operand, input)| Some((operand, input?.num_values()?)));
        let mut reference = None;
        for (operand, actual) in lengths {
            match reference {
                None => reference = Some((operand, actual)),
                Some((first, expected)) if expected != actual => {
                    return Err(ShapeInferenceError::LengthMismatch {
                        operand,
                        reference: first,
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }
        }

        // The length of the default stride comes from `begin`.
        if stride.is_none() && begin.num_values().is_none() {
            return Err(ShapeInferenceError::CannotInferDefaultStride);
        }

        Ok(())
    }

    /// Infer the output of the slice without validating the masks.
    ///
    /// Masks may have differing lengths. Missing entries are treated as 0 and
    /// non-zero entries as set. This is intended for callers which hold
    /// attributes that have already been validated.
    pub fn shape_infer(
        &self,
        data: &InputDescriptor,
        begin: &InputDescriptor,
        end: &InputDescriptor,
        stride: Option<&InputDescriptor>,
    ) -> Result<InputDescriptor, ShapeInferenceError> {
        if let Some(values) = stride.and_then(|s| s.constant_value.as_ref()) {
            if let Some(axis) = values.iter().position(|&s| s == 0) {
                return Err(ShapeInferenceError::ZeroStride { axis });
            }
        }

        let Some(data_dims) = data.shape.dims() else {
            return Ok(InputDescriptor::new(data.element_type, PartialShape::Dynamic));
        };

        let params = SliceParams {
            masks: &self.masks,
            begin,
            end,
            stride,
        };

        // If no parameter length is known, slicing axes past the end of the
        // masks may slice any trailing data axis. Each such axis has no mask
        // bits set, so the output rank is known but the trailing dimensions
        // are not.
        let num_axes = params.num_axes();
        let plan = plan_axes(
            &self.masks,
            num_axes.unwrap_or(self.masks.num_axes()),
            data_dims.len(),
        )?;

        let mut out_dims = Vec::with_capacity(plan.len());
        for entry in &plan {
            let dim = match *entry {
                AxisPlan::Forward {
                    data_axis,
                    slicing_axis,
                } => slice_dimension(&data_dims[data_axis], &params.axis_slice(slicing_axis)),
                AxisPlan::EllipsisForward { data_axis } if num_axes.is_some() => {
                    data_dims[data_axis].clone()
                }
                AxisPlan::EllipsisForward { data_axis } => {
                    slice_dimension(&data_dims[data_axis], &AxisSlice::unknown())
                }
                AxisPlan::NewAxis => Dimension::fixed(1),
                AxisPlan::Shrink { .. } => continue,
            };
            out_dims.push(dim);
        }

        if num_axes.is_none() {
            if let Some(ellipsis_axis) = self.masks.ellipsis_axis() {
                widen_after_ellipsis(&plan, ellipsis_axis, data_dims, &mut out_dims);
            }
        }

        let mut output = InputDescriptor::new(data.element_type, PartialShape::Static(out_dims));
        if num_axes.is_some() {
            fold_value(data, &plan, &params, &mut output);
        }
        Ok(output)
    }
}

/// Relax the output dimensions produced at and after an ellipsis, for a
/// slice whose number of slicing axes is unknown.
///
/// The ellipsis then covers an unknown number of data axes, so the slicing
/// axes after it may refer to any data axis after those preceding it.
/// If no slicing axis after the ellipsis inserts or removes an axis, output
/// axes still line up with data axes and each is relaxed to an unknown slice
/// of its data axis. Otherwise every such output axis is bounded by the
/// largest of the data axes it may come from.
fn widen_after_ellipsis(
    plan: &[AxisPlan],
    ellipsis_axis: usize,
    data_dims: &[Dimension],
    out_dims: &mut [Dimension],
) {
    // Each slicing axis before the ellipsis has exactly one plan entry.
    let (head, tail) = plan.split_at(ellipsis_axis);
    let first_output = head.iter().filter(|entry| entry.is_output_axis()).count();
    let first_data = head
        .iter()
        .filter(|entry| **entry != AxisPlan::NewAxis)
        .count();
    let out_tail = &mut out_dims[first_output..];
    let data_tail = &data_dims[first_data..];

    let has_new_axis = tail.contains(&AxisPlan::NewAxis);
    let has_shrink = tail
        .iter()
        .any(|entry| matches!(entry, AxisPlan::Shrink { .. }));

    if !has_new_axis && !has_shrink {
        for (out_dim, data_dim) in out_tail.iter_mut().zip(data_tail) {
            *out_dim = slice_dimension(data_dim, &AxisSlice::unknown());
        }
        return;
    }

    let init = u64::from(has_new_axis);
    let max = data_tail
        .iter()
        .try_fold(init, |max, dim| Some(max.max(dim.max()?)));
    let widened = match max {
        Some(max) => Dimension::new(0, max),
        None => Dimension::dynamic(),
    };
    for out_dim in out_tail {
        *out_dim = widened.clone();
    }
}

/// Slice parameters which are resolved per slicing axis.
struct SliceParams<'a> {
    masks: &'a MaskSet,
    begin: &'a InputDescriptor,
    end: &'a InputDescriptor,
    stride: Option<&'a InputDescriptor>,
}

impl SliceParams<'_> {
    /// Return the number of slicing axes if known.
    ///
    /// This is the longest of the masks and those of the begin, end and
    /// stride inputs whose length is known, or `None` if none of the input
    /// lengths are known.
    fn num_axes(&self) -> Option<usize> {
        let inputs = [Some(self.begin), Some(self.end), self.stride];
        let longest = inputs
            .into_iter()
            .flatten()
            .filter_map(|input| input.num_values())
            .max()?;
        Some(self.masks.num_axes().max(longest as usize))
    }

    fn bound(&self, input: &InputDescriptor, mask: MaskKind, axis: usize) -> SliceBound {
        if self.masks.is_set(mask, axis) {
            return SliceBound::Masked;
        }
        if input.num_values().is_some_and(|len| axis as u64 >= len) {
            return SliceBound::Masked;
        }
        match input.value_at(axis) {
            Some(index) => SliceBound::Index(index),
            None => SliceBound::Unknown,
        }
    }

    fn axis_slice(&self, axis: usize) -> AxisSlice {
        let step = match self.stride {
            None => Some(1),
            Some(stride) if stride.num_values().is_some_and(|len| axis as u64 >= len) => Some(1),
            Some(stride) => stride.value_at(axis),
        };
        AxisSlice {
            start: self.bound(self.begin, MaskKind::Begin, axis),
            end: self.bound(self.end, MaskKind::End, axis),
            step,
        }
    }
}

/// Compute the output value of a slice of a 1D value with known elements,
/// if all the slice parameters which apply to it are known.
///
/// Symbolic elements keep their labels, so that slicing the output of a
/// `ShapeOf` operator still identifies which input dimension each element
/// came from.
fn fold_value(
    data: &InputDescriptor,
    plan: &[AxisPlan],
    params: &SliceParams,
    output: &mut InputDescriptor,
) {
    let Some(len) = data.num_values() else {
        return;
    };
    if !data.has_value() || plan.contains(&AxisPlan::NewAxis) {
        return;
    }

    let indices: Vec<usize> = match plan {
        [AxisPlan::EllipsisForward { .. }] => (0..len as usize).collect(),
        [AxisPlan::Forward { slicing_axis, .. }] => {
            let Some(range) = params.axis_slice(*slicing_axis).to_range() else {
                return;
            };
            range.indices(len).map(|i| i as usize).collect()
        }
        [AxisPlan::Shrink { slicing_axis, .. }] => {
            let index = match params.bound(params.begin, MaskKind::Begin, *slicing_axis) {
                SliceBound::Masked => 0,
                SliceBound::Index(index) if index < 0 => index.saturating_add(len as i64),
                SliceBound::Index(index) => index,
                SliceBound::Unknown => return,
            };
            match usize::try_from(index) {
                Ok(index) => vec![index],
                Err(_) => return,
            }
        }
        _ => return,
    };

    output.symbolic_value = data
        .symbolic_value
        .as_deref()
        .and_then(|values| select(values, &indices));
    output.constant_value = data
        .constant_value
        .as_deref()
        .and_then(|values| select(values, &indices))
        .or_else(|| {
            output
                .symbolic_value
                .as_ref()?
                .iter()
                .map(|d| d.size().and_then(|size| i64::try_from(size).ok()))
                .collect()
        });
}

/// Return the elements of `values` at `indices`, or `None` if any index is
/// out of bounds.
fn select<T: Clone>(values: &[T], indices: &[usize]) -> Option<Vec<T>> {
    indices.iter().map(|&i| values.get(i).cloned()).collect()
}

/// Infer the output shape and element type of a strided slice.
///
/// This is a convenience wrapper around [`StridedSlice::infer`].
pub fn infer(
    data: &InputDescriptor,
    begin: &InputDescriptor,
    end: &InputDescriptor,
    stride: Option<&InputDescriptor>,
    masks: &MaskSet,
) -> Result<(PartialShape, ElementType), ShapeInferenceError> {
    StridedSlice {
        masks: masks.clone(),
    }
    .infer(data, begin, end, stride)
}

impl InferShapes for StridedSlice {
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        _labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
        check_input_count(inputs, 3, 4)?;
        let [data, begin, end, rest @ ..] = inputs else {
            return Err(ShapeInferenceError::IncorrectInputCount {
                expected: 3,
                actual: inputs.len(),
            });
        };
        let output = self.infer_value(data, begin, end, rest.first())?;
        Ok([output].into())
    }
}
