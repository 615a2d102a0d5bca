use std::cmp::Ordering;

use tensor_ir::shape_inference::{Dimension, PartialShape};

/// Overrides the size of a parameter dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct DimSize {
    /// Name of the parameter. If `None`, this matches all parameters.
    pub input_name: Option<String>,

    /// Index of the dimension.
    pub axis: usize,

    /// New size of the dimension.
    pub dim: Dimension,
}

impl DimSize {
    /// Return true if `self` specifies the size for a given parameter
    /// dimension.
    pub fn matches(&self, input_name: &str, axis: usize) -> bool {
        let name_matches = match &self.input_name {
            Some(name) => name == input_name,
            None => true,
        };
        name_matches && self.axis == axis
    }

    /// Parse a dimension size specifier in the form `axis=dim` or
    /// `input_name.axis=dim`.
    ///
    /// `dim` uses the dimension syntax, eg. `8`, `1..16` or `?`.
    pub fn parse(spec: &str) -> Result<DimSize, ParseError> {
        let tokens = tokenize(spec);
        let Some(eq_pos) = tokens.iter().position(|tok| matches!(tok, Token::Equals)) else {
            return Err(ParseError::new(
                spec,
                ParseErrorKind::InvalidFormat {
                    message: "expected <axis>=<dim> but no '=' was found".into(),
                },
            ));
        };

        let (name_spec, size_spec) = tokens.split_at(eq_pos);

        let [Token::Equals, Token::Text(size_str)] = size_spec else {
            return Err(ParseError::new(
                spec,
                ParseErrorKind::InvalidFormat {
                    message: "expected specifier to end with '=<dim>'".into(),
                },
            ));
        };

        let (input_name, axis) = match name_spec {
            [Token::Text(axis)] => (None, axis),
            [Token::Text(input), Token::Dot, Token::Text(axis)] => (Some(input), axis),
            _ => {
                return Err(ParseError::new(spec, ParseErrorKind::InvalidName));
            }
        };

        let axis: usize = axis
            .parse()
            .map_err(|_| ParseError::new(spec, ParseErrorKind::InvalidAxis))?;
        let dim: Dimension = size_str
            .parse()
            .map_err(|_| ParseError::new(spec, ParseErrorKind::InvalidSize))?;

        Ok(DimSize {
            input_name: input_name.map(|s| s.to_string()),
            axis,
            dim,
        })
    }

    /// Sort and de-duplicate entries in `sizes`.
    ///
    /// Entries are sorted with more specific sizes first (ie. those that
    /// specify an input name), then by axis.
    pub fn sort_dedup(sizes: &mut Vec<DimSize>) {
        sizes.sort_by(|a, b| match (&a.input_name, &b.input_name) {
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a_name), Some(b_name)) => a_name.cmp(b_name).then(a.axis.cmp(&b.axis)),
            (None, None) => a.axis.cmp(&b.axis),
        });

        // `dedup_by` keeps the first of each run of duplicates, but the last
        // entry given should win.
        sizes.reverse();
        sizes.dedup_by(|a, b| a.input_name == b.input_name && a.axis == b.axis);
        sizes.reverse();
    }

    /// Apply the first matching size in `sizes` to each dimension of a
    /// parameter's shape.
    ///
    /// Sizes are ignored if the parameter's rank is unknown.
    pub fn apply(sizes: &[DimSize], input_name: &str, shape: PartialShape) -> PartialShape {
        let PartialShape::Static(dims) = shape else {
            return shape;
        };
        dims.into_iter()
            .enumerate()
            .map(|(axis, dim)| {
                sizes
                    .iter()
                    .find(|size| size.matches(input_name, axis))
                    .map(|size| size.dim.clone())
                    .unwrap_or(dim)
            })
            .collect()
    }
}

enum Token {
    Equals,
    Dot,
    Text(String),
}

/// Split a specifier into tokens.
///
/// Text after the first `=` is kept as a single token, since dimension
/// ranges contain dots.
fn tokenize(spec: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut in_quote = false;
    let mut in_size = false;

    for ch in spec.chars() {
        match ch {
            '=' if !in_quote && !in_size => {
                tokens.push(Token::Equals);
                in_size = true;
            }
            '.' if !in_quote && !in_size => {
                tokens.push(Token::Dot);
            }
            '"' if !in_size => in_quote = !in_quote,
            ch => match tokens.last_mut() {
                Some(Token::Text(text)) => text.push(ch),
                _ => tokens.push(Token::Text(ch.into())),
            },
        }
    }

    tokens
}

#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::enum_variant_names)] // Don't warn about all variants having "Invalid" prefix.
enum ParseErrorKind {
    /// Dimension size spec doesn't match "axis=dim"
    InvalidFormat { message: String },
    /// Dimension size spec has an invalid input name
    InvalidName,
    /// Dimension size spec has an axis which is not a number
    InvalidAxis,
    /// Dimension size spec has an invalid size
    InvalidSize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    spec: String,
    kind: ParseErrorKind,
}

impl ParseError {
    fn new(spec: &str, kind: ParseErrorKind) -> ParseError {
        ParseError {
            spec: spec.to_string(),
            kind,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::InvalidFormat { message } => write!(
                fmt,
                "invalid format for dimension size spec \"{}\": {}",
                self.spec, message
            ),
            ParseErrorKind::InvalidName => {
                write!(fmt, "invalid name in dimension size spec \"{}\"", self.spec)
            }
            ParseErrorKind::InvalidAxis => write!(
                fmt,
                "invalid axis in dimension size spec \"{}\". Must be a non-negative integer.",
                self.spec
            ),
            ParseErrorKind::InvalidSize => write!(
                fmt,
                "invalid dimension size in \"{}\". Must be a size such as `8`, `1..16` or `?`.",
                self.spec
            ),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use tensor_ir::shape_inference::{Dimension, PartialShape};
    use tensor_ir_testing::TestCases;

    use super::{DimSize, ParseError, ParseErrorKind};

    #[test]
    fn test_parse() {
        #[derive(Debug)]
        struct Case<'a> {
            spec: &'a str,
            expected: Result<DimSize, ParseError>,
        }

        let cases = [
            Case {
                spec: "0=1",
                expected: Ok(DimSize {
                    input_name: None,
                    axis: 0,
                    dim: Dimension::fixed(1),
                }),
            },
            Case {
                spec: "input_ids.1=1..512",
                expected: Ok(DimSize {
                    input_name: Some("input_ids".to_string()),
                    axis: 1,
                    dim: Dimension::new(1, 512),
                }),
            },
            Case {
                spec: "\"input.name\".2=?",
                expected: Ok(DimSize {
                    input_name: Some("input.name".to_string()),
                    axis: 2,
                    dim: Dimension::dynamic(),
                }),
            },
            Case {
                spec: "foobar",
                expected: Err(ParseError::new(
                    "foobar",
                    ParseErrorKind::InvalidFormat {
                        message: "expected <axis>=<dim> but no '=' was found".into(),
                    },
                )),
            },
            Case {
                spec: "x.batch=2",
                expected: Err(ParseError::new("x.batch=2", ParseErrorKind::InvalidAxis)),
            },
            Case {
                spec: "a.b.0=2",
                expected: Err(ParseError::new("a.b.0=2", ParseErrorKind::InvalidName)),
            },
            Case {
                spec: "0=-1",
                expected: Err(ParseError::new("0=-1", ParseErrorKind::InvalidSize)),
            },
        ];

        cases.test_each(|Case { spec, expected }| {
            let dim_size = DimSize::parse(spec);
            assert_eq!(dim_size, *expected);
        })
    }

    #[test]
    fn test_matches() {
        let dim_size = DimSize::parse("0=1").unwrap();
        assert!(dim_size.matches("any_input_name", 0));
        assert!(!dim_size.matches("any_input_name", 1));

        let dim_size = DimSize::parse("input_name.0=1").unwrap();
        assert!(dim_size.matches("input_name", 0));
        assert!(!dim_size.matches("other_input_name", 0));
        assert!(!dim_size.matches("input_name", 1));
    }

    #[test]
    fn test_sort_dedup() {
        let mut dim_sizes: Vec<DimSize> = [
            DimSize::parse("0=1").unwrap(),
            DimSize::parse("0=2").unwrap(),
            DimSize::parse("specific_input.0=3").unwrap(),
        ]
        .into();

        DimSize::sort_dedup(&mut dim_sizes);

        assert_eq!(
            dim_sizes,
            [
                // Sizes with input names should be listed first.
                DimSize::parse("specific_input.0=3").unwrap(),
                // When there are duplicates, the last entry should be kept.
                DimSize::parse("0=2").unwrap(),
            ]
        );
    }

    #[test]
    fn test_apply() {
        let mut sizes = vec![
            DimSize::parse("0=4").unwrap(),
            DimSize::parse("image.0=1").unwrap(),
        ];
        DimSize::sort_dedup(&mut sizes);

        let shape: PartialShape = "[?,3]".parse().unwrap();
        assert_eq!(
            DimSize::apply(&sizes, "image", shape.clone()),
            PartialShape::fixed(&[1, 3])
        );
        assert_eq!(
            DimSize::apply(&sizes, "mask", shape),
            PartialShape::fixed(&[4, 3])
        );
        assert_eq!(
            DimSize::apply(&sizes, "image", PartialShape::Dynamic),
            PartialShape::Dynamic
        );
    }
}
