//! Textual operation chains.
//!
//! A recipe is a list of `name=args` strings, applied left to right:
//!
//! | Operation | Syntax | Handle call |
//! |---|---|---|
//! | Fit in box | `resize=800x0` | [`Thumbnail::resize`] |
//! | Crop to fill | `adaptive=300x300` | [`Thumbnail::adaptive_resize`] |
//! | Scale | `percent=50` | [`Thumbnail::resize_percent`] |
//! | Crop | `crop=10,20,300x200` | [`Thumbnail::crop`] |
//! | Center crop | `center=200` or `center=300x200` | [`Thumbnail::crop_from_center`] |
//! | Rotate | `rotate=90` | [`Thumbnail::rotate`] |
//! | Background | `background=#fff` or `background=#ffffff@50` | [`Thumbnail::background`] |
//! | Text | `text=12,0,-10,-10,#000,font.ttf,hello` | [`Thumbnail::draw_text`] |
//!
//! Everything after the sixth comma of `text=` is the text itself, so it may
//! contain commas.

use crate::imaging::{Color, Dimensions, ImageBackend, TextRequest, ThumbError, Thumbnail};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Operation '{0}' has no '=' (expected name=args)")]
    MissingArguments(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Invalid arguments for {op}: {reason}")]
    InvalidArgument { op: String, reason: String },
}

impl From<RecipeError> for ThumbError {
    fn from(err: RecipeError) -> Self {
        ThumbError::Argument(err.to_string())
    }
}

/// One step of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Adaptive { width: u32, height: u32 },
    /// Zero (or a negative input) is a no-op.
    Percent(u32),
    Crop { x: i64, y: i64, width: u32, height: u32 },
    Center { width: u32, height: Option<u32> },
    Rotate(f64),
    Background { color: Color, opacity: u32 },
    Text(TextRequest),
}

fn invalid(op: &str, reason: impl Into<String>) -> RecipeError {
    RecipeError::InvalidArgument {
        op: op.to_string(),
        reason: reason.into(),
    }
}

fn number<T: FromStr>(op: &str, what: &str, raw: &str) -> Result<T, RecipeError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(op, format!("{what} must be a number, got '{raw}'")))
}

/// Parse `WxH`.
fn size(op: &str, raw: &str) -> Result<(u32, u32), RecipeError> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid(op, format!("expected WIDTHxHEIGHT, got '{raw}'")))?;
    Ok((number(op, "width", w)?, number(op, "height", h)?))
}

fn color(op: &str, raw: &str) -> Result<Color, RecipeError> {
    raw.trim().parse().map_err(|e: String| invalid(op, e))
}

impl FromStr for Operation {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = s
            .split_once('=')
            .ok_or_else(|| RecipeError::MissingArguments(s.to_string()))?;
        let op = name.trim();

        match op {
            "resize" => {
                let (width, height) = size(op, args)?;
                Ok(Operation::Resize { width, height })
            }
            "adaptive" => {
                let (width, height) = size(op, args)?;
                Ok(Operation::Adaptive { width, height })
            }
            "percent" => {
                let percent: i64 = number(op, "percent", args)?;
                Ok(Operation::Percent(
                    u32::try_from(percent.max(0)).unwrap_or(u32::MAX),
                ))
            }
            "crop" => {
                let parts: Vec<&str> = args.splitn(3, ',').collect();
                let [x, y, wh] = parts.as_slice() else {
                    return Err(invalid(op, "expected X,Y,WIDTHxHEIGHT"));
                };
                let (width, height) = size(op, wh)?;
                Ok(Operation::Crop {
                    x: number(op, "x", x)?,
                    y: number(op, "y", y)?,
                    width,
                    height,
                })
            }
            "center" => {
                if args.contains(['x', 'X']) {
                    let (width, height) = size(op, args)?;
                    Ok(Operation::Center {
                        width,
                        height: Some(height),
                    })
                } else {
                    Ok(Operation::Center {
                        width: number(op, "width", args)?,
                        height: None,
                    })
                }
            }
            "rotate" => {
                let degrees: f64 = number(op, "degrees", args)?;
                if !degrees.is_finite() {
                    return Err(invalid(op, "degrees must be finite"));
                }
                Ok(Operation::Rotate(degrees))
            }
            "background" => {
                let (hex, opacity) = match args.split_once('@') {
                    Some((hex, opacity)) => (hex, number(op, "opacity", opacity)?),
                    None => (args, 100),
                };
                Ok(Operation::Background {
                    color: color(op, hex)?,
                    opacity,
                })
            }
            "text" => {
                let parts: Vec<&str> = args.splitn(7, ',').collect();
                let [size_pt, angle, x, y, hex, font, text] = parts.as_slice() else {
                    return Err(invalid(op, "expected SIZE,ANGLE,X,Y,COLOR,FONT,TEXT"));
                };
                Ok(Operation::Text(TextRequest {
                    size: number(op, "size", size_pt)?,
                    angle: number(op, "angle", angle)?,
                    x: number(op, "x", x)?,
                    y: number(op, "y", y)?,
                    color: color(op, hex)?,
                    font: PathBuf::from(font.trim()),
                    text: (*text).to_string(),
                }))
            }
            other => Err(RecipeError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Resize { width, height } => write!(f, "resize={width}x{height}"),
            Operation::Adaptive { width, height } => write!(f, "adaptive={width}x{height}"),
            Operation::Percent(p) => write!(f, "percent={p}"),
            Operation::Crop {
                x,
                y,
                width,
                height,
            } => write!(f, "crop={x},{y},{width}x{height}"),
            Operation::Center {
                width,
                height: None,
            } => write!(f, "center={width}"),
            Operation::Center {
                width,
                height: Some(height),
            } => write!(f, "center={width}x{height}"),
            Operation::Rotate(degrees) => write!(f, "rotate={degrees}"),
            Operation::Background { color, opacity } => {
                write!(f, "background={color}@{opacity}")
            }
            Operation::Text(t) => write!(
                f,
                "text={},{},{},{},{},{},{}",
                t.size,
                t.angle,
                t.x,
                t.y,
                t.color,
                t.font.display(),
                t.text
            ),
        }
    }
}

impl Operation {
    /// Run this operation against a handle.
    pub fn apply<B: ImageBackend>(&self, thumb: &mut Thumbnail<B>) -> Result<(), ThumbError> {
        match self {
            Operation::Resize { width, height } => thumb.resize(*width, *height)?,
            Operation::Adaptive { width, height } => thumb.adaptive_resize(*width, *height)?,
            Operation::Percent(p) => thumb.resize_percent(*p)?,
            Operation::Crop {
                x,
                y,
                width,
                height,
            } => thumb.crop(*x, *y, *width, *height)?,
            Operation::Center { width, height } => thumb.crop_from_center(*width, *height)?,
            Operation::Rotate(degrees) => thumb.rotate(*degrees)?,
            Operation::Background { color, opacity } => thumb.background(*color, *opacity)?,
            Operation::Text(request) => thumb.draw_text(request)?,
        };
        Ok(())
    }
}

/// Parse every entry, stopping at the first bad one.
pub fn parse_recipe<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Operation>, RecipeError> {
    specs.iter().map(|s| s.as_ref().parse()).collect()
}

/// Geometry before and after one applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub operation: String,
    pub before: Dimensions,
    pub after: Dimensions,
}

/// Apply `operations` in order, recording each step's geometry.
pub fn apply_recipe<B: ImageBackend>(
    thumb: &mut Thumbnail<B>,
    operations: &[Operation],
) -> Result<Vec<Step>, ThumbError> {
    let mut steps = Vec::with_capacity(operations.len());
    for op in operations {
        let before = thumb.dimensions();
        op.apply(thumb)?;
        let after = thumb.dimensions();
        debug!(operation = %op, %before, %after, "applied");
        steps.push(Step {
            operation: op.to_string(),
            before,
            after,
        });
    }
    Ok(steps)
}
