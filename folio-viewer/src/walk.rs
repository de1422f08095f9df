//! Navigation scripts for `folio-viewer walk`.
//!
//! A script is a list of steps, one per argument:
//!
//! | Step            | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `press:<item>`  | Press the item with that id               |
//! | `at:<x>,<y>`    | Press whatever is topmost at the point    |
//! | `goto:<page>`   | Navigate straight to a page               |
//! | `back`          | Return to the previous page               |

use std::fmt;
use std::str::FromStr;

use folio_core::{ItemId, Offset, PageId};
use thiserror::Error;

/// One step of a navigation script.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkStep {
    /// Press an item by id.
    Press(ItemId),
    /// Press at a point in page coordinates.
    PressAt(Offset),
    /// Navigate to a page.
    Goto(PageId),
    /// Go back.
    Back,
}

/// A step that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStepError {
    /// Unknown step keyword.
    #[error("unknown step '{0}' (expected press:<item>, at:<x>,<y>, goto:<page> or back)")]
    UnknownStep(String),

    /// A step keyword with nothing after the colon.
    #[error("step '{0}' needs an argument")]
    MissingArgument(String),

    /// `at:` with coordinates that are not two numbers.
    #[error("invalid point '{0}', expected <x>,<y>")]
    InvalidPoint(String),
}

impl FromStr for WalkStep {
    type Err = ParseStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "back" {
            return Ok(Self::Back);
        }
        let (keyword, arg) = s
            .split_once(':')
            .ok_or_else(|| ParseStepError::UnknownStep(s.to_string()))?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(ParseStepError::MissingArgument(keyword.to_string()));
        }
        match keyword {
            "press" => Ok(Self::Press(ItemId::from(arg))),
            "goto" => Ok(Self::Goto(PageId::from(arg))),
            "at" => parse_point(arg).map(Self::PressAt),
            _ => Err(ParseStepError::UnknownStep(s.to_string())),
        }
    }
}

fn parse_point(arg: &str) -> Result<Offset, ParseStepError> {
    let invalid = || ParseStepError::InvalidPoint(arg.to_string());
    let (x, y) = arg.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Offset::new(x, y))
}

impl fmt::Display for WalkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press(item) => write!(f, "press:{item}"),
            Self::PressAt(point) => write!(f, "at:{},{}", point.dx, point.dy),
            Self::Goto(page) => write!(f, "goto:{page}"),
            Self::Back => f.write_str("back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!("back".parse(), Ok(WalkStep::Back));
        assert_eq!(
            "press:more".parse(),
            Ok(WalkStep::Press(ItemId::from("more")))
        );
        assert_eq!(
            "goto: about ".parse(),
            Ok(WalkStep::Goto(PageId::from("about")))
        );
        assert_eq!(
            "at:20, 40.5".parse(),
            Ok(WalkStep::PressAt(Offset::new(20.0, 40.5)))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "jump:x".parse::<WalkStep>(),
            Err(ParseStepError::UnknownStep("jump:x".to_string()))
        );
        assert_eq!(
            "forward".parse::<WalkStep>(),
            Err(ParseStepError::UnknownStep("forward".to_string()))
        );
        assert_eq!(
            "press:".parse::<WalkStep>(),
            Err(ParseStepError::MissingArgument("press".to_string()))
        );
        assert!(matches!(
            "at:1".parse::<WalkStep>(),
            Err(ParseStepError::InvalidPoint(_))
        ));
        assert!(matches!(
            "at:NaN,2".parse::<WalkStep>(),
            Err(ParseStepError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for step in [
            WalkStep::Back,
            WalkStep::Press(ItemId::from("b1")),
            WalkStep::Goto(PageId::from("p2")),
            WalkStep::PressAt(Offset::new(1.5, 2.0)),
        ] {
            assert_eq!(step.to_string().parse(), Ok(step));
        }
    }
}
