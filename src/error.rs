use image::ImageError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug)]
pub enum LprErrorKind {
    /// zero dynamic range, empty image or nothing to build a candidate from
    InputDegenerate(String),
    /// contours were found but none of them carries the plate color
    NoCandidateFound,
    SegmentationFailure(String),
    MissingCredential(&'static str),
    ImageError(ImageError),
    IOError(IOError),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self(LprErrorKind::InputDegenerate(reason.into()))
    }

    pub(crate) fn segmentation(reason: impl Into<String>) -> Self {
        Self(LprErrorKind::SegmentationFailure(reason.into()))
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self.0, LprErrorKind::InputDegenerate(_))
    }
}

impl<T> From<T> for LprError
where T: Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            LprErrorKind::InputDegenerate(reason) => write!(f, "degenerate input: {}", reason),
            LprErrorKind::NoCandidateFound => write!(f, "no plate candidate found"),
            LprErrorKind::SegmentationFailure(reason) => write!(f, "segmentation failed: {}", reason),
            LprErrorKind::MissingCredential(name) => write!(f, "missing credential {}", name),
            LprErrorKind::ImageError(e) => e.fmt(f),
            LprErrorKind::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            LprErrorKind::ImageError(e) => Some(e),
            LprErrorKind::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IOError> for LprErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<ImageError> for LprErrorKind {
    fn from(e: ImageError) -> Self {
        Self::ImageError(e)
    }
}
