//! Boundary to the remote text recognition service.
//!
//! The locator only hands over encoded plate bytes, it never looks into
//! what comes back. Credentials are read from the environment.

use image::RgbImage;

use std::env;
use std::error::Error;

use crate::error::{ LprError, LprErrorKind };
use crate::utils;

pub const APP_ID_VAR: &str = "LPR_APP_ID";
pub const API_KEY_VAR: &str = "LPR_API_KEY";
pub const SECRET_KEY_VAR: &str = "LPR_SECRET_KEY";

/// Application id and key pair of the recognition service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, LprError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any key/value source, empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, LprError> {
        let get = |name: &'static str| {
            lookup(name).filter(|v| !v.is_empty()).ok_or(LprErrorKind::MissingCredential(name))
        };
        Ok(Self {
            app_id: get(APP_ID_VAR)?,
            api_key: get(API_KEY_VAR)?,
            secret_key: get(SECRET_KEY_VAR)?,
        })
    }
}

/// Whatever the service recognized, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionResult {
    pub words: Vec<String>,
    pub log_id: Option<u64>,
}

/// General text recognition over encoded image bytes.
pub trait TextRecognizer {
    fn basic_general(&self, image: &[u8]) -> Result<RecognitionResult, Box<dyn Error + Send + Sync>>;
}

/// Encode the segmented plate and send it to `recognizer`.
pub fn recognize_plate<R: TextRecognizer + ?Sized>(recognizer: &R, plate: &RgbImage) -> Result<RecognitionResult, Box<dyn Error + Send + Sync>> {
    let bytes = utils::encode_png(plate)?;
    recognizer.basic_general(&bytes)
}
