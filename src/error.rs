// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error types for sketch, window and cascade operations

use std::fmt;

/// ErrorKind is all kinds of Error of sliding-quantiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A wrapped or heapified region carries a malformed or incompatible preamble.
    Format,
    /// A storage growth request could not be satisfied.
    Capacity,
    /// A query was issued against a sketch or summary that has seen no data.
    EmptyState,
    /// An argument or configuration value is invalid.
    Validation,
    /// The derived level layout disagrees with the item count.
    ///
    /// This always indicates a bug and is never recoverable.
    InternalConsistency,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::Format => "Format",
            ErrorKind::Capacity => "Capacity",
            ErrorKind::EmptyState => "EmptyState",
            ErrorKind::Validation => "Validation",
            ErrorKind::InternalConsistency => "InternalConsistency",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all sliding-quantiles functions.
///
/// # Examples
///
/// ```
/// # use sliding_quantiles::error::Error;
/// # use sliding_quantiles::error::ErrorKind;
/// let err = Error::new(ErrorKind::Validation, "bad input");
/// assert_eq!(err.kind(), ErrorKind::Validation);
/// assert_eq!(err.message(), "bad input");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

// Convenient constructors used within the crate.
impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, msg)
    }

    pub(crate) fn capacity(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Capacity, msg)
    }

    pub(crate) fn empty_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyState, msg)
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalConsistency, msg)
    }

    pub(crate) fn insufficient_data(msg: impl fmt::Display) -> Self {
        Self::format(format!("insufficient data: {msg}"))
    }

    pub(crate) fn invalid_family(expected: u8, actual: u8, name: &'static str) -> Self {
        Self::format(format!(
            "invalid family: expected {expected} ({name}), got {actual}"
        ))
    }

    pub(crate) fn unsupported_serial_version(expected: u8, actual: u8) -> Self {
        Self::format(format!(
            "unsupported serial version: expected {expected}, got {actual}"
        ))
    }

    pub(crate) fn invalid_preamble_longs(expected: u8, actual: u8) -> Self {
        Self::format(format!(
            "invalid preamble longs: expected {expected}, got {actual}"
        ))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}: {v}")?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_context() {
        let err = Error::new(ErrorKind::Validation, "rank must be in [0.0, 1.0]");
        assert_eq!(err.to_string(), "Validation => rank must be in [0.0, 1.0]");
    }

    #[test]
    fn test_display_with_context() {
        let err = Error::capacity("region request refused")
            .with_context("requested", 4128)
            .with_context("limit", 4096);
        assert_eq!(
            err.to_string(),
            "Capacity, context: { requested: 4128, limit: 4096 } => region request refused"
        );
    }

    #[test]
    fn test_family_message() {
        let err = Error::invalid_family(8, 15, "QUANTILES");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.message(), "invalid family: expected 8 (QUANTILES), got 15");
    }
}
