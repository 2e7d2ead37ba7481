/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Local argument checks never reach the kernel, everything else is a failed syscall.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanErrorKind {
    InvalidArgument,
    Io,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanError {
    uid: String,
    info: String,
    kind: CanErrorKind,
    errno: Option<i32>,
}

impl Clone for CanError {
    fn clone(&self) -> CanError {
        CanError {
            uid: self.uid.clone(),
            info: self.info.clone(),
            kind: self.kind,
            errno: self.errno,
        }
    }
}

pub trait MakeError<T> {
    fn make(uid: &str, msg: T) -> CanError;
}

impl MakeError<&str> for CanError {
    fn make(uid: &str, msg: &str) -> CanError {
        CanError { uid: uid.to_string(), info: msg.to_string(), kind: CanErrorKind::Io, errno: None }
    }
}

impl MakeError<String> for CanError {
    fn make(uid: &str, msg: String) -> CanError {
        CanError { uid: uid.to_string(), info: msg, kind: CanErrorKind::Io, errno: None }
    }
}

impl CanError {
    /// Builds an I/O class error without errno, e.g. a short write.
    pub fn new<T>(uid: &str, msg: T) -> CanError
    where
        CanError: MakeError<T>,
    {
        Self::make(uid, msg)
    }

    /// Builds a configuration error detected before any syscall.
    pub fn invalid<T>(uid: &str, msg: T) -> CanError
    where
        CanError: MakeError<T>,
    {
        let mut error = Self::make(uid, msg);
        error.kind = CanErrorKind::InvalidArgument;
        error
    }

    /// Captures errno of the syscall that just failed.
    ///
    /// Must be called right after the failing call, before anything else
    /// touches errno (logging included).
    pub fn from_errno(uid: &str) -> CanError {
        CanError::from_io(uid, io::Error::last_os_error())
    }

    pub fn from_io(uid: &str, error: io::Error) -> CanError {
        CanError {
            uid: uid.to_string(),
            errno: error.raw_os_error(),
            info: error.to_string(),
            kind: CanErrorKind::Io,
        }
    }

    #[must_use]
    pub fn get_uid(&self) -> String {
        self.uid.clone()
    }
    #[must_use]
    pub fn get_info(&self) -> String {
        self.info.clone()
    }
    #[must_use]
    pub fn get_kind(&self) -> CanErrorKind {
        self.kind
    }
    #[must_use]
    pub fn get_errno(&self) -> Option<i32> {
        self.errno
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == CanErrorKind::InvalidArgument
    }
}

impl fmt::Display for CanError {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        write!(format, "uid:{} info:{}", self.uid, self.info)
    }
}

impl fmt::Debug for CanError {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        write!(format, "uid:{} info:{}", self.uid, self.info)
    }
}

impl std::error::Error for CanError {}

impl From<CanError> for io::Error {
    fn from(error: CanError) -> Self {
        match (error.kind, error.errno) {
            (CanErrorKind::Io, Some(errno)) => io::Error::from_raw_os_error(errno),
            (CanErrorKind::InvalidArgument, _) => io::Error::new(io::ErrorKind::InvalidInput, error),
            (CanErrorKind::Io, None) => io::Error::new(io::ErrorKind::Other, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_error_keeps_uid_and_kind() {
        let error = CanError::invalid("can-frame-len", format!("len={} max=8", 9));
        assert!(error.is_invalid());
        assert_eq!(error.get_uid(), "can-frame-len");
        assert_eq!(error.get_errno(), None);
        assert_eq!(error.to_string(), "uid:can-frame-len info:len=9 max=8");
    }

    #[test]
    fn io_error_carries_errno() {
        let error = CanError::from_io("fail-socketcan-bind", io::Error::from_raw_os_error(libc::ENODEV));
        assert_eq!(error.get_kind(), CanErrorKind::Io);
        assert_eq!(error.get_errno(), Some(libc::ENODEV));

        let back: io::Error = error.into();
        assert_eq!(back.raw_os_error(), Some(libc::ENODEV));
    }

    #[test]
    fn invalid_maps_to_invalid_input() {
        let back: io::Error = CanError::invalid("can-ifname-invalid", "too long").into();
        assert_eq!(back.kind(), io::ErrorKind::InvalidInput);
    }
}
