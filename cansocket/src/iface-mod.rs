/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
*/
use std::fmt;

use super::cglue;
use crate::prelude::*;

/// Kernel interface index plus its name when known.
///
/// The name is only informative: two values with the same index but one of them
/// still unresolved are not equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanInterface {
    ifindex: i32,
    ifname: Option<String>,
}

/// Index 0, bind target meaning "receive from every CAN interface".
pub const CAN_ALL_INTERFACES: CanInterface = CanInterface::ALL;

impl CanInterface {
    pub const ALL: CanInterface = CanInterface { ifindex: 0, ifname: None };

    /// SIOCGIFINDEX lookup of `ifname` over the socket address family.
    pub fn from_name(sock: &CanSocket, ifname: &str) -> Result<Self, CanError> {
        let ifindex = cglue::ifname_to_index(sock.as_rawfd(), ifname)?;
        log::debug!("can iface:{} index:{}", ifname, ifindex);
        Ok(CanInterface { ifindex, ifname: Some(ifname.to_owned()) })
    }

    /// Trusted index, typically the source of a received frame.
    pub fn from_index(ifindex: i32) -> Self {
        CanInterface { ifindex, ifname: None }
    }

    pub fn get_index(&self) -> i32 {
        self.ifindex
    }

    pub fn get_name(&self) -> Option<&str> {
        self.ifname.as_deref()
    }

    pub fn is_all(&self) -> bool {
        self.ifindex == 0
    }

    /// Best effort SIOCGIFNAME lookup, done once then cached. A failing lookup
    /// leaves the name unknown and is retried on next call.
    pub fn resolve_name(&mut self, sock: &CanSocket) -> Option<&str> {
        if self.ifname.is_none() && !self.is_all() {
            match cglue::ifindex_to_name(sock.as_rawfd(), self.ifindex) {
                Ok(ifname) => self.ifname = Some(ifname),
                Err(error) => log::debug!("can iface:{} name lookup ignored {}", self.ifindex, error),
            }
        }
        self.ifname.as_deref()
    }
}

impl fmt::Display for CanInterface {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        match &self.ifname {
            Some(ifname) => write!(format, "CanInterface [ifIndex={}, ifName={}]", self.ifindex, ifname),
            None => write!(format, "CanInterface [ifIndex={}, ifName=null]", self.ifindex),
        }
    }
}

pub trait CanIFaceFrom<T> {
    fn map_can_iface(sock: &CanSocket, iface: T) -> Result<CanInterface, CanError>;
}

impl CanIFaceFrom<&str> for CanInterface {
    fn map_can_iface(sock: &CanSocket, iface: &str) -> Result<CanInterface, CanError> {
        CanInterface::from_name(sock, iface)
    }
}

impl CanIFaceFrom<i32> for CanInterface {
    fn map_can_iface(_sock: &CanSocket, iface: i32) -> Result<CanInterface, CanError> {
        if iface < 0 {
            return Err(CanError::invalid("can-iface-index", format!("index={}", iface)));
        }
        Ok(CanInterface::from_index(iface))
    }
}

impl CanIFaceFrom<CanInterface> for CanInterface {
    fn map_can_iface(_sock: &CanSocket, iface: CanInterface) -> Result<CanInterface, CanError> {
        Ok(iface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_index_zero_without_name() {
        assert_eq!(CAN_ALL_INTERFACES.get_index(), 0);
        assert_eq!(CAN_ALL_INTERFACES.get_name(), None);
        assert!(CAN_ALL_INTERFACES.is_all());
        assert_eq!(CanInterface::from_index(0), CAN_ALL_INTERFACES);
    }

    #[test]
    fn equality_includes_name() {
        let named = CanInterface { ifindex: 3, ifname: Some("vcan0".to_owned()) };
        let unnamed = CanInterface::from_index(3);
        assert_ne!(named, unnamed);
        assert_eq!(named, named.clone());
        assert_ne!(unnamed, CanInterface::from_index(4));
    }

    #[test]
    fn display_shows_missing_name() {
        assert_eq!(CanInterface::from_index(7).to_string(), "CanInterface [ifIndex=7, ifName=null]");
        let named = CanInterface { ifindex: 2, ifname: Some("can0".to_owned()) };
        assert_eq!(named.to_string(), "CanInterface [ifIndex=2, ifName=can0]");
    }
}
