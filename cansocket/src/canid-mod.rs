/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * References:
 *    https://www.kernel.org/doc/html/latest/networking/can.html#how-to-use-socketcan
 *    linux/can.h canid_t definition
 *
*/
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cglue;

bitflags! {
    /// Flag bits carried in the upper part of a canid_t word.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct CanIdFlag: cglue::canid_t {
        /// EFF_FLAG indicate 29 bit extended format
        const EFF_FLAG = cglue::CAN_EFF_FLAG;
        /// RTR_FLAG remote transmission request flag
        const RTR_FLAG = cglue::CAN_RTR_FLAG;
        /// ERR_FLAG error message frame
        const ERR_FLAG = cglue::CAN_ERR_FLAG;
    }
}

/// 32 bit CAN identifier word with its EFF/RTR/ERR flags, kernel canid_t layout.
///
/// Any word is accepted verbatim, the type only gives names to the bits.
/// Equality and hash are those of the raw word.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct CanId(cglue::canid_t);

impl CanId {
    /// valid bits in standard frame id
    pub const SFF_MASK: u32 = cglue::CAN_SFF_MASK;
    /// valid bits in extended frame id
    pub const EFF_MASK: u32 = cglue::CAN_EFF_MASK;
    /// valid bits in error frame
    pub const ERR_MASK: u32 = cglue::CAN_ERR_MASK;

    pub const fn new(canid: u32) -> Self {
        CanId(canid)
    }

    pub fn get_raw(&self) -> u32 {
        self.0
    }

    fn is_set(&self, flag: CanIdFlag) -> bool {
        self.0 & flag.bits() != 0
    }

    fn set(&mut self, flag: CanIdFlag) -> &mut Self {
        self.0 |= flag.bits();
        self
    }

    fn clear(&mut self, flag: CanIdFlag) -> &mut Self {
        self.0 &= !flag.bits();
        self
    }

    pub fn is_extended(&self) -> bool {
        self.is_set(CanIdFlag::EFF_FLAG)
    }

    pub fn is_remote(&self) -> bool {
        self.is_set(CanIdFlag::RTR_FLAG)
    }

    pub fn is_error(&self) -> bool {
        self.is_set(CanIdFlag::ERR_FLAG)
    }

    pub fn set_extended(&mut self) -> &mut Self {
        self.set(CanIdFlag::EFF_FLAG)
    }

    pub fn set_remote(&mut self) -> &mut Self {
        self.set(CanIdFlag::RTR_FLAG)
    }

    pub fn set_error(&mut self) -> &mut Self {
        self.set(CanIdFlag::ERR_FLAG)
    }

    pub fn clear_extended(&mut self) -> &mut Self {
        self.clear(CanIdFlag::EFF_FLAG)
    }

    pub fn clear_remote(&mut self) -> &mut Self {
        self.clear(CanIdFlag::RTR_FLAG)
    }

    pub fn clear_error(&mut self) -> &mut Self {
        self.clear(CanIdFlag::ERR_FLAG)
    }

    /// 11 bit address, whatever the EFF flag says.
    pub fn standard_address(&self) -> u16 {
        (self.0 & Self::SFF_MASK) as u16
    }

    /// 29 bit address, whatever the EFF flag says.
    pub fn extended_address(&self) -> u32 {
        self.0 & Self::EFF_MASK
    }

    /// Error class bits, meaningful when ERR_FLAG is set.
    pub fn error_class(&self) -> u32 {
        self.0 & Self::ERR_MASK
    }

    pub fn flags(&self) -> CanIdFlag {
        CanIdFlag::from_bits_truncate(self.0)
    }
}

impl From<u32> for CanId {
    fn from(canid: u32) -> Self {
        CanId(canid)
    }
}

impl From<CanId> for u32 {
    fn from(canid: CanId) -> Self {
        canid.0
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        let address = if self.is_extended() {
            self.extended_address()
        } else {
            self.standard_address() as u32
        };
        let flags: Vec<&str> = self.flags().iter_names().map(|(name, _)| name).collect();
        write!(format, "CanId [canId={:#x} flags={:?}]", address, flags)
    }
}
