/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
*/
use std::fmt;

use crate::prelude::*;

/// CAN frame payload max length (CAN_MAX_DLEN)
pub const CAN_MAX_DLEN: usize = 8;
/// sizeof(struct can_frame)
pub const CAN_FRAME_LEN: usize = 16;

const CAN_ID_OFFSET: usize = 0;
const CAN_LEN_OFFSET: usize = 4;
const CAN_DATA_OFFSET: usize = 8;

/// Classical CAN frame structure (aka CAN 2.0B) as the kernel reads/writes it
/// canid:     CAN ID of the frame and CAN_*_FLAG flags, native endian (4 bytes)
/// @len:      CAN frame payload length in byte (0 .. 8)
/// @__pad:    padding
/// @__res0:   reserved / padding
/// @len8_dlc: optional DLC value (9 .. 15), always written as 0
/// @data:     CAN frame payload (up to 8 byte, 8 aligned)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CanFrameRaw([u8; CAN_FRAME_LEN]);

impl CanFrameRaw {
    pub fn new(canid: u32, data: &[u8]) -> Result<Self, CanError> {
        if data.len() > CAN_MAX_DLEN {
            return Err(CanError::invalid(
                "can-frame-len",
                format!("len={} max={}", data.len(), CAN_MAX_DLEN),
            ));
        }
        Ok(CanFrameRaw::pack(canid, data))
    }

    // caller guarantees data.len() <= CAN_MAX_DLEN
    fn pack(canid: u32, data: &[u8]) -> Self {
        let mut buffer = [0u8; CAN_FRAME_LEN];
        buffer[CAN_ID_OFFSET..CAN_LEN_OFFSET].copy_from_slice(&canid.to_ne_bytes());
        buffer[CAN_LEN_OFFSET] = data.len() as u8;
        buffer[CAN_DATA_OFFSET..CAN_DATA_OFFSET + data.len()].copy_from_slice(data);
        CanFrameRaw(buffer)
    }

    pub fn from_bytes(buffer: [u8; CAN_FRAME_LEN]) -> Self {
        CanFrameRaw(buffer)
    }

    pub fn as_bytes(&self) -> &[u8; CAN_FRAME_LEN] {
        &self.0
    }

    pub fn get_id(&self) -> u32 {
        let mut canid = [0u8; 4];
        canid.copy_from_slice(&self.0[CAN_ID_OFFSET..CAN_LEN_OFFSET]);
        u32::from_ne_bytes(canid)
    }

    /// Length field as written by the sender, not clamped.
    pub fn get_len(&self) -> u8 {
        self.0[CAN_LEN_OFFSET]
    }

    /// Payload truncated to min(len, 8).
    pub fn get_data(&self) -> &[u8] {
        let len = (self.get_len() as usize).min(CAN_MAX_DLEN);
        &self.0[CAN_DATA_OFFSET..CAN_DATA_OFFSET + len]
    }
}

/// One classic CAN frame bound to the interface it came from or goes to.
#[derive(Clone, Debug)]
pub struct CanFrame {
    iface: CanInterface,
    canid: CanId,
    data: Vec<u8>,
}

impl CanFrame {
    pub fn new(iface: CanInterface, canid: CanId, data: &[u8]) -> Result<Self, CanError> {
        if data.len() > CAN_MAX_DLEN {
            return Err(CanError::invalid(
                "can-frame-len",
                format!("len={} max={}", data.len(), CAN_MAX_DLEN),
            ));
        }
        Ok(CanFrame { iface, canid, data: data.to_vec() })
    }

    /// Receive path constructor, the length is still checked.
    pub fn from_raw(ifindex: i32, canid: u32, data: &[u8]) -> Result<Self, CanError> {
        CanFrame::new(CanInterface::from_index(ifindex), CanId::new(canid), data)
    }

    pub fn get_id(&self) -> CanId {
        self.canid
    }

    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    pub fn get_len(&self) -> u8 {
        self.data.len() as u8
    }

    pub fn get_iface(&self) -> &CanInterface {
        &self.iface
    }

    pub fn get_iface_mut(&mut self) -> &mut CanInterface {
        &mut self.iface
    }

    pub fn to_raw(&self) -> CanFrameRaw {
        // data length checked at construction time
        CanFrameRaw::pack(self.canid.get_raw(), &self.data)
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        write!(format, "CanFrame [canIf={}, canId={}, data={:02X?}]", self.iface, self.canid, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_limit_is_eight_bytes() {
        assert!(CanFrame::new(CAN_ALL_INTERFACES, CanId::new(0x5), &[0, 0, 0, 0, 0, 0, 0, 1]).is_ok());

        let error = CanFrame::new(CAN_ALL_INTERFACES, CanId::new(0x5), &[0; 9]).err().unwrap();
        assert!(error.is_invalid());
        assert_eq!(error.get_uid(), "can-frame-len");

        assert!(CanFrame::from_raw(1, 0x5, &[0; 9]).err().unwrap().is_invalid());
        assert!(CanFrameRaw::new(0x5, &[0; 9]).err().unwrap().is_invalid());
    }

    #[test]
    fn empty_payload_is_valid() {
        let frame = CanFrame::new(CAN_ALL_INTERFACES, *CanId::new(0x12).set_remote(), &[]).unwrap();
        assert_eq!(frame.get_len(), 0);
        assert_eq!(frame.to_raw().get_data(), &[] as &[u8]);
    }

    #[test]
    fn raw_layout_matches_struct_can_frame() {
        assert_eq!(CAN_FRAME_LEN, std::mem::size_of::<libc::can_frame>());

        let canid = *CanId::new(0x30001).set_extended();
        let frame = CanFrame::from_raw(4, canid.get_raw(), &[0x00, 0x91]).unwrap();
        let raw = frame.to_raw();
        let bytes = raw.as_bytes();

        assert_eq!(&bytes[0..4], &0x8003_0001u32.to_ne_bytes());
        assert_eq!(bytes[4], 2);
        assert_eq!(&bytes[5..8], &[0, 0, 0]);
        assert_eq!(&bytes[8..10], &[0x00, 0x91]);
        assert!(bytes[10..].iter().all(|byte| *byte == 0));
        assert_eq!(raw, CanFrameRaw::new(canid.get_raw(), &[0x00, 0x91]).unwrap());
    }

    #[test]
    fn received_len_is_clamped() {
        let mut bytes = *CanFrameRaw::new(0x7FF, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().as_bytes();
        bytes[4] = 15;
        let raw = CanFrameRaw::from_bytes(bytes);
        assert_eq!(raw.get_len(), 15);
        assert_eq!(raw.get_data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(raw.get_id(), 0x7FF);
    }

    #[test]
    fn clone_is_deep() {
        let frame = CanFrame::new(CanInterface::from_index(2), CanId::new(0x5), &[1, 2]).unwrap();
        let copy = frame.clone();
        assert_eq!(copy.get_data(), frame.get_data());
        assert_eq!(copy.get_id(), frame.get_id());
        assert_ne!(copy.get_data().as_ptr(), frame.get_data().as_ptr());
    }

    #[test]
    fn display_lists_fields() {
        let frame = CanFrame::new(CanInterface::from_index(2), CanId::new(0x5), &[0x0a, 0xff]).unwrap();
        assert_eq!(
            frame.to_string(),
            "CanFrame [canIf=CanInterface [ifIndex=2, ifName=null], canId=CanId [canId=0x5 flags=[]], data=[0A, FF]]"
        );
    }
}
