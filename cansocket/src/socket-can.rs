/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * References:
 *    https://www.kernel.org/doc/html/latest/networking/can.html#raw-protocol-sockets-with-can-filters-sock-raw
 *    https://www.kernel.org/doc/html/latest/networking/can.html#broadcast-manager-protocol-sockets-sock-dgram
 *
*/
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::raw::c_int;

use super::cglue;
use crate::prelude::*;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanSocketMode {
    RAW,
    BCM,
}

impl CanSocketMode {
    /// (socket type, protocol) pair given to socket(PF_CAN, ...)
    pub fn as_sock_params(&self) -> (c_int, c_int) {
        match self {
            CanSocketMode::RAW => (libc::SOCK_RAW, libc::CAN_RAW),
            CanSocketMode::BCM => (libc::SOCK_DGRAM, libc::CAN_BCM),
        }
    }
}

/// Options of the SOL_CAN_RAW level, see [`CanConstants`] for their values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanRawOption {
    Filter,
    ErrFilter,
    Loopback,
    RecvOwnMsgs,
    FdFrames,
}

impl CanRawOption {
    pub fn as_raw(&self) -> i32 {
        let consts = can_constants();
        match self {
            CanRawOption::Filter => consts.raw_filter,
            CanRawOption::ErrFilter => consts.raw_err_filter,
            CanRawOption::Loopback => consts.raw_loopback,
            CanRawOption::RecvOwnMsgs => consts.raw_recv_own_msgs,
            CanRawOption::FdFrames => consts.raw_fd_frames,
        }
    }
}

// the kernel keeps the raw int and treats any non-zero value as on
fn option_enabled(value: i32) -> bool {
    value != 0
}

/// MTU of a classic CAN interface, sizeof(struct can_frame).
pub fn can_mtu() -> i32 {
    can_constants().can_mtu
}

/// MTU of a CAN-FD capable interface, sizeof(struct canfd_frame).
pub fn canfd_mtu() -> i32 {
    can_constants().canfd_mtu
}

/// One PF_CAN socket descriptor.
///
/// Calls map one to one onto syscalls: no buffering, no retry, no lock. `recv`
/// blocks until a frame shows up; callers wanting bounded waits poll the raw fd.
/// The descriptor is released by [`CanSocket::close`] or on drop.
#[derive(Debug)]
pub struct CanSocket {
    sockfd: OwnedFd,
    mode: CanSocketMode,
    bound: Option<CanInterface>,
}

impl CanSocket {
    pub fn open(mode: CanSocketMode) -> Result<Self, CanError> {
        let (socktype, protocol) = mode.as_sock_params();
        let sockfd = cglue::open_socket(socktype, protocol)?;
        log::debug!("socketcan open mode:{:?} fd:{}", mode, sockfd);

        Ok(CanSocket {
            sockfd: unsafe { OwnedFd::from_raw_fd(sockfd) },
            mode,
            bound: None,
        })
    }

    /// Opens a RAW socket already bound to `candev` (name, index or [`CanInterface`]).
    pub fn open_raw<T>(candev: T) -> Result<Self, CanError>
    where
        CanInterface: CanIFaceFrom<T>,
    {
        let mut sockcan = CanSocket::open(CanSocketMode::RAW)?;
        let iface = CanInterface::map_can_iface(&sockcan, candev)?;
        sockcan.bind(iface)?;
        Ok(sockcan)
    }

    /// Binds to `iface`, index 0 meaning every interface. Rebinding is allowed,
    /// the last target is the one remembered.
    pub fn bind(&mut self, iface: CanInterface) -> Result<&mut Self, CanError> {
        cglue::bind_socket(self.as_rawfd(), iface.get_index())?;
        log::debug!("socketcan fd:{} bound to {}", self.as_rawfd(), iface);
        self.bound = Some(iface);
        Ok(self)
    }

    pub fn send(&self, frame: &CanFrame) -> Result<(), CanError> {
        let raw = frame.to_raw();
        let count = cglue::send_to(self.as_rawfd(), frame.get_iface().get_index(), raw.as_bytes())?;
        if count != CAN_FRAME_LEN {
            log::warn!("socketcan fd:{} partial write {}/{}", self.as_rawfd(), count, CAN_FRAME_LEN);
            return Err(CanError::new(
                "can-send-partial",
                format!("send partial frame {}/{}", count, CAN_FRAME_LEN),
            ));
        }
        log::trace!("socketcan fd:{} sent {}", self.as_rawfd(), frame);
        Ok(())
    }

    pub fn recv(&self) -> Result<CanFrame, CanError> {
        let mut buffer = [0u8; CAN_FRAME_LEN];
        let (count, ifindex) = cglue::recv_from(self.as_rawfd(), &mut buffer)?;
        if count != CAN_FRAME_LEN {
            log::warn!("socketcan fd:{} unexpected read len:{}", self.as_rawfd(), count);
            return Err(CanError::new(
                "can-invalid-frame",
                format!("invalid length of received frame len={}", count),
            ));
        }

        let raw = CanFrameRaw::from_bytes(buffer);
        let frame = CanFrame::from_raw(ifindex, raw.get_id(), raw.get_data())?;
        log::trace!("socketcan fd:{} received {}", self.as_rawfd(), frame);
        Ok(frame)
    }

    /// SIOCGIFMTU of `ifname`, compare with [`can_mtu`] and [`canfd_mtu`].
    pub fn get_mtu(&self, ifname: &str) -> Result<i32, CanError> {
        let mtu = cglue::ifname_mtu(self.as_rawfd(), ifname)?;
        log::debug!("socketcan iface:{} mtu:{}", ifname, mtu);
        Ok(mtu)
    }

    fn check_raw(&self) -> Result<(), CanError> {
        match self.mode {
            CanSocketMode::RAW => Ok(()),
            _ => Err(CanError::invalid("invalid-socketcan-mod", "not a RAW socket can")),
        }
    }

    pub fn set_raw_option(&mut self, option: CanRawOption, value: i32) -> Result<&mut Self, CanError> {
        self.check_raw()?;
        cglue::set_raw_sockopt(self.as_rawfd(), option.as_raw(), value)?;
        Ok(self)
    }

    pub fn get_raw_option(&self, option: CanRawOption) -> Result<i32, CanError> {
        self.check_raw()?;
        cglue::get_raw_sockopt(self.as_rawfd(), option.as_raw())
    }

    /// Local echo of sent frames to other sockets of this host (kernel default on).
    pub fn set_loopback(&mut self, loopback: bool) -> Result<&mut Self, CanError> {
        self.set_raw_option(CanRawOption::Loopback, loopback as i32)
    }

    pub fn get_loopback(&self) -> Result<bool, CanError> {
        Ok(option_enabled(self.get_raw_option(CanRawOption::Loopback)?))
    }

    /// Echo of sent frames to this very socket (kernel default off).
    pub fn set_recv_own(&mut self, recv_own: bool) -> Result<&mut Self, CanError> {
        self.set_raw_option(CanRawOption::RecvOwnMsgs, recv_own as i32)
    }

    pub fn get_recv_own(&self) -> Result<bool, CanError> {
        Ok(option_enabled(self.get_raw_option(CanRawOption::RecvOwnMsgs)?))
    }

    pub fn get_mode(&self) -> CanSocketMode {
        self.mode
    }

    pub fn get_bound(&self) -> Option<&CanInterface> {
        self.bound.as_ref()
    }

    pub fn as_rawfd(&self) -> RawFd {
        self.sockfd.as_raw_fd()
    }

    /// Releases the descriptor and reports a failing close(2). Consuming the
    /// socket makes a second close impossible.
    pub fn close(self) -> Result<(), CanError> {
        let sockfd = self.sockfd.into_raw_fd();
        log::debug!("socketcan close fd:{}", sockfd);
        cglue::close_socket(sockfd)
    }
}

impl AsRawFd for CanSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.as_rawfd()
    }
}
