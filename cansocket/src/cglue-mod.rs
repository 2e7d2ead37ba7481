/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * Thin glue over the kernel socket API. Every unsafe libc call of the crate lives here.
 */

use crate::prelude::*;
use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_char, c_int, c_void};
use std::sync::OnceLock;

pub use libc::canid_t;

pub const CAN_EFF_FLAG: canid_t = libc::CAN_EFF_FLAG;
pub const CAN_RTR_FLAG: canid_t = libc::CAN_RTR_FLAG;
pub const CAN_ERR_FLAG: canid_t = libc::CAN_ERR_FLAG;
pub const CAN_SFF_MASK: canid_t = libc::CAN_SFF_MASK;
pub const CAN_EFF_MASK: canid_t = libc::CAN_EFF_MASK;
pub const CAN_ERR_MASK: canid_t = libc::CAN_ERR_MASK;
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// struct ifreq as used by SIOCGIFINDEX/SIOCGIFNAME/SIOCGIFMTU: the name followed
/// by the request union, of which only the int member (ifindex/mtu) is ever used.
#[repr(C)]
struct IfReq {
    ifr_name: [c_char; IFNAMSIZ],
    ifr_ivalue: c_int,
    __pad: [u8; 20],
}

impl IfReq {
    fn zeroed() -> Self {
        IfReq { ifr_name: [0; IFNAMSIZ], ifr_ivalue: 0, __pad: [0; 20] }
    }

    fn with_name(name: &str) -> Result<Self, CanError> {
        let iname = name.as_bytes();
        if iname.is_empty() || iname.len() > IFNAMSIZ - 1 || iname.contains(&0) {
            return Err(CanError::invalid(
                "can-ifname-invalid",
                format!("illegal interface name '{}' (max {} bytes)", name, IFNAMSIZ - 1),
            ));
        }
        let mut ifreq = IfReq::zeroed();
        for (idx, byte) in iname.iter().enumerate() {
            ifreq.ifr_name[idx] = *byte as c_char;
        }
        Ok(ifreq)
    }
}

/// Kernel-header values needed at runtime, fetched once then read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanConstants {
    /// sizeof(struct can_frame)
    pub can_mtu: i32,
    /// sizeof(struct canfd_frame)
    pub canfd_mtu: i32,
    pub raw_filter: i32,
    pub raw_err_filter: i32,
    pub raw_loopback: i32,
    pub raw_recv_own_msgs: i32,
    pub raw_fd_frames: i32,
}

static CAN_CONSTANTS: OnceLock<CanConstants> = OnceLock::new();

pub fn can_constants() -> &'static CanConstants {
    CAN_CONSTANTS.get_or_init(|| CanConstants {
        can_mtu: mem::size_of::<libc::can_frame>() as i32,
        canfd_mtu: mem::size_of::<libc::canfd_frame>() as i32,
        raw_filter: libc::CAN_RAW_FILTER,
        raw_err_filter: libc::CAN_RAW_ERR_FILTER,
        raw_loopback: libc::CAN_RAW_LOOPBACK,
        raw_recv_own_msgs: libc::CAN_RAW_RECV_OWN_MSGS,
        raw_fd_frames: libc::CAN_RAW_FD_FRAMES,
    })
}

pub(crate) fn open_socket(socktype: c_int, protocol: c_int) -> Result<c_int, CanError> {
    let sockfd = unsafe { libc::socket(libc::PF_CAN, socktype, protocol) };
    if sockfd < 0 {
        return Err(CanError::from_errno("fail-socketcan-open"));
    }
    Ok(sockfd)
}

pub(crate) fn close_socket(sockfd: c_int) -> Result<(), CanError> {
    if unsafe { libc::close(sockfd) } < 0 {
        return Err(CanError::from_errno("fail-socketcan-close"));
    }
    Ok(())
}

fn can_sockaddr(ifindex: i32) -> libc::sockaddr_can {
    let mut canaddr: libc::sockaddr_can = unsafe { mem::zeroed() };
    canaddr.can_family = libc::AF_CAN as libc::sa_family_t;
    canaddr.can_ifindex = ifindex;
    canaddr
}

pub(crate) fn bind_socket(sockfd: c_int, ifindex: i32) -> Result<(), CanError> {
    let canaddr = can_sockaddr(ifindex);
    let status = unsafe {
        libc::bind(
            sockfd,
            &canaddr as *const _ as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_can>() as libc::socklen_t,
        )
    };
    if status < 0 {
        return Err(CanError::from_errno("fail-socketcan-bind"));
    }
    Ok(())
}

/// Writes one buffer to `ifindex`, returns the byte count accepted by the kernel.
pub(crate) fn send_to(sockfd: c_int, ifindex: i32, buffer: &[u8]) -> Result<usize, CanError> {
    let canaddr = can_sockaddr(ifindex);
    let count = unsafe {
        libc::sendto(
            sockfd,
            buffer.as_ptr() as *const c_void,
            buffer.len(),
            0,
            &canaddr as *const _ as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_can>() as libc::socklen_t,
        )
    };
    if count < 0 {
        return Err(CanError::from_errno("fail-socketcan-send"));
    }
    Ok(count as usize)
}

/// Blocking read of one datagram; returns (byte count, source ifindex).
pub(crate) fn recv_from(sockfd: c_int, buffer: &mut [u8]) -> Result<(usize, i32), CanError> {
    let mut canaddr: libc::sockaddr_can = unsafe { mem::zeroed() };
    let mut addrlen = mem::size_of::<libc::sockaddr_can>() as libc::socklen_t;
    let count = unsafe {
        libc::recvfrom(
            sockfd,
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len(),
            0,
            &mut canaddr as *mut _ as *mut libc::sockaddr,
            &mut addrlen,
        )
    };
    if count < 0 {
        return Err(CanError::from_errno("fail-socketcan-recv"));
    }
    if addrlen as usize != mem::size_of::<libc::sockaddr_can>() {
        return Err(CanError::invalid(
            "can-recv-addr",
            format!("illegal AF_CAN address len={}", addrlen),
        ));
    }
    Ok((count as usize, canaddr.can_ifindex))
}

pub(crate) fn ifname_to_index(sockfd: c_int, name: &str) -> Result<i32, CanError> {
    let mut ifreq = IfReq::with_name(name)?;
    let rc = unsafe { libc::ioctl(sockfd, libc::SIOCGIFINDEX as _, &mut ifreq as *mut IfReq) };
    if rc < 0 {
        return Err(CanError::from_errno("fail-socketcan-iface"));
    }
    Ok(ifreq.ifr_ivalue)
}

pub(crate) fn ifindex_to_name(sockfd: c_int, index: i32) -> Result<String, CanError> {
    let mut ifreq = IfReq::zeroed();
    ifreq.ifr_ivalue = index;
    let rc = unsafe { libc::ioctl(sockfd, libc::SIOCGIFNAME as _, &mut ifreq as *mut IfReq) };
    if rc < 0 {
        return Err(CanError::from_errno("can-ifname-fail"));
    }

    // the kernel always terminates the name, the last byte is forced anyway
    ifreq.ifr_name[IFNAMSIZ - 1] = 0;
    let cstring = unsafe { CStr::from_ptr(ifreq.ifr_name.as_ptr()) };
    match cstring.to_str() {
        Err(error) => Err(CanError::new("can-ifname-invalid", error.to_string())),
        Ok(slice) => Ok(slice.to_owned()),
    }
}

pub(crate) fn ifname_mtu(sockfd: c_int, name: &str) -> Result<i32, CanError> {
    let mut ifreq = IfReq::with_name(name)?;
    let rc = unsafe { libc::ioctl(sockfd, libc::SIOCGIFMTU as _, &mut ifreq as *mut IfReq) };
    if rc < 0 {
        return Err(CanError::from_errno("can-mtu-fail"));
    }
    Ok(ifreq.ifr_ivalue)
}

pub(crate) fn set_raw_sockopt(sockfd: c_int, option: c_int, value: c_int) -> Result<(), CanError> {
    let status = unsafe {
        libc::setsockopt(
            sockfd,
            libc::SOL_CAN_RAW,
            option,
            &value as *const _ as *const c_void,
            mem::size_of::<c_int>() as libc::socklen_t,
        )
    };
    if status < 0 {
        return Err(CanError::from_errno("can-setsockopt-fail"));
    }
    Ok(())
}

pub(crate) fn get_raw_sockopt(sockfd: c_int, option: c_int) -> Result<c_int, CanError> {
    let mut value: c_int = 0;
    let mut len = mem::size_of::<c_int>() as libc::socklen_t;
    let status = unsafe {
        libc::getsockopt(
            sockfd,
            libc::SOL_CAN_RAW,
            option,
            &mut value as *mut _ as *mut c_void,
            &mut len,
        )
    };
    if status < 0 {
        return Err(CanError::from_errno("can-getsockopt-fail"));
    }
    if len as usize != mem::size_of::<c_int>() {
        return Err(CanError::invalid(
            "can-getsockopt-len",
            format!("option:{} returned len={}", option, len),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifreq_matches_kernel_size() {
        // no pointer member: 40 bytes everywhere, >= sizeof(struct ifreq) on every target
        assert_eq!(mem::size_of::<IfReq>(), 40);
    }

    #[test]
    fn ifname_is_packed_and_terminated() {
        let ifreq = IfReq::with_name("vcan0").unwrap();
        let packed: Vec<u8> = ifreq.ifr_name.iter().map(|c| *c as u8).collect();
        assert_eq!(&packed[..6], b"vcan0\0");
        assert!(packed[5..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn ifname_too_long_is_rejected() {
        assert!(IfReq::with_name("0123456789abcde").is_ok());
        let error = IfReq::with_name("0123456789abcdef").err().unwrap();
        assert!(error.is_invalid());
        assert!(IfReq::with_name("").err().unwrap().is_invalid());
        assert!(IfReq::with_name("can\00").err().unwrap().is_invalid());
    }

    #[test]
    fn constants_come_from_kernel_headers() {
        let consts = can_constants();
        assert_eq!(consts.can_mtu, 16);
        assert_eq!(consts.canfd_mtu, 72);
        assert_eq!(consts.raw_filter, 1);
        assert_eq!(consts.raw_err_filter, 2);
        assert_eq!(consts.raw_loopback, 3);
        assert_eq!(consts.raw_recv_own_msgs, 4);
        assert_eq!(consts.raw_fd_frames, 5);
        assert!(std::ptr::eq(consts, can_constants()));
    }

    #[test]
    fn frame_flags_mirror_kernel() {
        assert_eq!(CAN_EFF_FLAG, 0x8000_0000);
        assert_eq!(CAN_RTR_FLAG, 0x4000_0000);
        assert_eq!(CAN_ERR_FLAG, 0x2000_0000);
        assert_eq!(CAN_SFF_MASK, 0x0000_07FF);
        assert_eq!(CAN_EFF_MASK, 0x1FFF_FFFF);
        assert_eq!(CAN_ERR_MASK, 0x1FFF_FFFF);
    }
}
