/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
*/

//! Linux SocketCAN access: RAW/BCM sockets, interface index resolution and
//! classic CAN frames (8 bytes payload max).
//!
//! ```no_run
//! use cansocket::prelude::*;
//!
//! let mut sock = CanSocket::open(CanSocketMode::RAW)?;
//! let iface = CanInterface::from_name(&sock, "vcan0")?;
//! sock.bind(iface.clone())?;
//! sock.send(&CanFrame::new(iface, *CanId::new(0x30001).set_extended(), &[0x00, 0x91])?)?;
//! let frame = sock.recv()?;
//! println!("{}", frame);
//! sock.close()?;
//! # Ok::<(), CanError>(())
//! ```

#![doc(
    html_logo_url = "https://iot.bzh/images/defaults/company/512-479-max-transp.png",
    html_favicon_url = "https://iot.bzh/images/defaults/favicon.ico"
)]
#![cfg(target_os = "linux")]
extern crate bitflags;

#[cfg(feature = "serde")]
extern crate serde;

#[path = "./cglue-mod.rs"]
mod cglue;

#[path = "./utils-mod.rs"]
mod utils;

#[path = "./canid-mod.rs"]
mod canid;

#[path = "./iface-mod.rs"]
mod iface;

#[path = "./frame-mod.rs"]
mod frame;

#[path = "./socket-can.rs"]
mod sockcan;

pub mod prelude {
    pub use crate::canid::*;
    pub use crate::cglue::{can_constants, CanConstants};
    pub use crate::frame::*;
    pub use crate::iface::*;
    pub use crate::sockcan::*;
    pub use crate::utils::*;
}
