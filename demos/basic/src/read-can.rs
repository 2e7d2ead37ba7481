/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * usage: can-read [iface]   (default vcan0, use 'all' to listen on every CAN interface)
 */
extern crate cansocket;
use env_logger::Env;
use cansocket::prelude::*;

fn main() -> Result<(), String> {
    // Initialize logging backend for the `log` facade (idempotent).
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();

    const VCAN: &str = "vcan0";
    let candev = std::env::args().nth(1).unwrap_or_else(|| VCAN.to_owned());

    let mut sockfd = match CanSocket::open(CanSocketMode::RAW) {
        Err(error) => return Err(format!("fail opening socketcan {error}")),
        Ok(value) => value,
    };

    let iface = if candev == "all" {
        CAN_ALL_INTERFACES
    } else {
        CanInterface::from_name(&sockfd, &candev).map_err(|error| format!("fail resolving {candev} {error}"))?
    };

    if let Err(error) = sockfd.bind(iface) {
        return Err(format!("fail binding candev:{candev} {error}"));
    }

    match sockfd.get_mtu(&candev) {
        Ok(mtu) if mtu == canfd_mtu() => log::info!("{candev} is CAN-FD capable (mtu:{mtu})"),
        Ok(mtu) => log::info!("{candev} classic CAN (mtu:{mtu})"),
        Err(error) => log::debug!("no mtu for {candev} {error}"),
    }

    log::info!("Waiting for Raw CAN package");
    loop {
        let mut frame = match sockfd.recv() {
            Err(error) => return Err(format!("fail reading candev: {error}")),
            Ok(frame) => frame,
        };
        let canid = frame.get_id();
        let ifname = frame
            .get_iface_mut()
            .resolve_name(&sockfd)
            .unwrap_or("?")
            .to_owned();

        if canid.is_error() {
            log::warn!("{ifname} error frame class:{:#x} data:{:?}", canid.error_class(), frame.get_data());
        } else if canid.is_extended() {
            log::info!(
                "{ifname} EFF id:{:#010x} rtr:{} len:{} data:{:?}",
                canid.extended_address(),
                canid.is_remote(),
                frame.get_len(),
                frame.get_data()
            );
        } else {
            log::info!(
                "{ifname} SFF id:{:#05x} rtr:{} len:{} data:{:?}",
                canid.standard_address(),
                canid.is_remote(),
                frame.get_len(),
                frame.get_data()
            );
        }
    }
}
