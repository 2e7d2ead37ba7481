/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * usage: can-write [iface] [id#hexdata]   e.g. can-write vcan0 18fef100#00910000
 *    ids take 3 hex digits (standard) or 8 (extended), 'R' as data sends a remote request
 */
extern crate cansocket;
use env_logger::Env;
use cansocket::prelude::*;

fn parse_frame(text: &str) -> Result<(CanId, Vec<u8>), String> {
    let (id_hex, data_hex) = text.split_once('#').ok_or(format!("missing '#' in {text}"))?;
    // cansend convention: 3 hex digits standard id, 8 hex digits extended id
    let extended = match id_hex.len() {
        3 => false,
        8 => true,
        _ => return Err(format!("id {id_hex} needs 3 (standard) or 8 (extended) hex digits")),
    };
    let address = u32::from_str_radix(id_hex, 16).map_err(|e| format!("invalid id {id_hex}: {e}"))?;
    let mut canid = CanId::new(address);
    if extended {
        canid.set_extended();
    } else if address > CanId::SFF_MASK {
        return Err(format!("standard id {id_hex} over 0x7ff"));
    }

    if data_hex.eq_ignore_ascii_case("r") {
        canid.set_remote();
        return Ok((canid, Vec::new()));
    }
    if !data_hex.is_ascii() || data_hex.len() % 2 != 0 {
        return Err(format!("data {data_hex} is not an even count of hex digits"));
    }
    let mut data = Vec::with_capacity(data_hex.len() / 2);
    for idx in (0..data_hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&data_hex[idx..idx + 2], 16)
            .map_err(|e| format!("invalid data {data_hex}: {e}"))?;
        data.push(byte);
    }
    Ok((canid, data))
}

fn main() -> Result<(), String> {
    // Initialize logging backend for the `log` facade (idempotent).
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();

    const VCAN: &str = "vcan0";
    let mut args = std::env::args().skip(1);
    let candev = args.next().unwrap_or_else(|| VCAN.to_owned());
    let text = args.next().unwrap_or_else(|| "00030001#0091".to_owned());

    let (canid, data) = parse_frame(&text)?;

    let sockfd = match CanSocket::open_raw(candev.as_str()) {
        Err(error) => return Err(format!("fail opening candev {error}")),
        Ok(value) => value,
    };
    let iface = match sockfd.get_bound() {
        Some(iface) => iface.clone(),
        None => return Err(format!("socket not bound to {candev}")),
    };

    let frame = CanFrame::new(iface, canid, &data).map_err(|e| e.to_string())?;
    sockfd.send(&frame).map_err(|e| e.to_string())?;
    log::info!("sent {}", frame);

    sockfd.close().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_width_selects_frame_format() {
        let (canid, data) = parse_frame("123#11").unwrap();
        assert!(!canid.is_extended());
        assert_eq!(canid.standard_address(), 0x123);
        assert_eq!(data, vec![0x11]);

        let (canid, _) = parse_frame("00000123#11").unwrap();
        assert!(canid.is_extended());
        assert_eq!(canid.extended_address(), 0x123);

        assert!(parse_frame("0123#11").is_err());
        assert!(parse_frame("800#11").is_err());
    }

    #[test]
    fn remote_request_has_no_data() {
        let (canid, data) = parse_frame("18fef100#R").unwrap();
        assert!(canid.is_extended());
        assert!(canid.is_remote());
        assert!(data.is_empty());
    }

    #[test]
    fn non_ascii_data_is_rejected() {
        assert!(parse_frame("123#a\u{e9}0").is_err());
        assert!(parse_frame("123#abc").is_err());
        assert!(parse_frame("123#zz").is_err());
        assert_eq!(parse_frame("123#").unwrap().1, Vec::<u8>::new());
    }
}
