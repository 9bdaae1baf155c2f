//! GPS datagram parsing.
//!
//! NMEA 0183 RMC/GGA sentences and ForeFlight XGPS text.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::trace;

use super::super::fix::LocationFix;

/// Parse a datagram that may hold several newline-separated sentences.
///
/// Returns the last valid fix in the datagram.
pub fn parse_datagram(data: &[u8]) -> Option<LocationFix> {
    let text = std::str::from_utf8(data).ok()?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_sentence)
        .last()
}

/// Parse one sentence.
pub fn parse_sentence(line: &str) -> Option<LocationFix> {
    if line.starts_with("XGPS") {
        return parse_xgps(line);
    }
    if line.starts_with('$') {
        let body = verify_checksum(line)?;
        let fields: Vec<&str> = body.split(',').collect();
        let kind = fields.first()?.get(2..)?;
        return match kind {
            "RMC" => parse_rmc(&fields),
            "GGA" => parse_gga(&fields),
            _ => None,
        };
    }
    None
}

/// Strip `$` and the optional `*hh` suffix, rejecting a bad checksum.
fn verify_checksum(line: &str) -> Option<&str> {
    let line = line.strip_prefix('$')?;
    match line.split_once('*') {
        Some((body, checksum)) => {
            let expected = u8::from_str_radix(checksum.trim(), 16).ok()?;
            let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
            if actual != expected {
                trace!(expected, actual, "NMEA checksum mismatch");
                return None;
            }
            Some(body)
        }
        None => Some(line),
    }
}

/// `$--RMC,time,status,lat,N/S,lon,E/W,speed,course,date,...`
fn parse_rmc(fields: &[&str]) -> Option<LocationFix> {
    if fields.len() < 10 || fields[2] != "A" {
        return None;
    }
    let latitude = parse_coordinate(fields[3], fields[4])?;
    let longitude = parse_coordinate(fields[5], fields[6])?;
    let timestamp = parse_time(fields[1])
        .zip(parse_date(fields[9]))
        .map(|(time, date)| NaiveDateTime::new(date, time).and_utc())
        .unwrap_or_else(Utc::now);

    Some(LocationFix {
        latitude,
        longitude,
        timestamp,
    })
}

/// `$--GGA,time,lat,N/S,lon,E/W,quality,...`
fn parse_gga(fields: &[&str]) -> Option<LocationFix> {
    if fields.len() < 7 {
        return None;
    }
    let quality: u8 = fields[6].parse().ok()?;
    if quality == 0 {
        return None;
    }
    let latitude = parse_coordinate(fields[2], fields[3])?;
    let longitude = parse_coordinate(fields[4], fields[5])?;

    // GGA carries no date; stamp with today's date when the time parses
    let timestamp = parse_time(fields[1])
        .map(|time| NaiveDateTime::new(Utc::now().date_naive(), time).and_utc())
        .unwrap_or_else(Utc::now);

    Some(LocationFix {
        latitude,
        longitude,
        timestamp,
    })
}

/// `XGPS<name>,lon,lat,alt_m,track,gs_m/s`
fn parse_xgps(line: &str) -> Option<LocationFix> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        trace!("XGPS sentence too short: {} parts", parts.len());
        return None;
    }
    let longitude: f64 = parts[1].trim().parse().ok()?;
    let latitude: f64 = parts[2].trim().parse().ok()?;
    Some(LocationFix::new(latitude, longitude))
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere to signed decimal degrees.
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let raw: f64 = value.parse().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    if minutes >= 60.0 {
        return None;
    }
    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// `hhmmss` or `hhmmss.sss`
fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() < 6 {
        return None;
    }
    let hour: u32 = value.get(0..2)?.parse().ok()?;
    let minute: u32 = value.get(2..4)?.parse().ok()?;
    let seconds: f64 = value.get(4..)?.parse().ok()?;
    let millis = (seconds.fract() * 1000.0).round().min(999.0) as u32;
    NaiveTime::from_hms_milli_opt(hour, minute, seconds.trunc() as u32, millis)
}

/// `ddmmyy`
fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 6 {
        return None;
    }
    let day: u32 = value.get(0..2)?.parse().ok()?;
    let month: u32 = value.get(2..4)?.parse().ok()?;
    let year: i32 = value.get(4..6)?.parse().ok()?;
    let century = if year < 80 { 2000 } else { 1900 };
    NaiveDate::from_ymd_opt(century + year, month, day)
}
