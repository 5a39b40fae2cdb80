//! GEOADD, GEOPOS, GEODIST and GEOSEARCH, stored as sorted-set scores.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult, command_utils::parse_float,
    },
    key_value_store::{geo, KeyValueStore},
    resp::RespValue,
};

pub struct GeoaddArguments {
    key: String,
    locations: Vec<(f64, f64, String)>,
}

impl GeoaddArguments {
    /// Every triple is validated before anything is stored.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || (arguments.len() - 1) % 3 != 0 {
            return Err(CommandError::wrong_arguments("geoadd"));
        }

        let mut locations = Vec::with_capacity(arguments.len() / 3);

        for triple in arguments[1..].chunks(3) {
            let longitude = parse_float(&triple[0])?;
            let latitude = parse_float(&triple[1])?;

            if let Some(message) = geo::validate(longitude, latitude) {
                return Err(CommandError::InvalidCoordinates(message));
            }

            locations.push((longitude, latitude, triple[2].clone()));
        }

        Ok(Self {
            key: arguments[0].clone(),
            locations,
        })
    }
}

pub async fn geoadd(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let geoadd_arguments = GeoaddArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let Some(set) = store_guard.sorted_set_mut(&geoadd_arguments.key, true)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    let added = geoadd_arguments
        .locations
        .into_iter()
        .filter(|(longitude, latitude, member)| {
            set.insert(member.clone(), geo::encode(*longitude, *latitude) as f64)
        })
        .count();

    Ok(CommandResult::Response(RespValue::Integer(added as i64)))
}

/// One `[longitude, latitude]` pair per member, or a null array for members
/// that are not in the set.
pub async fn geopos(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.is_empty() {
        return Err(CommandError::wrong_arguments("geopos"));
    }

    let mut store_guard = store.lock().await;
    let set = store_guard.sorted_set(&arguments[0]);

    let positions = arguments[1..]
        .iter()
        .map(|member| match set.and_then(|set| set.score(member)) {
            Some(score) => {
                let (longitude, latitude) = geo::decode(score as u64);
                RespValue::array_of_bulk_strings(&[longitude.to_string(), latitude.to_string()])
            }
            None => RespValue::NullArray,
        })
        .collect();

    Ok(CommandResult::Response(RespValue::Array(positions)))
}

fn parse_unit(unit: &str) -> Result<f64, CommandError> {
    geo::unit_in_meters(unit).ok_or(CommandError::UnsupportedUnit)
}

/// Distance between two members with four decimals, in meters unless a unit is given.
pub async fn geodist(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 3 && arguments.len() != 4 {
        return Err(CommandError::wrong_arguments("geodist"));
    }

    let unit = match arguments.get(3) {
        Some(unit) => parse_unit(unit)?,
        None => 1.0,
    };

    let mut store_guard = store.lock().await;
    let Some(set) = store_guard.sorted_set(&arguments[0]) else {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    };

    let (Some(from), Some(to)) = (set.score(&arguments[1]), set.score(&arguments[2])) else {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    };

    let distance = geo::haversine_distance(geo::decode(from as u64), geo::decode(to as u64));

    Ok(CommandResult::Response(RespValue::BulkString(format!(
        "{:.4}",
        distance / unit
    ))))
}

enum SearchOrigin {
    LonLat(f64, f64),
    Member(String),
}

pub struct GeosearchArguments {
    key: String,
    origin: SearchOrigin,
    radius_in_meters: f64,
}

impl GeosearchArguments {
    /// `key FROMLONLAT lon lat | FROMMEMBER member` and `BYRADIUS radius unit`, in any order.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 5 {
            return Err(CommandError::wrong_arguments("geosearch"));
        }

        let mut origin = None;
        let mut radius_in_meters = None;
        let mut cursor = 1;

        while cursor < arguments.len() {
            let option = arguments[cursor].to_uppercase();
            let values = &arguments[cursor + 1..];

            match option.as_str() {
                "FROMLONLAT" if values.len() >= 2 && origin.is_none() => {
                    let longitude = parse_float(&values[0])?;
                    let latitude = parse_float(&values[1])?;

                    if let Some(message) = geo::validate(longitude, latitude) {
                        return Err(CommandError::InvalidCoordinates(message));
                    }

                    origin = Some(SearchOrigin::LonLat(longitude, latitude));
                    cursor += 3;
                }
                "FROMMEMBER" if !values.is_empty() && origin.is_none() => {
                    origin = Some(SearchOrigin::Member(values[0].clone()));
                    cursor += 2;
                }
                "BYRADIUS" if values.len() >= 2 && radius_in_meters.is_none() => {
                    let radius = parse_float(&values[0])?;

                    if radius < 0.0 {
                        return Err(CommandError::NotPositive);
                    }

                    radius_in_meters = Some(radius * parse_unit(&values[1])?);
                    cursor += 3;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let (Some(origin), Some(radius_in_meters)) = (origin, radius_in_meters) else {
            return Err(CommandError::SyntaxError);
        };

        Ok(Self {
            key: arguments[0].clone(),
            origin,
            radius_in_meters,
        })
    }
}

/// Scans every member and keeps those within the radius, in score order.
pub async fn geosearch(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let geosearch_arguments = GeosearchArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let Some(set) = store_guard.sorted_set(&geosearch_arguments.key) else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let center = match geosearch_arguments.origin {
        SearchOrigin::LonLat(longitude, latitude) => (longitude, latitude),
        SearchOrigin::Member(ref member) => {
            let score = set.score(member).ok_or(CommandError::UnknownMember)?;
            geo::decode(score as u64)
        }
    };

    let members: Vec<&str> = set
        .ranked()
        .into_iter()
        .filter(|(_, score)| {
            geo::haversine_distance(center, geo::decode(*score as u64))
                <= geosearch_arguments.radius_in_meters
        })
        .map(|(member, _)| member)
        .collect();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        &members,
    )))
}
