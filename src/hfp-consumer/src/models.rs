use chrono::{DateTime, Utc};
use hfp_core::{Coordinates, NewVehiclePosition, RouteId, VehicleId};
use serde::Deserialize;
use serde_json::Value;
use snafu::{OptionExt, ResultExt};

use crate::error::{
    DecodeError,
    decode_error::{
        InvalidNumericSnafu, InvalidTimestampSnafu, MalformedPayloadSnafu, MissingFieldSnafu,
    },
};

/// Envelope of a vehicle position (`VP`) event on the HFP feed.
#[derive(Debug, Clone, Deserialize)]
pub struct HfpMessage {
    #[serde(rename = "VP")]
    pub vp: HfpPosition,
}

/// The subset of the HFP `VP` payload we store, all other fields are ignored.
///
/// Fields are kept as raw JSON values as the feed is not consistent in whether numbers are sent as
/// strings or numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct HfpPosition {
    /// Route designation as shown to passengers.
    pub desi: Option<Value>,
    /// Vehicle number, unique per operator.
    pub veh: Option<Value>,
    /// Timestamp the position was recorded at by the vehicle.
    pub tst: Option<Value>,
    /// Speed in km/h.
    pub spd: Option<Value>,
    pub lat: Option<Value>,
    pub long: Option<Value>,
}

/// Decodes a raw feed payload into a position, a payload is either accepted whole or rejected.
pub fn decode(payload: &[u8]) -> Result<NewVehiclePosition, DecodeError> {
    let message: HfpMessage = serde_json::from_slice(payload).context(MalformedPayloadSnafu)?;
    NewVehiclePosition::try_from(message.vp)
}

impl TryFrom<HfpPosition> for NewVehiclePosition {
    type Error = DecodeError;

    fn try_from(value: HfpPosition) -> Result<Self, Self::Error> {
        let HfpPosition {
            desi,
            veh,
            tst,
            spd,
            lat,
            long,
        } = value;

        let route_id = identifier("desi", desi)?;
        let vehicle_id = identifier("veh", veh)?;

        let tst = tst.context(MissingFieldSnafu { field: "tst" })?;
        let spd = spd.context(MissingFieldSnafu { field: "spd" })?;
        let lat = lat.context(MissingFieldSnafu { field: "lat" })?;
        let long = long.context(MissingFieldSnafu { field: "long" })?;

        let observed_at = timestamp(&tst)?;

        let speed = numeric("spd", &spd)?;
        if speed < 0.0 {
            return InvalidNumericSnafu {
                field: "spd",
                value: spd.to_string(),
            }
            .fail();
        }

        let latitude = numeric("lat", &lat)?;
        let longitude = numeric("long", &long)?;
        let coordinates = Coordinates::new(latitude, longitude).map_err(|_| {
            let field = if (-90.0..=90.0).contains(&latitude) {
                "long"
            } else {
                "lat"
            };
            InvalidNumericSnafu {
                field,
                value: format!("{latitude},{longitude}"),
            }
            .build()
        })?;

        Ok(NewVehiclePosition {
            route_id: RouteId::new(route_id).ok().context(MissingFieldSnafu { field: "desi" })?,
            vehicle_id: VehicleId::new(vehicle_id)
                .ok()
                .context(MissingFieldSnafu { field: "veh" })?,
            observed_at,
            speed,
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
        })
    }
}

fn identifier(field: &'static str, value: Option<Value>) -> Result<String, DecodeError> {
    let value = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if value.is_empty() {
        MissingFieldSnafu { field }.fail()
    } else {
        Ok(value)
    }
}

fn timestamp(value: &Value) -> Result<DateTime<Utc>, DecodeError> {
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    parsed.context(InvalidTimestampSnafu {
        value: value.to_string(),
    })
}

fn numeric(field: &'static str, value: &Value) -> Result<f64, DecodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .context(InvalidNumericSnafu {
            field,
            value: value.to_string(),
        })
}
