use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::FeedMessage;

mod feed;
mod store;

pub use feed::*;
pub use store::*;

pub const TEST_TOPIC_FILTER: &str = "/hfp/v2/journey/ongoing/vp/#";
pub const TEST_TOPIC: &str =
    "/hfp/v2/journey/ongoing/vp/metro/0018/00199/31M1/1/Vuosaari/09:44/1453127/5/60;24/19/86/41";

/// Builds an HFP `VP` payload, use `with`/`without` to tweak individual fields.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    fields: serde_json::Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new(
        route: &str,
        vehicle: u32,
        observed_at: DateTime<Utc>,
        speed: f64,
        latitude: f64,
        longitude: f64,
    ) -> PayloadBuilder {
        let fields = json!({
            "desi": route,
            "dir": "1",
            "oper": 18,
            "veh": vehicle,
            "tst": observed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "tsi": observed_at.timestamp(),
            "spd": speed,
            "hdg": 140,
            "lat": latitude,
            "long": longitude,
            "acc": 0.0,
            "dl": -12,
            "odo": null,
            "drst": 0,
            "oday": observed_at.date_naive().to_string(),
            "jrn": 1453,
            "line": 1,
            "start": "09:44",
            "loc": "GPS",
            "stop": null,
            "route": "31M1",
            "occu": 0
        });

        PayloadBuilder {
            fields: match fields {
                Value::Object(map) => map,
                _ => unreachable!(),
            },
        }
    }

    pub fn with(mut self, field: &str, value: Value) -> PayloadBuilder {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn without(mut self, field: &str) -> PayloadBuilder {
        self.fields.remove(field);
        self
    }

    pub fn build(self) -> Vec<u8> {
        json!({ "VP": Value::Object(self.fields) })
            .to_string()
            .into_bytes()
    }

    pub fn message(self) -> FeedMessage {
        FeedMessage::new(TEST_TOPIC, self.build())
    }
}
