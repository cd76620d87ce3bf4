//! Amap REST response shapes.
//!
//! Amap encodes an empty string field as `[]` and sometimes sends numbers as
//! strings, so every text field goes through [`text`].

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String, number, `[]` or absent; blank collapses to `None`.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Object or anything else (`[]`, `""`, absent) as `None`.
fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => T::deserialize(value).map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Status envelope shared by every endpoint. `"1"` means success.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub info: Option<String>,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("1")
    }

    pub fn status(&self) -> String {
        self.status.clone().unwrap_or_default()
    }

    pub fn info(&self) -> String {
        self.info.clone().unwrap_or_default()
    }
}

/// `GET /geocode/regeo`
#[derive(Debug, Deserialize)]
pub struct RegeoResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default, deserialize_with = "object")]
    pub regeocode: Option<Regeocode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Regeocode {
    #[serde(default, deserialize_with = "text")]
    pub formatted_address: Option<String>,
    #[serde(rename = "addressComponent", default, deserialize_with = "object")]
    pub address_component: Option<AddressComponent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressComponent {
    #[serde(default, deserialize_with = "text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub province: Option<String>,
    /// Empty for municipalities such as Beijing.
    #[serde(default, deserialize_with = "text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub adcode: Option<String>,
}

impl AddressComponent {
    /// City, else district, else province.
    pub fn best_city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.district.as_deref())
            .or(self.province.as_deref())
    }
}

/// `GET /weather/weatherInfo`
#[derive(Debug, Deserialize)]
pub struct WeatherResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub lives: Vec<LiveWeather>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveWeather {
    #[serde(default, deserialize_with = "text")]
    pub weather: Option<String>,
    /// Degrees Celsius, sent as a string.
    #[serde(default, deserialize_with = "text")]
    pub temperature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regeo_with_empty_array_city() {
        let body = r#"{
            "status": "1",
            "info": "OK",
            "regeocode": {
                "formatted_address": "北京市东城区东华门街道天安门广场",
                "addressComponent": {
                    "country": "中国",
                    "province": "北京市",
                    "city": [],
                    "district": "东城区",
                    "adcode": "110101"
                }
            }
        }"#;
        let resp: RegeoResponse = serde_json::from_str(body).unwrap();
        assert!(resp.envelope.is_ok());
        let regeo = resp.regeocode.unwrap();
        let component = regeo.address_component.unwrap();
        assert!(component.city.is_none());
        assert_eq!(component.best_city(), Some("东城区"));
        assert_eq!(component.adcode.as_deref(), Some("110101"));
    }

    #[test]
    fn test_regeo_failure_envelope() {
        let body = r#"{"status":"0","info":"INVALID_USER_KEY","infocode":"10001","regeocode":[]}"#;
        let resp: RegeoResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.envelope.is_ok());
        assert_eq!(resp.envelope.info(), "INVALID_USER_KEY");
        assert!(resp.regeocode.is_none());
    }

    #[test]
    fn test_weather_temperature_as_string_or_number() {
        let body = r#"{"status":"1","lives":[{"weather":"晴","temperature":"22"}]}"#;
        let resp: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.lives[0].temperature.as_deref(), Some("22"));

        let numeric = r#"{"status":"1","lives":[{"weather":"阴","temperature":18.5}]}"#;
        let resp: WeatherResponse = serde_json::from_str(numeric).unwrap();
        assert_eq!(resp.lives[0].temperature.as_deref(), Some("18.5"));
    }

    #[test]
    fn test_best_city_prefers_city() {
        let component = AddressComponent {
            city: Some("杭州市".to_string()),
            district: Some("西湖区".to_string()),
            province: Some("浙江省".to_string()),
            ..Default::default()
        };
        assert_eq!(component.best_city(), Some("杭州市"));

        let only_province = AddressComponent {
            province: Some("上海市".to_string()),
            ..Default::default()
        };
        assert_eq!(only_province.best_city(), Some("上海市"));
    }
}
