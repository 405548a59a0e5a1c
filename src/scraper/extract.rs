// extract.rs
//
// Ad shape inside __NEXT_DATA__ (every field may be missing):
//
// props.pageProps.ads[]
//  ├── listId            number | string
//  ├── subject           title
//  ├── price             number | "R$ 45.900"
//  ├── properties[]      { name, value }  (regdate, mileage, gearbox, fuel, ...)
//  ├── images[]          { url }
//  ├── location          { municipality, uf }
//  ├── locationDetails   { municipality, uf }
//  ├── url
//  └── listTime
use crate::domain::listing::ListingRecord;
use crate::scraper::{ScraperError, SkipReason};
use ::scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parses one search results page. Missing or malformed payloads yield an
/// empty page, and ads that can't be read are dropped individually.
pub fn parse_page(html: &str) -> Vec<ListingRecord> {
    let data = match extract_next_data(html) {
        Ok(data) => data,
        Err(ScraperError::MissingNextData) => {
            debug!("page has no __NEXT_DATA__ block");
            return Vec::new();
        }
        Err(e) => {
            warn!("could not read page payload: {e}");
            return Vec::new();
        }
    };

    let ads = match extract_ads(&data) {
        Ok(ads) => ads,
        Err(e) => {
            debug!("{e}");
            return Vec::new();
        }
    };

    let mut listings = Vec::with_capacity(ads.len());
    let mut skipped: HashMap<SkipReason, usize> = HashMap::new();

    for item in ads {
        match parse_ad(item) {
            Ok(listing) => listings.push(listing),
            Err(reason) => *skipped.entry(reason).or_default() += 1,
        }
    }

    if !skipped.is_empty() {
        debug!("skipped ads on page: {skipped:?}");
    }

    listings
}

fn extract_next_data(html: &str) -> Result<Value, ScraperError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[id="__NEXT_DATA__"]"#)
        .map_err(|e| ScraperError::HtmlParse(e.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or(ScraperError::MissingNextData)?;

    let json_text: String = element.text().collect();
    if json_text.trim().is_empty() {
        return Err(ScraperError::MissingNextData);
    }

    serde_json::from_str(&json_text).map_err(|e| ScraperError::JsonParse(e.to_string()))
}

fn extract_ads(data: &Value) -> Result<&Vec<Value>, ScraperError> {
    data["props"]["pageProps"]["ads"]
        .as_array()
        .ok_or(ScraperError::UnexpectedShape("props.pageProps.ads missing".to_string()))
}

/// Builds a listing from one raw ad. Only `subject` and `listId` are required;
/// everything else falls back to a default.
pub fn parse_ad(item: &Value) -> Result<ListingRecord, SkipReason> {
    let obj = item.as_object().ok_or(SkipReason::NotARecord)?;

    let title = obj
        .get("subject")
        .and_then(Value::as_str)
        .ok_or(SkipReason::MissingTitle)?;

    let id = obj
        .get("listId")
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingId)?;

    let props = property_map(obj);

    let image_url = obj
        .get("images")
        .and_then(Value::as_array)
        .and_then(|imgs| imgs.first())
        .and_then(|img| img.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let (city, region) = location(obj);

    let mut listing =
        ListingRecord::new(id, title).with_price(obj.get("price").unwrap_or(&Value::Null));

    listing.model_year = props
        .get("regdate")
        .map(|v| coerce_int(v))
        .and_then(|y| i32::try_from(y).ok())
        .filter(|&y| y != 0);
    listing.mileage_km = props
        .get("mileage")
        .map(|v| coerce_int(v))
        .filter(|&km| km != 0);
    if let Some(gearbox) = props.get("gearbox").and_then(|v| scalar_to_string(v)) {
        listing.transmission = gearbox;
    }
    if let Some(fuel) = props.get("fuel").and_then(|v| scalar_to_string(v)) {
        listing.fuel_type = fuel;
    }
    listing.city = city;
    listing.region = region;
    listing.url = str_field(obj, "url").to_string();
    listing.image_url = image_url;
    listing.published_at = obj.get("listTime").and_then(scalar_to_string);

    Ok(listing)
}

/// name -> value for every well-formed entry of `properties`.
fn property_map(obj: &Map<String, Value>) -> HashMap<&str, &Value> {
    obj.get("properties")
        .and_then(Value::as_array)
        .map(|props| {
            props
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|p| Some((p.get("name")?.as_str()?, p.get("value")?)))
                .collect()
        })
        .unwrap_or_default()
}

/// City and state from `location`, or from `locationDetails` when the
/// primary block has no city.
fn location(obj: &Map<String, Value>) -> (String, String) {
    let read = |key: &str| -> (String, String) {
        match obj.get(key).and_then(Value::as_object) {
            Some(loc) => (
                str_field(loc, "municipality").to_string(),
                str_field(loc, "uf").to_string(),
            ),
            None => (String::new(), String::new()),
        }
    };

    let primary = read("location");
    if !primary.0.is_empty() {
        return primary;
    }
    read("locationDetails")
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer property coercion: `0` for anything absent or unparseable.
/// Thousands separators in strings ("120.000") are tolerated.
fn coerce_int(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .replace(['.', ' '], "")
            .parse()
            .unwrap_or(0),
        _ => 0,
    }
}
