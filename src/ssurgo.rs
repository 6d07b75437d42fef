//! SSURGO Soil Data Access client.
//!
//! SDA speaks SQL over HTTP: a form POST with `query` and `format` fields,
//! answered as `{"Table": [[c1, c2, …], …]}` with columns in SELECT order
//! and every cell a string. Three queries drive the pipeline: mukey
//! discovery at a point, the component list of a map unit, and the horizon
//! stack of a component.

use serde_json::Value;

use crate::error::{Result, ScoringError};
use crate::net::{with_retries, RetryPolicy};
use crate::soil::{esp_from_sar, Component, DrainageClass, Horizon};

pub const SDA_URL: &str = "https://sdmdataaccess.sc.egov.usda.gov/Tabular/post.rest";

/// Drainage number assumed when SSURGO has no drainage class.
const DEFAULT_DRAIN_NUM: i32 = 4;

/// Source of map units, components and horizons for a point.
///
/// The production implementation is [`SdaClient`]; tests drive the
/// orchestrator with fixture sources.
pub trait SoilDataSource {
    fn mukeys_at_point(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn components(
        &self,
        mukey: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Component>>> + Send;
    fn horizons(
        &self,
        cokey: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Horizon>>> + Send;
}

/// HTTP client for the SDA tabular endpoint.
pub struct SdaClient {
    http: reqwest::Client,
    url: String,
    policy: RetryPolicy,
}

impl SdaClient {
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Result<SdaClient> {
        let http = reqwest::Client::builder().timeout(policy.timeout).build()?;
        Ok(SdaClient {
            http,
            url: url.into(),
            policy,
        })
    }

    pub fn new_default() -> Result<SdaClient> {
        Self::new(SDA_URL, RetryPolicy::default())
    }

    async fn post_query(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        with_retries(&self.policy, "SDA query", || self.post_once(sql)).await
    }

    async fn post_once(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        tracing::debug!("SDA query: {}", sql);
        let response = self
            .http
            .post(&self.url)
            .form(&[("query", sql), ("format", "JSON")])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ScoringError::TransientUpstream(format!(
                "SDA returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ScoringError::Internal(format!("SDA returned {}", status)));
        }

        let body: Value = response.json().await?;
        Ok(parse_table(&body))
    }
}

impl SoilDataSource for SdaClient {
    async fn mukeys_at_point(&self, lat: f64, lon: f64) -> Result<Vec<String>> {
        let rows = self.post_query(&mukey_query(lat, lon)).await?;
        Ok(rows
            .iter()
            .filter_map(|row| cell_str(row, 0))
            .collect())
    }

    async fn components(&self, mukey: &str) -> Result<Vec<Component>> {
        let rows = self.post_query(&component_query(mukey)).await?;
        Ok(rows.iter().filter_map(|row| decode_component_row(row)).collect())
    }

    async fn horizons(&self, cokey: &str) -> Result<Vec<Horizon>> {
        let rows = self.post_query(&horizon_query(cokey)).await?;
        Ok(rows.iter().filter_map(|row| decode_horizon_row(row)).collect())
    }
}

/// Mukey discovery by point intersection (EPSG:4326 WKT).
pub fn mukey_query(lat: f64, lon: f64) -> String {
    format!(
        "SELECT DISTINCT mukey FROM SDA_Get_Mukey_from_intersection_with_WktWgs84('point({} {})')",
        lon, lat
    )
}

/// Component list of a map unit, dominant first.
pub fn component_query(mukey: &str) -> String {
    let mukey = digits(mukey);
    format!(
        "SELECT c.cokey, c.compname, c.comppct_r, c.drainagecl, c.taxtempregime, c.taxminalogy, c.slope_r, \
         (SELECT MIN(r.resdept_r) FROM corestrictions r WHERE r.cokey = c.cokey) AS resdept, \
         (SELECT MIN(r.resdept_r) FROM corestrictions r WHERE r.cokey = c.cokey AND r.reskind LIKE '%bedrock%') AS bedrockdept \
         FROM component c WHERE c.mukey = '{}' ORDER BY c.comppct_r DESC, c.cokey",
        mukey
    )
}

/// Horizon stack of a component, shallowest first. Coarse fragments come
/// from the chfrags child table.
pub fn horizon_query(cokey: &str) -> String {
    let cokey = digits(cokey);
    format!(
        "SELECT ch.hzdept_r, ch.hzdepb_r, ch.sandtotal_r, ch.silttotal_r, ch.claytotal_r, \
         ch.om_r, ch.ph1to1h2o_r, ch.cec7_r, ch.sumbases_r, ch.ec_r, ch.sar_r, \
         ch.caco3_r, ch.gypsum_r, ch.dbthirdbar_r, \
         (SELECT SUM(f.fragvol_r) FROM chfrags f WHERE f.chkey = ch.chkey) AS fragvol \
         FROM chorizon ch WHERE ch.cokey = '{}' ORDER BY ch.hzdept_r",
        cokey
    )
}

/// Keys echoed back into SQL are numeric; strip anything else.
fn digits(key: &str) -> String {
    key.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Extract the row array from an SDA response body. A missing or empty
/// `Table` means no data.
pub fn parse_table(body: &Value) -> Vec<Vec<Value>> {
    body.get("Table")
        .and_then(|t| t.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.as_array().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Cell access: SDA serialises everything as strings, but be lenient about
/// raw JSON numbers too.
pub fn cell_str(row: &[Value], idx: usize) -> Option<String> {
    match row.get(idx)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn cell_f64(row: &[Value], idx: usize) -> Option<f64> {
    match row.get(idx)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a component row; rows without a cokey are dropped.
pub fn decode_component_row(row: &[Value]) -> Option<Component> {
    let cokey = cell_str(row, 0)?;
    let compname = cell_str(row, 1).unwrap_or_else(|| "Unnamed".to_string());
    let comppct = cell_f64(row, 2).unwrap_or(0.0);
    let drain_num = cell_str(row, 3)
        .and_then(|s| DrainageClass::from_str_loose(&s))
        .map(|d| d.0)
        .unwrap_or(DEFAULT_DRAIN_NUM);

    Some(Component {
        cokey,
        compname,
        comppct,
        drain_num,
        rd: 0.0,
        bedrock_depth: cell_f64(row, 8),
        restriction_depth: cell_f64(row, 7),
        slope: cell_f64(row, 6),
        temp_regime: cell_str(row, 4),
        mineralogy: cell_str(row, 5),
        horizons: Vec::new(),
    })
}

/// Decode a horizon row; rows without both depths are dropped. ESP is
/// estimated from SAR since SSURGO carries no ESP column.
pub fn decode_horizon_row(row: &[Value]) -> Option<Horizon> {
    let top = cell_f64(row, 0)?;
    let bot = cell_f64(row, 1)?;
    if bot <= top {
        return None;
    }

    let mut h = Horizon::with_depths(top.round() as i32, bot.round() as i32);
    h.sand = cell_f64(row, 2);
    h.silt = cell_f64(row, 3);
    h.clay = cell_f64(row, 4);
    h.om = cell_f64(row, 5);
    h.ph = cell_f64(row, 6);
    h.cec = cell_f64(row, 7);
    h.teb = cell_f64(row, 8);
    h.ec = cell_f64(row, 9);
    h.esp = cell_f64(row, 10).map(esp_from_sar);
    h.caco3 = cell_f64(row, 11);
    h.gypsum = cell_f64(row, 12);
    h.db = cell_f64(row, 13);
    h.cf = cell_f64(row, 14);
    Some(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mukey_query_is_lon_lat_ordered() {
        let sql = mukey_query(37.3988876, -101.0458298);
        assert!(sql.contains("point(-101.0458298 37.3988876)"));
        assert!(sql.contains("SDA_Get_Mukey_from_intersection_with_WktWgs84"));
    }

    #[test]
    fn test_component_query_orders_by_comppct() {
        let sql = component_query("123456");
        assert!(sql.contains("ORDER BY c.comppct_r DESC"));
        assert!(sql.contains("mukey = '123456'"));
    }

    #[test]
    fn test_keys_are_sanitised() {
        let sql = horizon_query("123'; DROP TABLE chorizon;--");
        assert!(sql.contains("cokey = '123'"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn test_parse_table_shapes() {
        let body = json!({"Table": [["a", "1"], ["b", "2"]]});
        let rows = parse_table(&body);
        assert_eq!(rows.len(), 2);
        assert_eq!(cell_str(&rows[0], 0).unwrap(), "a");

        assert!(parse_table(&json!({})).is_empty());
        assert!(parse_table(&json!({"Table": []})).is_empty());
    }

    #[test]
    fn test_decode_component_row() {
        let row = vec![
            json!("1234567"),
            json!("Richfield"),
            json!("85"),
            json!("Well drained"),
            json!("Mesic"),
            json!("Smectitic"),
            json!("1.5"),
            json!(null),
            json!(null),
        ];
        let c = decode_component_row(&row).unwrap();
        assert_eq!(c.cokey, "1234567");
        assert_eq!(c.comppct, 85.0);
        assert_eq!(c.drain_num, 5);
        assert_eq!(c.slope, Some(1.5));
        assert!(c.restriction_depth.is_none());
    }

    #[test]
    fn test_decode_horizon_row_with_nulls() {
        let row = vec![
            json!("0"),
            json!("25"),
            json!("20.0"),
            json!("60.0"),
            json!("20.0"),
            json!("2.4"),
            json!("6.3"),
            json!("16.0"),
            json!("12.0"),
            json!("0.4"),
            json!("1.0"),
            json!(null),
            json!(null),
            json!("1.35"),
            json!("3"),
        ];
        let h = decode_horizon_row(&row).unwrap();
        assert_eq!(h.hzdept, 0);
        assert_eq!(h.hzdepb, 25);
        assert_eq!(h.sand, Some(20.0));
        assert!(h.caco3.is_none());
        // ESP derived from SAR
        assert!(h.esp.unwrap() >= 0.0);

        // Degenerate depths are dropped
        let bad = vec![json!("25"), json!("25")];
        assert!(decode_horizon_row(&bad).is_none());
    }
}
