use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::console_log;
use crate::error::{Result, ViewerError};
use crate::geometry::Station;
use crate::models::{decode_camera, decode_dxf_records, DxfBatch};

/// Client for the station endpoints of the building API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn camera_url(&self, station_id: u32) -> String {
        format!("{}/station/{}/camera/", self.base_url, station_id)
    }

    pub fn geometry_url(&self, station_id: u32) -> String {
        format!("{}/station/{}/dxf/", self.base_url, station_id)
    }

    pub async fn fetch_station(&self, station_id: u32) -> Result<Station> {
        let body = fetch_text(&self.camera_url(station_id)).await?;
        Station::from_camera(&decode_camera(&body)?)
    }

    pub async fn fetch_geometries(&self, station_id: u32) -> Result<DxfBatch> {
        let body = fetch_text(&self.geometry_url(station_id)).await?;
        let batch = decode_dxf_records(&body)?;
        console_log!(
            "Fetched {} geometry records for station {} ({} malformed)",
            batch.len(),
            station_id,
            batch.malformed
        );
        Ok(batch)
    }
}

// GET a URL through window.fetch and return the body as text
async fn fetch_text(url: &str) -> Result<String> {
    let window = web_sys::window()
        .ok_or_else(|| ViewerError::Network("no global window to fetch from".to_string()))?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| ViewerError::Network(format!("{}: {:?}", url, e)))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| ViewerError::Network(format!("{}: fetch did not return a Response", url)))?;

    if !response.ok() {
        return Err(ViewerError::Http {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let text_promise = response
        .text()
        .map_err(|e| ViewerError::Network(format!("{}: {:?}", url, e)))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|e| ViewerError::Network(format!("{}: {:?}", url, e)))?;
    text.as_string()
        .ok_or_else(|| ViewerError::Network(format!("{}: response body is not text", url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_station_urls() {
        let api = ApiClient::new("/build-api/");
        assert_eq!(api.camera_url(12), "/build-api/station/12/camera/");
        assert_eq!(api.geometry_url(12), "/build-api/station/12/dxf/");
    }

    #[test]
    fn absolute_base_is_kept() {
        let api = ApiClient::new("https://example.org/build-api");
        assert_eq!(api.geometry_url(3), "https://example.org/build-api/station/3/dxf/");
    }
}
